use crate::objects::Object;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: HashMap<String, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }

    /// Entries in ascending key order. Serialization uses this so that
    /// identical graphs always produce identical bytes.
    pub fn sorted_entries(&self) -> Vec<(&String, &Object)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(Object::as_dict)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Object>> {
        self.get(key).and_then(Object::as_array)
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Object::as_name)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Object::as_integer)
    }

    /// Value of the `/Type` key, when present and a name
    pub fn type_name(&self) -> Option<&str> {
        self.get_name("Type")
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut dict = Dictionary::new();
        dict.set("T", "Nombre");
        dict.set("MaxLen", 40);
        dict.set("NeedAppearances", true);

        assert_eq!(dict.get("T"), Some(&Object::String("Nombre".to_string())));
        assert_eq!(dict.get("MaxLen"), Some(&Object::Integer(40)));
        assert_eq!(dict.get("NeedAppearances"), Some(&Object::Boolean(true)));
        assert_eq!(dict.get("Missing"), None);
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_get_mut() {
        let mut dict = Dictionary::new();
        dict.set("Q", 0);

        if let Some(Object::Integer(val)) = dict.get_mut("Q") {
            *val = 1;
        }
        assert_eq!(dict.get_integer("Q"), Some(1));
    }

    #[test]
    fn test_remove() {
        let mut dict = Dictionary::new();
        dict.set("Temp", "Value");

        assert!(dict.contains_key("Temp"));
        let removed = dict.remove("Temp");
        assert_eq!(removed, Some(Object::String("Value".to_string())));
        assert!(!dict.contains_key("Temp"));
        assert_eq!(dict.remove("Temp"), None);
    }

    #[test]
    fn test_typed_getters() {
        let mut inner = Dictionary::new();
        inner.set("W", 1);

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("Annot".to_string()));
        dict.set("Subtype", Object::Name("Widget".to_string()));
        dict.set("BS", Object::Dictionary(inner));
        dict.set("Rect", Object::Array(vec![Object::Integer(0)]));

        assert_eq!(dict.type_name(), Some("Annot"));
        assert_eq!(dict.get_name("Subtype"), Some("Widget"));
        assert!(dict.get_dict("BS").is_some());
        assert_eq!(dict.get_array("Rect").map(|a| a.len()), Some(1));
        assert_eq!(dict.get_name("Rect"), None);
    }

    #[test]
    fn test_sorted_entries() {
        let mut dict = Dictionary::new();
        dict.set("Zeta", 1);
        dict.set("Alpha", 2);
        dict.set("Mid", 3);

        let keys: Vec<_> = dict.sorted_entries().into_iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_from_iterator() {
        let items = vec![
            ("FT".to_string(), Object::Name("Tx".to_string())),
            ("T".to_string(), Object::String("Email".to_string())),
        ];

        let dict: Dictionary = items.into_iter().collect();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get_name("FT"), Some("Tx"));
    }
}
