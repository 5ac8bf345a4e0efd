//! Field types and flags

use crate::objects::Dictionary;
use bitflags::bitflags;

/// Form field type, the value of `/FT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Text field (`/Tx`)
    Text,
    /// Button: checkbox, radio button or push button (`/Btn`)
    Button,
    /// Choice: list box or combo box (`/Ch`)
    Choice,
    /// Signature field (`/Sig`)
    Signature,
}

impl FieldType {
    /// The PDF name for this type
    pub fn pdf_name(&self) -> &'static str {
        match self {
            FieldType::Text => "Tx",
            FieldType::Button => "Btn",
            FieldType::Choice => "Ch",
            FieldType::Signature => "Sig",
        }
    }

    /// Parse a `/FT` name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Tx" => Some(FieldType::Text),
            "Btn" => Some(FieldType::Button),
            "Ch" => Some(FieldType::Choice),
            "Sig" => Some(FieldType::Signature),
            _ => None,
        }
    }

    /// Read the declared type of a field dictionary
    pub fn of_dict(dict: &Dictionary) -> Option<Self> {
        dict.get_name("FT").and_then(Self::from_name)
    }

    /// Best-effort type for a field whose `/FT` is missing or mangled:
    /// anything whose declared type mentions the button marker is a button,
    /// everything else is treated as text.
    pub fn infer(declared: Option<&str>) -> Self {
        match declared {
            Some(name) if name.contains("Btn") => FieldType::Button,
            _ => FieldType::Text,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FieldType::Text => "text",
            FieldType::Button => "button",
            FieldType::Choice => "choice",
            FieldType::Signature => "signature",
        };
        write!(f, "{label}")
    }
}

bitflags! {
    /// Field flags, the `/Ff` bit word (ISO 32000-1 tables 221-228)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u32 {
        /// Field is read-only
        const READ_ONLY = 1 << 0;
        /// Field is required
        const REQUIRED = 1 << 1;
        /// Field is not exported
        const NO_EXPORT = 1 << 2;
        /// Text: multi-line
        const MULTILINE = 1 << 12;
        /// Text: password entry
        const PASSWORD = 1 << 13;
        /// Button: no-toggle-to-off radio behavior
        const NO_TOGGLE_TO_OFF = 1 << 14;
        /// Button: radio button
        const RADIO = 1 << 15;
        /// Button: push button
        const PUSH_BUTTON = 1 << 16;
        /// Choice: combo box
        const COMBO = 1 << 17;
    }
}

impl FieldFlags {
    /// Read the `/Ff` word of a field dictionary, empty when absent
    pub fn of_dict(dict: &Dictionary) -> Self {
        dict.get_integer("Ff")
            .and_then(|v| u32::try_from(v).ok())
            .map(Self::from_bits_truncate)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Object;

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::Text.pdf_name(), "Tx");
        assert_eq!(FieldType::Button.pdf_name(), "Btn");
        assert_eq!(FieldType::from_name("Ch"), Some(FieldType::Choice));
        assert_eq!(FieldType::from_name("Nope"), None);
    }

    #[test]
    fn test_field_type_of_dict() {
        let mut dict = Dictionary::new();
        dict.set("FT", Object::Name("Sig".to_string()));
        assert_eq!(FieldType::of_dict(&dict), Some(FieldType::Signature));

        let empty = Dictionary::new();
        assert_eq!(FieldType::of_dict(&empty), None);
    }

    #[test]
    fn test_infer_defaults_to_text() {
        assert_eq!(FieldType::infer(None), FieldType::Text);
        assert_eq!(FieldType::infer(Some("Tx")), FieldType::Text);
        assert_eq!(FieldType::infer(Some("garbage")), FieldType::Text);
        assert_eq!(FieldType::infer(Some("Btn")), FieldType::Button);
        assert_eq!(FieldType::infer(Some("/Btn")), FieldType::Button);
    }

    #[test]
    fn test_flags_of_dict() {
        let mut dict = Dictionary::new();
        dict.set("Ff", Object::Integer((1 << 15) | (1 << 1)));
        let flags = FieldFlags::of_dict(&dict);
        assert!(flags.contains(FieldFlags::RADIO));
        assert!(flags.contains(FieldFlags::REQUIRED));
        assert!(!flags.contains(FieldFlags::READ_ONLY));

        assert_eq!(FieldFlags::of_dict(&Dictionary::new()), FieldFlags::empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::Text.to_string(), "text");
        assert_eq!(FieldType::Button.to_string(), "button");
    }
}
