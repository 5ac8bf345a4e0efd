//! AcroForm dictionary assembly

use crate::objects::{Dictionary, Object, ObjectId};

/// Default appearance: Helvetica 10pt, black
const DEFAULT_APPEARANCE: &str = "/Helv 10 Tf 0 g";

/// Interactive form dictionary (AcroForm)
#[derive(Debug, Clone)]
pub struct AcroForm {
    /// Field references, in field order
    pub fields: Vec<ObjectId>,
    /// Ask viewers to regenerate field appearances. Synthesized fields have
    /// no pre-rendered appearance streams, so this stays on.
    pub need_appearances: bool,
    /// Default resources
    pub dr: Option<Dictionary>,
    /// Default appearance string
    pub da: Option<String>,
    /// Quadding: 0 left, 1 center, 2 right
    pub q: Option<i32>,
}

impl AcroForm {
    /// A form with the defaults a reconstructed document needs: the three
    /// baseline fonts, document-wide default appearance, left alignment.
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            need_appearances: true,
            dr: Some(Self::default_resources()),
            da: Some(DEFAULT_APPEARANCE.to_string()),
            q: Some(0),
        }
    }

    /// Add a field reference
    pub fn add_field(&mut self, field_ref: ObjectId) {
        self.fields.push(field_ref);
    }

    /// The baseline `/DR` font table: a sans-serif face for text, the
    /// dingbats face for check marks, and a monospace face.
    pub fn default_resources() -> Dictionary {
        let mut fonts = Dictionary::new();
        fonts.set("Helv", Object::Dictionary(standard_font("Helvetica")));
        fonts.set("ZaDb", Object::Dictionary(standard_font("ZapfDingbats")));
        fonts.set("Cour", Object::Dictionary(standard_font("Courier")));

        let mut dr = Dictionary::new();
        dr.set("Font", Object::Dictionary(fonts));
        dr
    }

    /// Convert to dictionary
    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        let fields: Vec<Object> = self.fields.iter().map(|r| Object::Reference(*r)).collect();
        dict.set("Fields", Object::Array(fields));
        dict.set("NeedAppearances", Object::Boolean(self.need_appearances));

        if let Some(ref dr) = self.dr {
            dict.set("DR", Object::Dictionary(dr.clone()));
        }
        if let Some(ref da) = self.da {
            dict.set("DA", Object::String(da.clone()));
        }
        if let Some(q) = self.q {
            dict.set("Q", Object::Integer(q as i64));
        }

        dict
    }
}

impl Default for AcroForm {
    fn default() -> Self {
        Self::new()
    }
}

fn standard_font(base_font: &str) -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name("Font".to_string()));
    font.set("Subtype", Object::Name("Type1".to_string()));
    font.set("BaseFont", Object::Name(base_font.to_string()));
    font
}
