//! PDF serialization
//!
//! Writes a [`PdfDocument`] back out as a classic PDF file: header, every
//! arena object in ascending id order, a cross-reference table, trailer,
//! `startxref` and `%%EOF`. Output is deterministic — objects by id,
//! dictionary keys sorted — so serializing the same graph twice yields the
//! same bytes.

use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::document::PdfDocument;
use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: HashMap<ObjectId, u64>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: HashMap::new(),
            current_position: 0,
        }
    }

    pub fn write_document(&mut self, document: &PdfDocument) -> Result<()> {
        self.write_header(document.version())?;

        for (id, object) in document.objects() {
            self.write_object(*id, object)?;
        }

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(document.trailer(), xref_position)?;

        self.writer.flush()?;
        Ok(())
    }

    fn write_header(&mut self, version: &str) -> Result<()> {
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment so transports treat the file as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions.insert(id, self.current_position);

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        self.write_object_value(object)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Null => self.write_bytes(b"null")?,
            Object::Boolean(b) => self.write_bytes(if *b { b"true" } else { b"false" })?,
            Object::Integer(i) => self.write_bytes(i.to_string().as_bytes())?,
            Object::Real(f) => self.write_bytes(format_real(*f).as_bytes())?,
            Object::String(s) => {
                self.write_bytes(b"(")?;
                for byte in encode_text(s) {
                    match byte {
                        b'(' | b')' | b'\\' => {
                            self.write_bytes(&[b'\\', byte])?;
                        }
                        b'\r' => self.write_bytes(b"\\r")?,
                        b'\n' => self.write_bytes(b"\\n")?,
                        _ => self.write_bytes(&[byte])?,
                    }
                }
                self.write_bytes(b")")?;
            }
            Object::Name(n) => {
                self.write_bytes(b"/")?;
                for &byte in n.as_bytes() {
                    // Delimiters and whitespace inside names use #xx escapes
                    if byte <= b' '
                        || byte >= 0x7f
                        || b"()<>[]{}/%#".contains(&byte)
                    {
                        self.write_bytes(format!("#{byte:02X}").as_bytes())?;
                    } else {
                        self.write_bytes(&[byte])?;
                    }
                }
            }
            Object::Array(arr) => {
                self.write_bytes(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b" ")?;
                    }
                    self.write_object_value(obj)?;
                }
                self.write_bytes(b"]")?;
            }
            Object::Dictionary(dict) => self.write_dictionary(dict)?,
            Object::Stream(dict, data) => {
                let mut dict = dict.clone();
                dict.set("Length", data.len() as i64);
                self.write_dictionary(&dict)?;
                self.write_bytes(b"\nstream\n")?;
                self.write_bytes(data)?;
                self.write_bytes(b"\nendstream")?;
            }
            Object::Reference(id) => {
                let ref_str = format!("{} {} R", id.number(), id.generation());
                self.write_bytes(ref_str.as_bytes())?;
            }
        }
        Ok(())
    }

    fn write_dictionary(&mut self, dict: &Dictionary) -> Result<()> {
        self.write_bytes(b"<<")?;
        for (key, value) in dict.sorted_entries() {
            self.write_object_value(&Object::Name(key.clone()))?;
            self.write_bytes(b" ")?;
            self.write_object_value(value)?;
            self.write_bytes(b"\n")?;
        }
        self.write_bytes(b">>")?;
        Ok(())
    }

    fn write_xref(&mut self) -> Result<()> {
        self.write_bytes(b"xref\n")?;

        let max_obj_num = self
            .xref_positions
            .keys()
            .map(ObjectId::number)
            .max()
            .unwrap_or(0);

        // One subsection from 0 to max; gaps become free entries
        self.write_bytes(format!("0 {}\n", max_obj_num + 1).as_bytes())?;
        self.write_bytes(b"0000000000 65535 f \n")?;

        for obj_num in 1..=max_obj_num {
            let entry = self
                .xref_positions
                .iter()
                .find(|(id, _)| id.number() == obj_num);
            match entry {
                Some((id, position)) => {
                    let line = format!("{:010} {:05} n \n", position, id.generation());
                    self.write_bytes(line.as_bytes())?;
                }
                None => self.write_bytes(b"0000000000 00000 f \n")?,
            }
        }

        Ok(())
    }

    fn write_trailer(&mut self, trailer: &Dictionary, xref_position: u64) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(ObjectId::number)
            .max()
            .unwrap_or(0);

        let mut trailer = trailer.clone();
        trailer.set("Size", (max_obj_num + 1) as i64);
        // A stale /Prev from the parsed file would point into this new file
        trailer.remove("Prev");

        self.write_bytes(b"trailer\n")?;
        self.write_dictionary(&trailer)?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF\n")?;

        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

impl PdfWriter<BufWriter<std::fs::File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new_with_writer(BufWriter::new(file)))
    }
}

fn format_real(value: f64) -> String {
    let formatted = format!("{value:.6}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Encode text for a literal string: ASCII passes through, anything else
/// switches to UTF-16BE with a BOM so non-Latin field values survive.
fn encode_text(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
