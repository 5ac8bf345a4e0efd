//! Classic cross-reference table parsing
//!
//! Only table-style xref sections are understood. Cross-reference streams
//! (PDF 1.5+) are rejected with `ParseError::InvalidXRef`, which sends the
//! reader down its whole-buffer scan fallback.

use super::lexer::{Lexer, Token};
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object};
use std::collections::HashMap;

/// One cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XRefEntry {
    /// Byte offset of the object in the file
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// Whether the entry is in use (`n`) or free (`f`)
    pub in_use: bool,
}

/// Parsed cross-reference data: entries plus the merged trailer
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    entries: HashMap<u32, XRefEntry>,
    trailer: Dictionary,
}

impl XRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for an object number
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The trailer dictionary of the *first* section parsed (the most
    /// recent incremental update, which takes precedence)
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Object numbers of all in-use entries, ascending
    pub fn in_use_objects(&self) -> Vec<(u32, XRefEntry)> {
        let mut objects: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.in_use)
            .map(|(num, entry)| (*num, *entry))
            .collect();
        objects.sort_by_key(|(num, _)| *num);
        objects
    }

    /// Parse the cross-reference chain starting at `offset`, following
    /// `/Prev` links. Entries from newer sections shadow older ones.
    pub fn parse_chain(data: &[u8], offset: u64) -> ParseResult<Self> {
        let mut table = XRefTable::new();
        let mut next = Some(offset);
        let mut visited = std::collections::HashSet::new();

        while let Some(offset) = next {
            if !visited.insert(offset) {
                return Err(ParseError::CircularReference);
            }
            let (section, trailer) = parse_section(data, offset)?;

            for (number, entry) in section {
                // First-seen wins: newest update comes first in the chain
                table.entries.entry(number).or_insert(entry);
            }

            if table.trailer.is_empty() {
                if trailer.contains_key("Encrypt") {
                    return Err(ParseError::EncryptionNotSupported);
                }
                table.trailer = trailer.clone();
            }

            next = trailer
                .get_integer("Prev")
                .and_then(|prev| u64::try_from(prev).ok());
        }

        if table.trailer.is_empty() {
            return Err(ParseError::InvalidTrailer);
        }
        Ok(table)
    }
}

/// Parse one `xref ... trailer <<...>>` section at `offset`
fn parse_section(data: &[u8], offset: u64) -> ParseResult<(Vec<(u32, XRefEntry)>, Dictionary)> {
    let offset = usize::try_from(offset).map_err(|_| ParseError::InvalidXRef)?;
    if offset >= data.len() {
        return Err(ParseError::InvalidXRef);
    }

    let mut lexer = Lexer::at(data, offset);
    if lexer.next_token()? != Token::Xref {
        // Probably an xref stream object ("N G obj"); not supported here
        return Err(ParseError::InvalidXRef);
    }

    let mut entries = Vec::new();
    loop {
        let checkpoint = lexer.position();
        match lexer.next_token()? {
            Token::Trailer => break,
            Token::Integer(start) => {
                let count = match lexer.next_token()? {
                    Token::Integer(count) if count >= 0 => count as u64,
                    other => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "subsection entry count".to_string(),
                            found: format!("{other:?}"),
                        })
                    }
                };
                let start = u32::try_from(start).map_err(|_| ParseError::InvalidXRef)?;
                for i in 0..count {
                    let entry = parse_entry(&mut lexer)?;
                    entries.push((start + i as u32, entry));
                }
            }
            other => {
                return Err(ParseError::SyntaxError {
                    position: checkpoint,
                    message: format!("unexpected {other:?} in xref section"),
                })
            }
        }
    }

    let trailer = match super::reader::parse_object_with(&mut lexer)? {
        Object::Dictionary(dict) => dict,
        _ => return Err(ParseError::InvalidTrailer),
    };

    Ok((entries, trailer))
}

fn parse_entry(lexer: &mut Lexer<'_>) -> ParseResult<XRefEntry> {
    let offset = match lexer.next_token()? {
        Token::Integer(n) if n >= 0 => n as u64,
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "xref entry offset".to_string(),
                found: format!("{other:?}"),
            })
        }
    };
    let generation = match lexer.next_token()? {
        Token::Integer(n) if (0..=65535).contains(&n) => n as u16,
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "xref entry generation".to_string(),
                found: format!("{other:?}"),
            })
        }
    };

    // The type marker is a bare 'n' or 'f'; neither is a PDF keyword, so
    // read it directly instead of going through next_token.
    lexer.skip_whitespace();
    let marker = lexer.read_bytes(1)?;
    let in_use = match marker[0] {
        b'n' => true,
        b'f' => false,
        other => {
            return Err(ParseError::SyntaxError {
                position: lexer.position(),
                message: format!("invalid xref entry type '{}'", other as char),
            })
        }
    };

    Ok(XRefEntry {
        offset,
        generation,
        in_use,
    })
}
