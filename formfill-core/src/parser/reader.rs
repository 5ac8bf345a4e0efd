//! PDF reader
//!
//! Loads a byte stream into a [`PdfDocument`]: header check, cross-reference
//! chain, then every in-use object. Documents this crate sees are routinely
//! damaged, so a failed or missing cross-reference table is not fatal — the
//! reader falls back to scanning the whole buffer for `N G obj` bodies and
//! reconstructing the trailer from the catalog object it finds.

use super::document::PdfDocument;
use super::lexer::{Lexer, Token};
use super::xref::XRefTable;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

lazy_static! {
    static ref OBJ_RE: Regex = Regex::new(r"(?-u)(\d{1,10})\s+(\d{1,5})\s+obj").unwrap();
}

/// How far from the end of the file `startxref` may sit
const STARTXREF_WINDOW: usize = 2048;

/// How far into the file the `%PDF-` header may sit
const HEADER_WINDOW: usize = 1024;

/// PDF file reader
pub struct PdfReader;

impl PdfReader {
    /// Parse a complete PDF from memory
    pub fn read(data: &[u8]) -> ParseResult<PdfDocument> {
        let version = parse_header(data)?;

        match load_via_xref(data) {
            Ok((objects, trailer)) => {
                debug!(objects = objects.len(), "loaded document via xref table");
                Ok(PdfDocument::from_parts(version, objects, trailer))
            }
            Err(ParseError::EncryptionNotSupported) => Err(ParseError::EncryptionNotSupported),
            Err(err) => {
                warn!("xref loading failed ({err}), scanning for objects");
                let (objects, trailer) = scan_objects(data)?;
                debug!(objects = objects.len(), "recovered document via scan");
                Ok(PdfDocument::from_parts(version, objects, trailer))
            }
        }
    }
}

fn parse_header(data: &[u8]) -> ParseResult<String> {
    let window = &data[..data.len().min(HEADER_WINDOW)];
    let start = window
        .windows(5)
        .position(|w| w == b"%PDF-")
        .ok_or(ParseError::InvalidHeader)?;

    let version_bytes: Vec<u8> = data[start + 5..]
        .iter()
        .take_while(|b| !b" \t\r\n%".contains(b))
        .copied()
        .collect();
    let version = String::from_utf8_lossy(&version_bytes).to_string();
    if version.is_empty() {
        return Err(ParseError::InvalidHeader);
    }
    Ok(version)
}

fn find_startxref(data: &[u8]) -> Option<u64> {
    let tail_start = data.len().saturating_sub(STARTXREF_WINDOW);
    let tail = &data[tail_start..];
    let keyword_pos = tail
        .windows(9)
        .rposition(|w| w == b"startxref")
        .map(|p| tail_start + p)?;

    let mut lexer = Lexer::at(data, keyword_pos + 9);
    match lexer.next_token().ok()? {
        Token::Integer(offset) if offset >= 0 => Some(offset as u64),
        _ => None,
    }
}

fn load_via_xref(data: &[u8]) -> ParseResult<(BTreeMap<ObjectId, Object>, Dictionary)> {
    let offset = find_startxref(data).ok_or(ParseError::InvalidXRef)?;
    let table = XRefTable::parse_chain(data, offset)?;
    let trailer = table.trailer().clone();
    if !trailer.contains_key("Root") {
        return Err(ParseError::InvalidTrailer);
    }

    let mut objects = BTreeMap::new();
    for (number, entry) in table.in_use_objects() {
        let offset = match usize::try_from(entry.offset) {
            Ok(offset) if offset < data.len() => offset,
            _ => {
                warn!("object {number} has offset beyond end of file, skipping");
                continue;
            }
        };
        match parse_indirect_at(data, offset) {
            Ok((id, object)) => {
                if id.number() != number {
                    warn!(
                        "xref entry {number} points at object {}, keeping parsed id",
                        id.number()
                    );
                }
                objects.insert(id, object);
            }
            Err(err) => warn!("failed to parse object {number}: {err}"),
        }
    }

    if objects.is_empty() {
        return Err(ParseError::InvalidXRef);
    }
    Ok((objects, trailer))
}

/// Whole-buffer object scan: the recovery path for documents whose
/// cross-reference table is broken, missing, or a (unsupported) xref stream.
/// Later bodies shadow earlier ones, matching incremental-update semantics.
fn scan_objects(data: &[u8]) -> ParseResult<(BTreeMap<ObjectId, Object>, Dictionary)> {
    let mut objects = BTreeMap::new();

    for found in OBJ_RE.find_iter(data) {
        // A digit right before the match means we are inside a longer number
        if found.start() > 0 && data[found.start() - 1].is_ascii_digit() {
            continue;
        }
        match parse_indirect_at(data, found.start()) {
            Ok((id, object)) => {
                objects.insert(id, object);
            }
            Err(err) => debug!("scan skipped body at {}: {err}", found.start()),
        }
    }

    if objects.is_empty() {
        return Err(ParseError::SyntaxError {
            position: 0,
            message: "no objects recovered from scan".to_string(),
        });
    }

    let trailer = match scan_trailer(data) {
        Some(trailer) if trailer.contains_key("Root") => trailer,
        _ => synthesize_trailer(&objects)?,
    };

    Ok((objects, trailer))
}

fn scan_trailer(data: &[u8]) -> Option<Dictionary> {
    let pos = data.windows(7).rposition(|w| w == b"trailer")?;
    let mut lexer = Lexer::at(data, pos + 7);
    match parse_object_with(&mut lexer) {
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    }
}

/// Build a trailer when none survives: the catalog object is findable by
/// its `/Type`, and `/Size` is one past the highest recovered number.
fn synthesize_trailer(objects: &BTreeMap<ObjectId, Object>) -> ParseResult<Dictionary> {
    let catalog = objects
        .iter()
        .find(|(_, object)| {
            object
                .as_dict()
                .and_then(Dictionary::type_name)
                .is_some_and(|t| t == "Catalog")
        })
        .map(|(id, _)| *id)
        .ok_or(ParseError::InvalidTrailer)?;

    let size = objects.keys().map(ObjectId::number).max().unwrap_or(0) + 1;
    let mut trailer = Dictionary::new();
    trailer.set("Size", size as i64);
    trailer.set("Root", catalog);
    Ok(trailer)
}

/// Parse `N G obj ... endobj` at `offset`
pub(crate) fn parse_indirect_at(data: &[u8], offset: usize) -> ParseResult<(ObjectId, Object)> {
    let mut lexer = Lexer::at(data, offset);

    let number = match lexer.next_token()? {
        Token::Integer(n) if n >= 0 => n as u32,
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "object number".to_string(),
                found: format!("{other:?}"),
            })
        }
    };
    let generation = match lexer.next_token()? {
        Token::Integer(n) if (0..=65535).contains(&n) => n as u16,
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "generation number".to_string(),
                found: format!("{other:?}"),
            })
        }
    };
    if lexer.next_token()? != Token::Obj {
        return Err(ParseError::UnexpectedToken {
            expected: "obj".to_string(),
            found: "something else".to_string(),
        });
    }

    let object = parse_object_with(&mut lexer)?;
    // A missing endobj is tolerated; the body already parsed.
    Ok((ObjectId::new(number, generation), object))
}

/// Parse one object starting at the lexer's cursor
pub(crate) fn parse_object_with(lexer: &mut Lexer<'_>) -> ParseResult<Object> {
    let token = lexer.next_token()?;
    parse_object_from_token(lexer, token)
}

fn parse_object_from_token(lexer: &mut Lexer<'_>, token: Token) -> ParseResult<Object> {
    match token {
        Token::Null => Ok(Object::Null),
        Token::Boolean(b) => Ok(Object::Boolean(b)),
        Token::Integer(i) => Ok(Object::Integer(i)),
        Token::Real(r) => Ok(Object::Real(r)),
        Token::String(bytes) => Ok(Object::String(decode_text_bytes(&bytes))),
        Token::Name(n) => Ok(Object::Name(n)),
        Token::Reference(number, generation) => {
            Ok(Object::Reference(ObjectId::new(number, generation)))
        }
        Token::ArrayStart => parse_array(lexer),
        Token::DictStart => parse_dictionary_or_stream(lexer),
        Token::Eof => Err(ParseError::SyntaxError {
            position: lexer.position(),
            message: "unexpected end of input".to_string(),
        }),
        other => Err(ParseError::UnexpectedToken {
            expected: "object".to_string(),
            found: format!("{other:?}"),
        }),
    }
}

fn parse_array(lexer: &mut Lexer<'_>) -> ParseResult<Object> {
    let mut elements = Vec::new();
    loop {
        let token = lexer.next_token()?;
        match token {
            Token::ArrayEnd => break,
            Token::Eof => {
                return Err(ParseError::SyntaxError {
                    position: lexer.position(),
                    message: "unterminated array".to_string(),
                })
            }
            other => elements.push(parse_object_from_token(lexer, other)?),
        }
    }
    Ok(Object::Array(elements))
}

fn parse_dictionary_or_stream(lexer: &mut Lexer<'_>) -> ParseResult<Object> {
    let mut dict = Dictionary::new();
    loop {
        match lexer.next_token()? {
            Token::DictEnd => break,
            Token::Name(key) => {
                let value = parse_object_with(lexer)?;
                dict.set(key, value);
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "dictionary key or >>".to_string(),
                    found: format!("{other:?}"),
                })
            }
        }
    }

    // A stream keyword may follow the dictionary
    let checkpoint = lexer.position();
    match lexer.next_token() {
        Ok(Token::Stream) => {
            let data = parse_stream_data(lexer, &dict)?;
            Ok(Object::Stream(dict, data))
        }
        _ => {
            lexer.seek(checkpoint);
            Ok(Object::Dictionary(dict))
        }
    }
}

fn parse_stream_data(lexer: &mut Lexer<'_>, dict: &Dictionary) -> ParseResult<Vec<u8>> {
    lexer.read_newline();
    let start = lexer.position();

    // Trust /Length when it is a plain integer and lands on endstream;
    // anything else (indirect reference, wrong value) falls back to a scan.
    if let Some(length) = dict.get_integer("Length").and_then(|l| usize::try_from(l).ok()) {
        if let Ok(data) = lexer.read_bytes(length) {
            if matches!(lexer.next_token(), Ok(Token::EndStream)) {
                return Ok(data);
            }
        }
        lexer.seek(start);
    }

    let end = lexer
        .find_forward(b"endstream")
        .ok_or(ParseError::SyntaxError {
            position: start,
            message: "unterminated stream".to_string(),
        })?;
    let mut data = lexer.read_bytes(end - start)?;
    // Strip the end-of-line that separates data from the keyword
    if data.last() == Some(&b'\n') {
        data.pop();
        if data.last() == Some(&b'\r') {
            data.pop();
        }
    } else if data.last() == Some(&b'\r') {
        data.pop();
    }
    lexer.next_token()?; // endstream
    Ok(data)
}

/// Decode string bytes to text: UTF-16BE when the BOM says so, UTF-8 when
/// valid, byte-per-char otherwise (PDFDocEncoding is close enough to
/// Latin-1 for field names and values).
pub(crate) fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xfe && bytes[1] == 0xff {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
