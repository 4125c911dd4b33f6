//! CSV header normalization
//!
//! Only the first record of a payload is rewritten. Every byte after the
//! header record, including the header's own line terminator, is copied
//! through untouched so data rows keep their exact quoting and line endings.

use std::mem::take;

use crate::errors::{NormalizeError, NormalizeResult};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Rewrite the header row of a CSV payload into snake_case column names
///
/// # Errors
///
/// Returns `NormalizeError::InvalidUtf8` if the payload does not decode and
/// `NormalizeError::MissingHeader` if it is empty or its first record is blank
///
/// # Examples
///
/// ```
/// use hospital_fetcher::app::normalize::normalize;
///
/// let out = normalize(b"Facility Name,ZIP Code\r\nMercy,12345\r\n").unwrap();
/// assert_eq!(out, b"facility_name,zip_code\r\nMercy,12345\r\n");
/// ```
pub fn normalize(raw: &[u8]) -> NormalizeResult<Vec<u8>> {
    let payload = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let text = std::str::from_utf8(payload).map_err(|e| NormalizeError::InvalidUtf8 {
        valid_up_to: e.valid_up_to() + (raw.len() - payload.len()),
    })?;

    let (fields, header_end) = read_header(text);
    if text[..header_end].trim().is_empty() {
        return Err(NormalizeError::MissingHeader);
    }

    let names: Vec<String> = fields.iter().map(|name| to_snake_case(name)).collect();

    let rest = &payload[header_end..];
    let mut out = Vec::with_capacity(payload.len());
    out.extend_from_slice(names.join(",").as_bytes());
    out.extend_from_slice(rest);
    Ok(out)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Parse the first record into unquoted field values
///
/// Returns the fields and the byte offset where the record ends (its line
/// terminator is not included). A double quote opens a quoted section only
/// as the first character of a field; anywhere else it is a literal
/// character. Inside a quoted section `""` is an escaped quote and line
/// breaks belong to the field. After the closing quote, any further
/// characters are literal until the next delimiter.
fn read_header(text: &str) -> (Vec<String>, usize) {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut state = FieldState::Start;

    for (offset, ch) in text.char_indices() {
        state = match (state, ch) {
            (FieldState::Quoted, '"') => FieldState::QuoteInQuoted,
            (FieldState::Quoted, _) => {
                field.push(ch);
                FieldState::Quoted
            }
            (FieldState::QuoteInQuoted, '"') => {
                field.push('"');
                FieldState::Quoted
            }
            (_, '\n' | '\r') => {
                fields.push(field);
                return (fields, offset);
            }
            (_, ',') => {
                fields.push(take(&mut field));
                FieldState::Start
            }
            (FieldState::Start, '"') => FieldState::Quoted,
            _ => {
                field.push(ch);
                FieldState::Unquoted
            }
        };
    }

    fields.push(field);
    (fields, text.len())
}

/// Convert a column name to snake_case
///
/// Camel-case boundaries become underscores (`FacilityID` becomes
/// `facility_id`), each run of characters that are not letters or digits
/// collapses to a single underscore, and leading or trailing underscores are
/// dropped. Applying the function to its own output returns it unchanged.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    let mut pending_separator = false;

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            pending_separator = true;
            continue;
        }

        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                pending_separator = true;
            }
        }

        // Some lowercase mappings add combining marks; keep only letters and digits
        let lowered: Vec<char> = ch.to_lowercase().filter(|c| c.is_alphanumeric()).collect();
        if lowered.is_empty() {
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('_');
        }
        pending_separator = false;
        out.extend(lowered);
    }

    out
}
