//! Sentence codec
//!
//! Stateless decoding of `$HEADER,f1,...,fN*CS` lines into readings.

use contracts::{DecodeError, Reading};

use crate::templates::SentenceTemplates;

/// Header length: `$` plus five characters
pub const HEADER_LEN: usize = 6;

/// XOR of every byte in `body` (the text between `$` and `*`)
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Frame a sentence body (`GPRMC,...`) with `$` and its checksum
pub fn frame(body: &str) -> String {
    format!("${}*{:02X}", body, checksum(body.as_bytes()))
}

/// Decode one line against the registry.
///
/// All readings share `time_of_arrival`. Placeholder slots are dropped.
///
/// # Errors
/// - `Unrecognized` when the header is not registered
/// - `Checksum` when checking is enabled and the checksum is missing or wrong
/// - `TemplateMismatch` when the field count differs from the template
pub fn decode(
    line: &[u8],
    templates: &SentenceTemplates,
    check_checksums: bool,
    time_of_arrival: f64,
) -> Result<Vec<Reading>, DecodeError> {
    let line = line.trim_ascii();

    let header = line
        .get(..HEADER_LEN)
        .and_then(|h| std::str::from_utf8(h).ok())
        .ok_or(DecodeError::Unrecognized)?;
    let template = templates.get(header).ok_or(DecodeError::Unrecognized)?;

    let (body_end, transmitted) = split_checksum(line);

    if check_checksums {
        let expected = transmitted.ok_or_else(|| DecodeError::Checksum {
            header: header.to_string(),
        })?;
        if checksum(&line[1..body_end]) != expected {
            return Err(DecodeError::Checksum {
                header: header.to_string(),
            });
        }
    }

    let payload = line.get(HEADER_LEN + 1..body_end).unwrap_or_default();
    let values: Vec<&[u8]> = payload.split(|&b| b == b',').collect();

    if values.len() != template.arity() {
        return Err(DecodeError::TemplateMismatch {
            header: header.to_string(),
            expected: template.arity(),
            actual: values.len(),
        });
    }

    let readings = template
        .slots()
        .iter()
        .zip(values)
        .filter_map(|(slot, value)| {
            slot.map(|field| {
                Reading::new(field, String::from_utf8_lossy(value), time_of_arrival)
            })
        })
        .collect();

    Ok(readings)
}

/// Locate a trailing `*HH` checksum.
///
/// Returns the end of the body and the parsed checksum, if one is present.
fn split_checksum(line: &[u8]) -> (usize, Option<u8>) {
    let len = line.len();
    if len >= HEADER_LEN + 3 && line[len - 3] == b'*' {
        let digits = std::str::from_utf8(&line[len - 2..])
            .ok()
            .and_then(|d| u8::from_str_radix(d, 16).ok());
        // A '*' with non-hex digits still terminates the body
        return (len - 3, digits);
    }
    (len, None)
}
