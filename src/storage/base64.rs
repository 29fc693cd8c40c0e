//! Base64 payload decoding

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{AppError, Result};

/// Decode a base64 string, accepting `data:image/...;base64,` prefixes
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.split_once(',') {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => encoded,
    };

    let decoded = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Validation(format!("Invalid base64 data: {}", e)))?;

    if decoded.is_empty() {
        return Err(AppError::Validation("File data is empty".to_string()));
    }
    Ok(decoded)
}

/// Image subtype named in a data URL header (`data:image/png;base64,...` -> `png`)
pub fn data_url_format(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:image/")?;
    let end = rest.find(';')?;
    Some(&rest[..end])
}
