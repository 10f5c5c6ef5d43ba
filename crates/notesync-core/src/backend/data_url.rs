//! Inline `data:` URL encoding for locally stored artifacts.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;

use crate::{Error, Result};

/// Encode bytes as `data:<content-type>;base64,<payload>`.
pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    let payload = BASE64_STANDARD.encode(bytes);
    format!("data:{content_type};base64,{payload}")
}

/// Decode a base64 `data:` URL into its content type and bytes.
pub fn decode_data_url(value: &str) -> Result<(Option<String>, Vec<u8>)> {
    let rest = value
        .strip_prefix("data:")
        .ok_or_else(|| Error::Storage("inline payload is not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::Storage("inline payload is missing its data".to_string()))?;

    let mut parts = header.split(';');
    let content_type = parts
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);
    if !parts.any(|part| part.trim().eq_ignore_ascii_case("base64")) {
        return Err(Error::Storage(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    let bytes = BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|error| Error::Storage(format!("invalid inline payload: {error}")))?;
    Ok((content_type, bytes))
}
