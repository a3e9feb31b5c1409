//! Compact JWS segments (`header.payload.signature`, base64url).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;

use super::WebhookError;

#[derive(Debug, Clone, Copy)]
pub struct CompactJws<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> CompactJws<'a> {
    /// Exactly three non-empty segments, or `MalformedSignature`.
    pub fn split(raw: &'a str) -> Result<Self, WebhookError> {
        let segments: Vec<&str> = raw.trim().split('.').collect();
        match segments[..] {
            [header, payload, signature]
                if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
            {
                Ok(Self {
                    header,
                    payload,
                    signature,
                })
            }
            [_, _, _] => Err(WebhookError::malformed("empty segment")),
            _ => Err(WebhookError::malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            ))),
        }
    }

    /// The exact bytes the signature covers.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    pub fn decode_header<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        decode_json(self.header, "header")
    }

    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, WebhookError> {
        decode_json(self.payload, "payload")
    }
}

/// base64url, tolerating trailing `=` padding.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, WebhookError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| WebhookError::malformed(format!("segment is not base64url: {e}")))
}

fn decode_json<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T, WebhookError> {
    let bytes = decode_segment(segment)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| WebhookError::malformed(format!("{what} is not valid JSON: {e}")))
}

/// Payload of a nested signed field. The signature is not checked: nested
/// fields are trusted because the envelope carrying them was verified.
pub fn decode_unverified<T: DeserializeOwned>(raw: &str) -> Result<T, WebhookError> {
    CompactJws::split(raw)?.decode_payload()
}
