//! Opaque place identifiers.
//!
//! A place id is the URL-safe base64 (no padding) of the dimension tuple
//! serialized as a JSON object with sorted keys. Tokens round-trip exactly,
//! nulls included. They are not stable across releases.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use thiserror::Error;

use super::DimensionTuple;

/// Longest token accepted by [`decode`].
pub const MAX_TOKEN_LEN: usize = 4096;

/// Place id errors. Decoding errors are client errors.
#[derive(Debug, Error)]
pub enum PlaceKeyError {
    #[error("place id is empty")]
    Empty,

    #[error("place id is too long")]
    TooLong,

    #[error("place id is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("place id does not describe a place: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Encode a dimension tuple.
pub fn encode(tuple: &DimensionTuple) -> Result<String, PlaceKeyError> {
    // BTreeMap serializes in key order, which is the canonical form.
    let json = serde_json::to_vec(tuple)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token produced by [`encode`].
pub fn decode(token: &str) -> Result<DimensionTuple, PlaceKeyError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(PlaceKeyError::Empty);
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(PlaceKeyError::TooLong);
    }
    let bytes = URL_SAFE_NO_PAD.decode(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}
