//! Round-issuance token.
//!
//! Format: `<base64url(json payload)>.<signature>`. Only the payload is
//! decoded here; the signature belongs to the issuer and is carried
//! through to the outcome report untouched.

use super::{ValidationError, VolatilityLevel, DEFAULT_VOLATILITY};
use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine as _,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URL-safe alphabet, padding optional on decode and omitted on encode.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has no signature segment")]
    MissingSignature,
    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Volatility(#[from] ValidationError),
}

/// Decoded first segment of a token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub seed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vol: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    raw: String,
    payload: TokenPayload,
    level: VolatilityLevel,
}

impl Token {
    pub fn parse(raw: &str) -> Result<Self, TokenError> {
        let (encoded, _signature) = raw.split_once('.').ok_or(TokenError::MissingSignature)?;
        let bytes = PAYLOAD_ENGINE.decode(encoded)?;
        let payload: TokenPayload = serde_json::from_slice(&bytes)?;
        let level = VolatilityLevel::from_fraction(payload.vol.unwrap_or(DEFAULT_VOLATILITY))?;
        Ok(Self {
            raw: raw.to_string(),
            payload,
            level,
        })
    }

    /// Encode a payload with an opaque signature segment.
    pub fn encode(payload: &TokenPayload, signature: &str) -> Result<String, TokenError> {
        let json = serde_json::to_vec(payload)?;
        Ok(format!("{}.{signature}", PAYLOAD_ENGINE.encode(json)))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn seed(&self) -> &str {
        &self.payload.seed
    }

    /// Volatility fraction from the payload, or the default when omitted.
    pub fn volatility(&self) -> f64 {
        self.payload.vol.unwrap_or(DEFAULT_VOLATILITY)
    }

    pub fn volatility_level(&self) -> VolatilityLevel {
        self.level
    }

    pub fn payload(&self) -> &TokenPayload {
        &self.payload
    }
}
