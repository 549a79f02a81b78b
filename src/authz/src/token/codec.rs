//! Compact token decoding
//!
//! `base64url(header).base64url(payload).base64url(signature)`, padding optional.
//! The payload may be compressed, as announced by the header's `zip` field.

use crate::error::TokenError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use flate2::read::{GzDecoder, ZlibDecoder};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// `zip` value for gzip payloads
pub const GZIP: &str = "GZIP";

/// `zip` value for deflate (zlib-wrapped) payloads
pub const DEFLATE: &str = "DEF";

/// Token header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm (e.g., "EdDSA", "ES256")
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Payload compression (e.g., "GZIP")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,

    /// Key identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

/// The three segments of a compact token, still encoded
#[derive(Debug, Clone, Copy)]
pub struct RawToken<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
    /// `header.payload`, the bytes the signature covers
    pub signing_input: &'a str,
}

impl<'a> RawToken<'a> {
    /// Split a compact token into its segments
    pub fn split(token: &'a str) -> Result<Self, TokenError> {
        let token = token.trim();
        let mut parts = token.split('.');

        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ));
        };

        if header.is_empty() || payload.is_empty() {
            return Err(TokenError::MalformedToken(
                "header and payload segments must not be empty".to_string(),
            ));
        }

        Ok(Self {
            header,
            payload,
            signature,
            signing_input: &token[..header.len() + 1 + payload.len()],
        })
    }

    pub fn decode_header(&self) -> Result<TokenHeader, TokenError> {
        let bytes = decode_segment("header", self.header)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::MalformedToken(format!("invalid header JSON: {}", e)))
    }

    pub fn decode_signature(&self) -> Result<Vec<u8>, TokenError> {
        decode_segment("signature", self.signature)
    }

    /// Decode and, if announced, decompress the payload
    pub fn decode_payload(
        &self,
        header: &TokenHeader,
        max_bytes: usize,
    ) -> Result<Vec<u8>, TokenError> {
        let bytes = decode_segment("payload", self.payload)?;

        match header.zip.as_deref() {
            None => {
                if bytes.len() > max_bytes {
                    return Err(payload_too_large(max_bytes));
                }
                Ok(bytes)
            }
            Some(GZIP) => decompress(GzDecoder::new(bytes.as_slice()), max_bytes),
            Some(DEFLATE) => decompress(ZlibDecoder::new(bytes.as_slice()), max_bytes),
            Some(other) => Err(TokenError::MalformedToken(format!(
                "unsupported compression '{}'",
                other
            ))),
        }
    }
}

/// Encode bytes as one unpadded base64url segment
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| TokenError::MalformedToken(format!("invalid {} encoding: {}", name, e)))
}

fn decompress<R: Read>(reader: R, max_bytes: usize) -> Result<Vec<u8>, TokenError> {
    let mut output = Vec::new();
    // One extra byte distinguishes "exactly at the limit" from "over it"
    reader
        .take((max_bytes as u64).saturating_add(1))
        .read_to_end(&mut output)
        .map_err(|e| TokenError::MalformedToken(format!("payload decompression failed: {}", e)))?;

    if output.len() > max_bytes {
        return Err(payload_too_large(max_bytes));
    }
    Ok(output)
}

fn payload_too_large(max_bytes: usize) -> TokenError {
    TokenError::MalformedToken(format!("payload exceeds {} bytes", max_bytes))
}
