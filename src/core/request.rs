/// Request decoding from the input channel
use crate::core::types::{ErrorResponse, ExecutionRequest};
use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

/// Request-level failure. Never reaches the supervisor.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("No code provided")]
    NoCode,

    #[error("Invalid request: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<DecodeError> for ErrorResponse {
    fn from(err: DecodeError) -> Self {
        ErrorResponse::new(err.to_string())
    }
}

/// Wire shape; every key is optional and `null` counts as absent.
#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    test_cases: Option<Vec<serde_json::Value>>,
}

/// Read the whole request message.
///
/// An interactive terminal or an unreadable channel yields an empty message.
pub fn read_request_text<R: Read>(mut reader: R, is_terminal: bool) -> String {
    if is_terminal {
        log::debug!("Input is a terminal; treating request as empty");
        return String::new();
    }

    let mut text = String::new();
    match reader.read_to_string(&mut text) {
        Ok(_) => text,
        Err(e) => {
            log::warn!("Failed to read request; treating it as empty: {}", e);
            String::new()
        }
    }
}

/// Parse one request message into its normalized form.
pub fn decode_request(text: &str) -> Result<ExecutionRequest, DecodeError> {
    let raw: RawRequest = if text.trim().is_empty() {
        RawRequest::default()
    } else {
        serde_json::from_str(text)?
    };

    let code = raw.code.unwrap_or_default();
    if code.is_empty() {
        return Err(DecodeError::NoCode);
    }

    Ok(ExecutionRequest {
        code,
        test_cases: raw.test_cases.unwrap_or_default(),
    })
}
