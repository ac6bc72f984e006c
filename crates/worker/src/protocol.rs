//! Wire types for the worker line protocol.
//!
//! One JSON object per line in each direction. The newline is the only
//! frame delimiter; requests and responses are correlated by strict
//! alternation on the channel, so there are no request IDs.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// A request sent to the worker on its standard input.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<CallParams>,
}

/// Parameters for a `call_tool` request.
#[derive(Debug, Clone, Serialize)]
pub struct CallParams {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl Request {
    /// Invoke a tool by name with string-valued arguments.
    pub fn call_tool(name: impl Into<String>, arguments: BTreeMap<String, String>) -> Self {
        Self {
            method: "call_tool".to_string(),
            params: Some(CallParams {
                name: name.into(),
                arguments,
            }),
        }
    }

    /// Ask the worker to describe its tools.
    pub fn list_tools() -> Self {
        Self {
            method: "list_tools".to_string(),
            params: None,
        }
    }

    /// Ask the worker to exit.
    pub fn quit() -> Self {
        Self {
            method: "quit".to_string(),
            params: None,
        }
    }
}

/// A response read from the worker's standard output.
///
/// `error` takes precedence over `result` when both are present. A
/// response with both fields null is valid (the "no result" case);
/// a document lacking both fields is not.
#[derive(Debug, Clone)]
pub struct Response {
    pub result: Option<String>,
    pub error: Option<String>,
}

/// Errors produced by the codec.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("empty response line")]
    EmptyLine,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotObject,

    #[error("response carries neither result nor error")]
    MissingFields,

    #[error("request would contain an embedded newline")]
    EmbeddedNewline,
}

/// Encode a request as a single line of JSON (without the trailing newline).
pub fn encode_request(request: &Request) -> Result<String, ProtocolError> {
    let line = serde_json::to_string(request)?;
    // The newline is the frame delimiter; a request must never contain one.
    if line.contains('\n') {
        return Err(ProtocolError::EmbeddedNewline);
    }
    Ok(line)
}

/// Decode a single response line.
///
/// Fails on an empty line, invalid JSON, or a document that carries
/// neither `result` nor `error`. Callers treat any failure as "no usable
/// result" rather than letting it propagate to the host.
pub fn decode_response(line: &str) -> Result<Response, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::EmptyLine);
    }

    let value: serde_json::Value = serde_json::from_str(line)?;
    let object = value.as_object().ok_or(ProtocolError::NotObject)?;

    // Null-valued fields are present ("no result" is a valid outcome);
    // a document with neither field is unusable.
    if !object.contains_key("result") && !object.contains_key("error") {
        return Err(ProtocolError::MissingFields);
    }

    Ok(Response {
        result: object
            .get("result")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        error: object
            .get("error")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
    })
}
