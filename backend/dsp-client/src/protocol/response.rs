use crate::error::response::ResponseError;

use serde::Serialize;

const KIND_OK: &str = "OK";
const KIND_OK_MULTI: &str = "OKm";
const KIND_NOTIFY: &str = "NOTIFY";
const KIND_ERROR: &str = "ERROR";
const TOKEN_SEPARATOR: char = ' ';
const QUOTE: char = '"';

/// One parsed line of appliance output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Response {
    /// `OK` or `OKm` reply to the command in flight.
    Success(ValueResponse),
    /// Unsolicited `NOTIFY` push. Never a reply to a command.
    Notification(ValueResponse),
    /// `ERROR` reply to the command in flight.
    Error(ErrorResponse),
}

impl Response {
    pub fn raw(&self) -> &str {
        match self {
            Response::Success(r) | Response::Notification(r) => &r.raw,
            Response::Error(r) => &r.raw,
        }
    }

    pub fn tokens(&self) -> &[String] {
        match self {
            Response::Success(r) | Response::Notification(r) => &r.tokens,
            Response::Error(r) => &r.tokens,
        }
    }

    /// Name of the command the line refers to (the token after the kind).
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Response::Success(r) | Response::Notification(r) => r.command_name(),
            Response::Error(r) => Some(&r.command_name),
        }
    }
}

/// A response carrying a value: the shape shared by `OK`, `OKm` and `NOTIFY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueResponse {
    pub raw: String,
    pub tokens: Vec<String>,
    pub value: String,
}

impl ValueResponse {
    pub fn command_name(&self) -> Option<&str> {
        self.tokens.get(1).map(String::as_str)
    }

    /// Value as a signed integer (raw parameter scale).
    pub fn int_value(&self) -> Result<i64, ResponseError> {
        self.value
            .parse::<i64>()
            .map_err(|_| ResponseError::invalid_value(&self.value, "integer"))
    }

    /// Value as an on/off flag: any non-zero integer is `true`.
    pub fn bool_value(&self) -> Result<bool, ResponseError> {
        self.int_value()
            .map(|v| v != 0)
            .map_err(|_| ResponseError::invalid_value(&self.value, "boolean integer"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub raw: String,
    pub tokens: Vec<String>,
    pub command_name: String,
    pub error_code: String,
}

/// Parse one line of appliance output.
///
/// Surrounding whitespace (including the line terminator) is trimmed, the line is split
/// on single spaces and one layer of double quotes is stripped from each token. Empty
/// tokens are kept: `""` on the wire is a meaningful empty value.
///
/// # Errors
///
/// - [`ResponseError::UnknownResponseKind`] if the first token is not a known kind
/// - [`ResponseError::Malformed`] if an `ERROR` line lacks its command name or code
pub fn parse_response(line: &str) -> Result<Response, ResponseError> {
    let raw = line.trim();
    let tokens: Vec<String> = raw.split(TOKEN_SEPARATOR).map(strip_quotes).collect();

    // split() always yields at least one token
    let kind = tokens[0].as_str();

    match kind {
        KIND_OK | KIND_OK_MULTI => {
            let value = last_token(&tokens);
            Ok(Response::Success(ValueResponse {
                raw: raw.to_string(),
                tokens,
                value,
            }))
        }
        KIND_NOTIFY => {
            let value = last_token(&tokens);
            Ok(Response::Notification(ValueResponse {
                raw: raw.to_string(),
                tokens,
                value,
            }))
        }
        KIND_ERROR => {
            let (command_name, error_code) = match (tokens.get(1), tokens.get(2)) {
                (Some(name), Some(code)) => (name.clone(), code.clone()),
                _ => {
                    return Err(ResponseError::malformed(
                        "ERROR line needs a command name and an error code",
                        raw,
                    ));
                }
            };

            Ok(Response::Error(ErrorResponse {
                raw: raw.to_string(),
                tokens,
                command_name,
                error_code,
            }))
        }
        other => Err(ResponseError::unknown_kind(other, raw)),
    }
}

pub(crate) fn strip_quotes(token: &str) -> String {
    let token = token.strip_prefix(QUOTE).unwrap_or(token);
    token.strip_suffix(QUOTE).unwrap_or(token).to_string()
}

fn last_token(tokens: &[String]) -> String {
    tokens.last().cloned().unwrap_or_default()
}
