use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// The server answered with a non-2XX status.
///
/// `message` is the `error` field of the JSON body if there is one,
/// the raw body text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: Option<u16>) -> ApiError {
        ApiError {
            message: message.into(),
            status_code,
        }
    }

    /// Build the error from a failed response's status and body text.
    pub(crate) fn from_response(status: StatusCode, text: &str) -> ApiError {
        ApiError::new(error_message(text), Some(status.as_u16()))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
    pub fn is_forbidden(&self) -> bool {
        self.status_code == Some(StatusCode::FORBIDDEN.as_u16())
    }
    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// Pick the message out of an error body.
fn error_message(text: &str) -> String {
    let Ok(Value::Object(mut body)) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };
    match body.remove("error") {
        Some(Value::String(message)) => message,
        Some(other) => other.to_string(),
        None => text.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("couldn't complete request: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("couldn't parse response json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no token in {0} response")]
    MissingToken(&'static str),
}

impl Error {
    /// Status code of the failed response, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(err) => err.status_code,
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            Error::Decode(_) | Error::MissingToken(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{error_message, ApiError};

    #[test]
    fn message_from_error_field() {
        assert_eq!(
            error_message(r#"{"error":"Invalid credentials"}"#),
            "Invalid credentials"
        );
    }

    #[test]
    fn message_from_non_string_error_field() {
        assert_eq!(
            error_message(r#"{"error":{"code":7}}"#),
            r#"{"code":7}"#
        );
    }

    #[test]
    fn message_falls_back_to_text() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(r#"{"detail":"nope"}"#), r#"{"detail":"nope"}"#);
        assert_eq!(error_message(r#"["error"]"#), r#"["error"]"#);
        assert_eq!(error_message(""), "");
    }

    #[test]
    fn status_helpers() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, r#"{"error":"no"}"#);
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
        assert_eq!(err.status_code, Some(401));
        assert_eq!(err.to_string(), "no");

        let err = ApiError::from_response(StatusCode::NOT_FOUND, "missing");
        assert!(err.is_not_found());
        assert!(!err.is_forbidden());
        assert_eq!(err.message, "missing");

        assert!(!ApiError::new("local", None).is_unauthorized());
    }
}
