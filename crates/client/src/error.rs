use serde::Deserialize;
use toolbench_core::error::CoreError;

/// Errors from the toolbench client layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// Machine-readable code from the error body, when it had one.
        code: Option<String>,
        message: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a status and raw body.
    ///
    /// Bodies in the server's `{"error", "code"}` shape are unpacked; any
    /// other body is kept verbatim as the message.
    pub fn from_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: String,
            code: Option<String>,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ClientError::Api {
                status,
                code: parsed.code,
                message: parsed.error,
            },
            Err(_) => ClientError::Api {
                status,
                code: None,
                message: body.to_string(),
            },
        }
    }

    /// Server error code, if this is an API error that carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn structured_body_is_unpacked() {
        let err = ClientError::from_body(400, r#"{"error":"Unknown strategy: zzz","code":"INVALID_STRATEGY"}"#);
        assert_matches!(
            &err,
            ClientError::Api { status: 400, code: Some(code), message } if code == "INVALID_STRATEGY" && message == "Unknown strategy: zzz"
        );
        assert_eq!(err.code(), Some("INVALID_STRATEGY"));
        assert_eq!(err.to_string(), "API error (400): Unknown strategy: zzz");
    }

    #[test]
    fn plain_body_is_kept_verbatim() {
        let err = ClientError::from_body(502, "Bad Gateway");
        assert_matches!(&err, ClientError::Api { code: None, message, .. } if message == "Bad Gateway");
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
    }
}
