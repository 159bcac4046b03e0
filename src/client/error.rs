use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum PermifyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("permify returned {status}: {message}")]
    Status {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("malformed response at `{path}`: {message}")]
    Decode { path: String, message: String },
    #[error("watch stream error {code}: {message}")]
    Stream { code: i64, message: String },
}

impl PermifyError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PermifyError::Transport(err) if err.is_timeout())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PermifyError::Status { status: 404, .. })
    }

    /// Builds a `Status` error from a non-2xx body, using Permify's
    /// `{code, message}` envelope when the body carries one.
    pub(crate) fn from_status(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            code: Option<i64>,
            #[serde(default)]
            message: Option<String>,
        }

        match serde_json::from_slice::<Envelope>(body) {
            Ok(Envelope {
                code,
                message: Some(message),
            }) => Self::Status {
                status,
                code,
                message,
            },
            Ok(Envelope { code, message: None }) => Self::Status {
                status,
                code,
                message: String::from_utf8_lossy(body).trim().to_string(),
            },
            Err(_) => Self::Status {
                status,
                code: None,
                message: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }

    pub(crate) fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self::Decode {
            path: err.path().to_string(),
            message: err.into_inner().to_string(),
        }
    }
}
