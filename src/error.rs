use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The response parsed, but a required field is missing or mistyped.
    #[error("malformed {api} response: {detail}")]
    Malformed { api: &'static str, detail: String },
    /// The response is well-formed and reports a failure.
    #[error("{api} rejected the request (code {code}): {message}")]
    Rejected {
        api: &'static str,
        code: i64,
        message: String,
    },
    #[error("{0} is not representable in the local time zone")]
    Time(chrono::NaiveDateTime),
}

impl Error {
    pub fn malformed(api: &'static str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            api,
            detail: detail.into(),
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
