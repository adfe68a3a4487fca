use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Response error:\nStatusCode: {0}\nText: {1}")]
    Response(reqwest::StatusCode, String),

    #[error("No CSRF token in response headers")]
    MissingCsrfToken,

    #[error("Invalid header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Couldn't convert query to string: {0}")]
    Query(#[from] serde_qs::Error),
}
