use crate::Result;
use derive_more::From;
use reqwest::header::HeaderValue;
use reqwest::RequestBuilder;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// CSRF credentials for the catalog. Replaced wholesale on refresh.
#[derive(From, Debug, Clone)]
pub struct Session {
    csrf_token: HeaderValue,
}

impl Session {
    pub fn new(csrf_token: &str) -> Result<Self> {
        Ok(Self {
            csrf_token: HeaderValue::from_str(csrf_token)?,
        })
    }

    pub fn csrf_token(&self) -> &HeaderValue {
        &self.csrf_token
    }

    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(CSRF_HEADER, self.csrf_token.clone())
    }
}
