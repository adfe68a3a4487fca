//! Client for the ECSR catalog API.
//!
//! The catalog rejects state-changing calls without a CSRF token, so every
//! caller first obtains a [`Session`] through [`Client::acquire_session`] and
//! threads it through later requests.
mod client;
mod endpoint;
mod error;
mod schema;
mod session;

pub use client::Client;
pub use endpoint::Endpoint;
pub use error::Error;
pub use schema::{ItemDetail, ItemId, ItemReference, SearchQuery};
pub use session::{Session, CSRF_HEADER};

pub type Result<T> = std::result::Result<T, Error>;
