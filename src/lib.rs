//! Terminal administration for news records served by a REST backend.
//!
//! [`controller::NewsController`] holds the list, filter, pagination and
//! mutation state; [`api::HttpApiClient`] talks to the backend; the
//! [`browser`] and the binary's subcommands present it.

pub mod api;
pub mod browser;
pub mod controller;
pub mod editor;
pub mod error;
pub mod export;
pub mod form;
pub mod models;
pub mod session;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, HttpApiClient, ImageFile};
pub use controller::{FetchOptions, NewsController, PAGE_SIZE};
pub use error::ApiError;
