//! Pagewalk HTTP - a [`pagewalk_core::PageSource`] backed by a listing website.
//!
//! - [`endpoints`] - Immutable listing URL table built from [`pagewalk_core::SourceConfig`]
//! - [`parser`] - `scraper`-based extraction of figures and journal sections
//! - [`client`] - `reqwest` transport implementing the page source

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod endpoints;
pub mod parser;

pub use client::HttpPageSource;
pub use endpoints::Endpoints;
pub use parser::{ListingEntry, ListingParser};
