//! Pagewalk Core - Foundation crate for the pagewalk listing scanner.
//!
//! This crate provides the shared types, the page source seam, error handling
//! and configuration management that the scanner and the HTTP source depend on.
//!
//! # Modules
//!
//! - [`error`] - Source and configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`ItemId`, `Listing`, `ListingKind`, `Page`, `DocumentRequest`, `Timestamp`)
//! - [`source`] - The `PageSource`, `DocumentSource` and `ListingItem` traits the scanner is written against
//!
//! # Example
//!
//! ```rust
//! use pagewalk_core::{AppConfig, ItemId, Listing};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.requests.max_concurrent_requests, 2);
//!
//! let listing = Listing::gallery("someartist");
//! assert_eq!(ItemId::new("sid-1234"), ItemId::new("1234"));
//! # let _ = listing;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, ProgressConfig, RequestsConfig, SourceConfig};
pub use error::{ConfigError, ConfigResult, SourceError, SourceResult};
pub use source::{DocumentSource, ListingItem, PageSource};
pub use types::{DocumentRequest, ItemId, Listing, ListingKind, Page, Timestamp};
