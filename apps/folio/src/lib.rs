//! # folio
//!
//! The Folio tag service: async tag sources over the tag store, the HTTP
//! API and the CLI. The tag algebra and renderers live in `folio-core`.

pub mod api;
pub mod cli;
pub mod config;
pub mod sources;
