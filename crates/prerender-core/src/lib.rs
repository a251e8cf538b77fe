//! Prerender Core Library
//!
//! Core types, configuration, and error handling for the prerender static site generator.

pub mod config;
pub mod error;
pub mod manifest;
pub mod page;

pub use self::config::{Config, DEFAULT_SSR_CONCURRENCY, RuntimeOverrides};
pub use error::{CoreError, Result};
pub use manifest::{AssetFile, AssetKind, Manifest};
pub use page::{CollectedMetadata, HeadMetadata, HeadTag, RenderResult};
