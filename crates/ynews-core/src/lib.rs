//! # ynews-core
//!
//! Core crate for Y News. Contains the article model and its wire codec,
//! configuration schemas, the seam traits used by the broker and the
//! ingestion sink, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Y News crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
pub use types::article::{Article, ArticleDraft};
