//! Shared domain types.

pub mod article;

pub use article::{ARTICLE_CHANNEL, Article, ArticleDraft, PAYWALL_BODY};
