//! Write path for ingested articles.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::article::{Article, ArticleDraft};

/// Persists journalist submissions.
///
/// Implementations stamp the publication time themselves; the backing
/// store is expected to announce each stored article on the
/// `new_articles` notification channel.
#[async_trait]
pub trait ArticleStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store a draft and return the article as persisted.
    async fn store(&self, draft: ArticleDraft) -> AppResult<Article>;

    /// Whether the backing store can currently accept writes.
    async fn health_check(&self) -> AppResult<()>;
}
