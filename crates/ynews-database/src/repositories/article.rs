//! Article repository: the aggregator's write path.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use ynews_core::error::{AppError, ErrorKind};
use ynews_core::result::AppResult;
use ynews_core::traits::{ArticleStore, Clock};
use ynews_core::types::article::{Article, ArticleDraft};

use crate::connection::DatabasePool;

/// Inserts articles into the `articles` table.
///
/// The `articles_notify_insert` trigger announces each committed row on the
/// `new_articles` channel.
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    db: DatabasePool,
    clock: Arc<dyn Clock>,
}

impl ArticleRepository {
    /// Create a repository stamping publication times with `clock`.
    pub fn new(db: DatabasePool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Insert an article as-is, keeping its publication time.
    pub async fn insert(&self, article: &Article) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO articles (title, body, category, published_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&article.title)
        .bind(&article.body)
        .bind(&article.category)
        .bind(article.published_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to insert article: {e}"),
                e,
            )
        })?;

        debug!(title = %article.title, category = %article.category, "Article stored");
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    async fn store(&self, draft: ArticleDraft) -> AppResult<Article> {
        let article = draft.publish(self.clock.now());
        self.insert(&article).await?;
        Ok(article)
    }

    async fn health_check(&self) -> AppResult<()> {
        self.db.health_check().await
    }
}
