//! Article model and its JSON wire codec.
//!
//! The same shape is used for the `new_articles` notification payload and
//! for frames written to subscribers. Decoding accepts any RFC 3339 offset
//! and always yields a UTC instant.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Body that replaces the content of an article once a subscriber runs out
/// of credits.
pub const PAYWALL_BODY: &str = "Top up your account to read the full content";

/// Notification channel the `articles` insert trigger announces rows on.
pub const ARTICLE_CHANNEL: &str = "new_articles";

/// A published article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireArticle")]
pub struct Article {
    /// Headline.
    pub title: String,
    /// Full content.
    pub body: String,
    /// Section the article belongs to.
    pub category: String,
    /// Publication instant, normalized to UTC.
    pub published_at: DateTime<Utc>,
}

/// Decoding shape: keeps whatever offset the producer used.
#[derive(Deserialize)]
struct WireArticle {
    title: String,
    body: String,
    category: String,
    published_at: DateTime<FixedOffset>,
}

impl From<WireArticle> for Article {
    fn from(wire: WireArticle) -> Self {
        Self {
            title: wire.title,
            body: wire.body,
            category: wire.category,
            published_at: wire.published_at.with_timezone(&Utc),
        }
    }
}

impl Article {
    /// Create an article stamped at `published_at`.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            category: category.into(),
            published_at,
        }
    }

    /// Decode a raw notification payload.
    pub fn from_notification(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The variant delivered to subscribers without credits: everything but
    /// the body is kept.
    pub fn paywalled(&self) -> Self {
        Self {
            title: self.title.clone(),
            body: PAYWALL_BODY.to_string(),
            category: self.category.clone(),
            published_at: self.published_at,
        }
    }

    /// Whether this article carries the paywall body.
    pub fn is_paywalled(&self) -> bool {
        self.body == PAYWALL_BODY
    }
}

/// An article as submitted by a journalist, before the aggregator stamps
/// its publication time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    /// Headline.
    pub title: String,
    /// Full content.
    pub body: String,
    /// Section the article belongs to.
    pub category: String,
}

impl ArticleDraft {
    /// Turn the draft into an article published at `at`.
    pub fn publish(self, at: DateTime<Utc>) -> Article {
        Article {
            title: self.title,
            body: self.body,
            category: self.category,
            published_at: at,
        }
    }
}
