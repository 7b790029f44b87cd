//! Seam traits between the broker, the ingestion sink, and their backends.

pub mod clock;
pub mod notification;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use notification::NotificationSource;
pub use store::ArticleStore;
