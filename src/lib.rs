//! # newsstore
//!
//! SQLite-backed storage for an NNTP news server: newsgroups, articles,
//! per-group article numbering, NNTP range and watermark queries, reply
//! threads, and wildmat group filtering.
//!
//! ## Numbering
//!
//! Every article accepted into a group gets the next number in that group,
//! starting at 1. An article posted to several groups gets an independent
//! number in each. Numbers are never reused and never collide, even when
//! several saves into the same group run at once: allocation happens inside
//! the save's write transaction, and a save either lands in all of its groups
//! or in none.
//!
//! ## Quick Start
//!
//! ```no_run
//! use newsstore::{Database, Headers, NewArticle};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(Path::new("news.db")).await?;
//!     db.create_group("comp.lang.go", Some("The Go language")).await?;
//!
//!     let article = NewArticle {
//!         header: Headers::new()
//!             .with("Message-Id", "<1@example.com>")
//!             .with("Subject", "hello"),
//!         body: "first post".to_string(),
//!         ..Default::default()
//!     };
//!     let saved = db.save_article(&article, &["comp.lang.go"]).await?;
//!     assert_eq!(saved.number_in("comp.lang.go"), Some(1));
//!
//!     let group = db.get_group("comp.lang.go").await?;
//!     let marks = db.get_group_watermarks(&group).await?;
//!     println!("{} articles, {}-{}", marks.count, marks.low, marks.high);
//!
//!     db.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Storage backend trait
pub mod backend;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// Wildmat pattern compilation
pub mod wildmat;

// Re-export commonly used types
pub use backend::ArticleBackend;
pub use config::{RetryConfig, StoreConfig};
pub use db::{Database, Watermarks};
pub use error::{DatabaseError, Error, PatternError, Result};
pub use types::{
    Article, Attachment, Group, GroupNumber, Headers, NewArticle, NumberRange, SavedArticle,
};
pub use wildmat::Wildmat;
