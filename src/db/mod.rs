//! Database layer for newsstore
//!
//! Handles SQLite persistence for newsgroups, articles, group memberships and
//! attachment mappings.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`groups`]: Group lookup, creation and wildmat filtering
//! - [`articles`]: Article saves and number/range/message-id reads
//! - [`numbering`]: Per-group article number allocation
//! - [`threads`]: Thread roots and replies
//! - [`watermarks`]: Low/high watermarks and article counts

use crate::Result;
use crate::config::RetryConfig;
use crate::types::{Article, Group, Headers, timestamp_to_utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod articles;
mod groups;
mod migrations;
mod numbering;
mod threads;
mod watermarks;

pub use migrations::SCHEMA_VERSION;
pub use watermarks::Watermarks;

/// Group record from database
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    /// Unique database ID
    pub id: i64,
    /// Unique group name
    pub group_name: String,
    /// Optional description
    pub description: Option<String>,
    /// Unix timestamp when the group was created
    pub created_at: i64,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group {
            id: row.id,
            name: row.group_name,
            description: row.description,
            created_at: timestamp_to_utc(row.created_at),
        }
    }
}

/// Article record joined with its number in one group
#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    /// Unique database ID
    pub id: i64,
    /// Header block as stored (JSON)
    pub header: String,
    /// Body text
    pub body: String,
    /// Message-Id of the replied-to article
    pub thread: Option<String>,
    /// Unix timestamp when the article was saved
    pub created_at: i64,
    /// Number of the article in the group it was selected through
    pub article_number: i64,
}

impl ArticleRow {
    /// Parse the stored header and build the public article type.
    ///
    /// Attachments are left empty; callers that need them load them separately.
    pub fn into_article(self) -> Result<Article> {
        Ok(Article {
            id: self.id,
            header: Headers::from_json(&self.header)?,
            body: self.body,
            thread: self.thread,
            created_at: timestamp_to_utc(self.created_at),
            number: self.article_number,
            attachments: Vec::new(),
        })
    }
}

/// Database handle for newsstore
pub struct Database {
    pool: SqlitePool,
    retry: RetryConfig,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
