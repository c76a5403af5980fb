//! Error types for newsstore
//!
//! Store-level failures (connectivity, constraints, busy) are wrapped in
//! [`DatabaseError`]. The generic "no rows" signal from SQLite never reaches
//! callers directly: every lookup translates it into [`Error::NotFound`] or
//! [`Error::NoSuchGroup`].

use thiserror::Error;

/// Result type alias for newsstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for newsstore
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_connections")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// No row matched a unique lookup key (group name, message id, number)
    #[error("not found: {0}")]
    NotFound(String),

    /// A group named while saving an article does not exist
    #[error("no such newsgroup: {0}")]
    NoSuchGroup(String),

    /// Malformed wildmat pattern
    #[error("invalid wildmat: {0}")]
    Pattern(#[from] PatternError),

    /// Article rejected before touching the store
    #[error("invalid article: {0}")]
    InvalidArticle(String),

    /// An article with the same Message-Id is already stored
    #[error("duplicate article: {0}")]
    DuplicateArticle(String),

    /// Group name is empty or contains characters not allowed in a newsgroup name
    #[error("invalid group name: {0:?}")]
    InvalidGroupName(String),

    /// A group with this name already exists
    #[error("group already exists: {0}")]
    GroupExists(String),

    /// Header (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// SQLite reported SQLITE_BUSY or SQLITE_LOCKED
    #[error("database busy: {0}")]
    Busy(String),
}

impl DatabaseError {
    /// Classify a sqlx error raised by `context`.
    ///
    /// Busy/locked and constraint failures get their own variants so callers
    /// can decide on retries without looking at SQLite result codes.
    pub fn from_sqlx(context: &str, e: sqlx::Error) -> Self {
        let message = format!("{}: {}", context, e);
        match &e {
            sqlx::Error::Database(db) => {
                // Extended result codes keep the primary code in the low byte
                let primary = db
                    .code()
                    .and_then(|c| c.parse::<i32>().ok())
                    .map(|c| c & 0xff);
                match primary {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => DatabaseError::Busy(message),
                    _ if db.is_unique_violation()
                        || db.is_foreign_key_violation()
                        || db.is_check_violation() =>
                    {
                        DatabaseError::ConstraintViolation(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionFailed(message)
            }
            _ => DatabaseError::QueryFailed(message),
        }
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Wildmat compilation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern, or one of its comma-separated alternatives, is empty
    #[error("empty pattern or alternative")]
    Empty,

    /// A `[` without a closing `]`
    #[error("unterminated character class starting at offset {0}")]
    UnterminatedClass(usize),

    /// A `]` with no matching `[`
    #[error("unbalanced ']' at offset {0}")]
    UnbalancedBracket(usize),

    /// A range whose start sorts after its end, e.g. `[z-a]`
    #[error("invalid range '{start}-{end}' in character class")]
    InvalidRange {
        /// First character of the range
        start: char,
        /// Last character of the range
        end: char,
    },

    /// A trailing `\` with nothing to escape
    #[error("dangling escape at end of pattern")]
    DanglingEscape,

    /// The translated expression was rejected by the regex engine
    #[error("pattern too complex: {0}")]
    Regex(String),
}

/// Convert a sqlx error into our error type, folding `RowNotFound` into
/// [`Error::NotFound`] with the given description.
pub(crate) fn not_found_or(context: &str, what: impl Into<String>, e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::RowNotFound => Error::NotFound(what.into()),
        other => Error::Database(DatabaseError::from_sqlx(context, other)),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_becomes_domain_not_found() {
        let err = not_found_or(
            "Failed to get group",
            "group comp.lang.go",
            sqlx::Error::RowNotFound,
        );
        assert!(
            matches!(&err, Error::NotFound(what) if what == "group comp.lang.go"),
            "expected NotFound, got {:?}",
            err
        );
    }

    #[test]
    fn pool_closed_is_connection_failure() {
        let err = DatabaseError::from_sqlx("Failed to list groups", sqlx::Error::PoolClosed);
        assert!(matches!(err, DatabaseError::ConnectionFailed(_)));
        assert!(err.to_string().contains("Failed to list groups"));
    }

    #[test]
    fn other_sqlx_errors_are_query_failures() {
        let err = not_found_or(
            "Failed to get article",
            "article",
            sqlx::Error::ColumnNotFound("header".into()),
        );
        assert!(matches!(
            err,
            Error::Database(DatabaseError::QueryFailed(_))
        ));
    }

    #[test]
    fn display_messages_name_the_subject() {
        assert_eq!(
            Error::NoSuchGroup("alt.nowhere".into()).to_string(),
            "no such newsgroup: alt.nowhere"
        );
        assert_eq!(
            Error::Pattern(PatternError::UnterminatedClass(3)).to_string(),
            "invalid wildmat: unterminated character class starting at offset 3"
        );
        assert_eq!(
            PatternError::InvalidRange { start: 'z', end: 'a' }.to_string(),
            "invalid range 'z-a' in character class"
        );
    }
}
