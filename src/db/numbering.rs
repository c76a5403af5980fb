//! Per-group article number allocation.
//!
//! Numbers in a group start at 1 and grow by one per accepted article. The
//! next number is computed and inserted by a single statement, and that
//! statement only ever runs inside the write transaction of a save. SQLite
//! allows one writer at a time, so two saves into the same group cannot read
//! the same maximum. `PRIMARY KEY (group_id, article_number)` rejects a
//! duplicate if that ever stops being true.
//!
//! A save that fails is rolled back as a whole, so the only way a number is
//! left unused is a group whose highest article was never committed.

use sqlx::SqliteConnection;

use crate::Result;
use crate::error::DatabaseError;

/// Insert the membership `(article_id, group_id, next)` and return `next`,
/// where `next` is one more than the highest number in the group (1 if empty).
///
/// Must be called on a connection that already holds the write lock.
pub(super) async fn allocate_number(
    conn: &mut SqliteConnection,
    article_id: i64,
    group_id: i64,
) -> Result<i64> {
    let number: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO articles_to_groups (article_id, group_id, article_number)
        SELECT ?, ?, COALESCE(MAX(article_number), 0) + 1
        FROM articles_to_groups
        WHERE group_id = ?
        RETURNING article_number
        "#,
    )
    .bind(article_id)
    .bind(group_id)
    .bind(group_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DatabaseError::from_sqlx("Failed to allocate article number", e))?;

    Ok(number)
}
