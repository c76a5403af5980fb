//! Low/high watermarks and article counts.
//!
//! All three values are 0 for a group without articles.

use sqlx::FromRow;

use crate::Result;
use crate::error::DatabaseError;
use crate::types::Group;

use super::Database;

/// Count and watermarks of a group, as reported by the NNTP GROUP command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow)]
pub struct Watermarks {
    /// Number of articles in the group
    pub count: i64,
    /// Lowest article number present
    pub low: i64,
    /// Highest article number present
    pub high: i64,
}

impl Database {
    /// Number of articles in `group`
    pub async fn get_articles_count(&self, group: &Group) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles_to_groups WHERE group_id = ?")
                .bind(group.id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DatabaseError::from_sqlx("Failed to count articles", e))?;

        Ok(count)
    }

    /// Highest article number in `group`
    pub async fn get_group_high_water_mark(&self, group: &Group) -> Result<i64> {
        let high: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(article_number), 0) FROM articles_to_groups WHERE group_id = ?",
        )
        .bind(group.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get high water mark", e))?;

        Ok(high)
    }

    /// Lowest article number in `group`
    pub async fn get_group_low_water_mark(&self, group: &Group) -> Result<i64> {
        let low: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MIN(article_number), 0) FROM articles_to_groups WHERE group_id = ?",
        )
        .bind(group.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get low water mark", e))?;

        Ok(low)
    }

    /// Count, low and high watermark of `group` read in one statement, so
    /// the three values are consistent with each other
    pub async fn get_group_watermarks(&self, group: &Group) -> Result<Watermarks> {
        let marks: Watermarks = sqlx::query_as(
            r#"
            SELECT COUNT(*) AS count,
                COALESCE(MIN(article_number), 0) AS low,
                COALESCE(MAX(article_number), 0) AS high
            FROM articles_to_groups
            WHERE group_id = ?
            "#,
        )
        .bind(group.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get watermarks", e))?;

        Ok(marks)
    }
}
