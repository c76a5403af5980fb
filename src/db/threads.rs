//! Thread roots and replies.
//!
//! An article's `thread` column holds the Message-Id of the article it
//! replies to; roots have none. Only direct replies are linked.

use crate::Result;
use crate::error::DatabaseError;
use crate::types::Group;

use super::Database;

impl Database {
    /// Numbers of thread roots in `group`, newest first
    ///
    /// Pages are `per_page` long and `page_num` counts from zero.
    pub async fn get_new_threads(
        &self,
        group: &Group,
        per_page: u32,
        page_num: u32,
    ) -> Result<Vec<i64>> {
        let offset = i64::from(per_page) * i64::from(page_num);
        let numbers: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT atg.article_number
            FROM articles a
            INNER JOIN articles_to_groups atg ON atg.article_id = a.id
            WHERE atg.group_id = ? AND a.thread IS NULL
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(group.id)
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get new threads", e))?;

        Ok(numbers)
    }

    /// Numbers of the replies in `group` to the article numbered
    /// `root_number` there, oldest first
    ///
    /// A root that does not exist and a root without replies both give an
    /// empty list.
    pub async fn get_thread(&self, group: &Group, root_number: i64) -> Result<Vec<i64>> {
        let numbers: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT atg.article_number
            FROM articles a
            INNER JOIN articles_to_groups atg ON atg.article_id = a.id
            WHERE atg.group_id = ? AND a.thread = (
                SELECT root.message_id
                FROM articles root
                INNER JOIN articles_to_groups root_atg ON root_atg.article_id = root.id
                WHERE root_atg.group_id = ? AND root_atg.article_number = ?
            )
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(group.id)
        .bind(group.id)
        .bind(root_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get thread", e))?;

        Ok(numbers)
    }
}
