//! Article saves and number/range/message-id reads.

use chrono::{DateTime, Utc};

use crate::error::{DatabaseError, not_found_or};
use crate::retry::with_retry;
use crate::types::{
    Article, Attachment, Group, GroupNumber, NewArticle, NumberRange, SavedArticle,
};
use crate::{Error, Result};

use super::numbering::allocate_number;
use super::{ArticleRow, Database};

impl Database {
    /// Save an article into one or more groups
    ///
    /// Group names are trimmed; blank entries are ignored and repeated names
    /// join the group once. The article row, one membership per group and the
    /// attachment mappings are written in a single transaction: if any group
    /// is unknown the save fails with [`Error::NoSuchGroup`] and nothing is
    /// stored. Transactions that hit a busy database are retried according
    /// to the store's [`RetryConfig`](crate::config::RetryConfig).
    pub async fn save_article(
        &self,
        article: &NewArticle,
        group_names: &[&str],
    ) -> Result<SavedArticle> {
        let message_id = article.header.message_id()?;
        let names: Vec<&str> = group_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Err(Error::InvalidArticle(format!(
                "article {} names no newsgroups",
                message_id
            )));
        }
        let header = article.header.to_json()?;

        let header = header.as_str();
        let names = names.as_slice();
        let saved = with_retry(&self.retry, move || {
            self.save_article_once(article, message_id, header, names)
        })
        .await?;

        tracing::debug!(
            message_id = %saved.message_id,
            article_id = saved.article_id,
            numbers = ?saved.numbers,
            "Saved article"
        );

        Ok(saved)
    }

    async fn save_article_once(
        &self,
        article: &NewArticle,
        message_id: &str,
        header: &str,
        names: &[&str],
    ) -> Result<SavedArticle> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_sqlx("Failed to begin save transaction", e))?;

        // The article insert must stay the first statement: it takes the write
        // lock before anything is read, so concurrent saves wait on the busy
        // timeout instead of failing on a stale snapshot.
        let now = Utc::now().timestamp();
        let thread = article
            .thread
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let article_id = sqlx::query(
            r#"
            INSERT INTO articles (message_id, header, body, thread, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(message_id)
        .bind(header)
        .bind(&article.body)
        .bind(thread)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(
            |e| match DatabaseError::from_sqlx("Failed to insert article", e) {
                DatabaseError::ConstraintViolation(_) => {
                    Error::DuplicateArticle(message_id.to_string())
                }
                other => Error::Database(other),
            },
        )?
        .last_insert_rowid();

        let mut joined: Vec<i64> = Vec::with_capacity(names.len());
        let mut numbers = Vec::with_capacity(names.len());
        for name in names {
            let group_id: i64 = sqlx::query_scalar("SELECT id FROM groups WHERE group_name = ?")
                .bind(*name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DatabaseError::from_sqlx("Failed to resolve group", e))?
                .ok_or_else(|| Error::NoSuchGroup(name.to_string()))?;

            if joined.contains(&group_id) {
                continue;
            }
            joined.push(group_id);

            let number = allocate_number(&mut *tx, article_id, group_id).await?;
            numbers.push(GroupNumber {
                group: name.to_string(),
                number,
            });
        }

        for attachment in &article.attachments {
            sqlx::query(
                r#"
                INSERT INTO attachments_articles_mapping (article_id, content_type, attachment_id)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(article_id)
            .bind(&attachment.content_type)
            .bind(&attachment.attachment_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_sqlx("Failed to insert attachment mapping", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_sqlx("Failed to commit article", e))?;

        Ok(SavedArticle {
            article_id,
            message_id: message_id.to_string(),
            numbers,
        })
    }

    /// Get an article by its Message-Id
    ///
    /// An article posted to several groups has a number in each; the number
    /// returned is the one in the group with the lowest ID.
    pub async fn get_article(&self, message_id: &str) -> Result<Article> {
        let row: ArticleRow = sqlx::query_as(
            r#"
            SELECT a.id, a.header, a.body, a.thread, a.created_at,
                COALESCE((
                    SELECT atg.article_number FROM articles_to_groups atg
                    WHERE atg.article_id = a.id
                    ORDER BY atg.group_id
                    LIMIT 1
                ), 0) AS article_number
            FROM articles a
            WHERE a.message_id = ?
            "#,
        )
        .bind(message_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or("Failed to get article", format!("article {}", message_id), e))?;

        self.with_attachments(row.into_article()?).await
    }

    /// Get the article with `number` in `group`
    pub async fn get_article_by_number(&self, group: &Group, number: i64) -> Result<Article> {
        let row: ArticleRow = sqlx::query_as(
            r#"
            SELECT a.id, a.header, a.body, a.thread, a.created_at, atg.article_number
            FROM articles a
            INNER JOIN articles_to_groups atg ON atg.article_id = a.id
            WHERE atg.group_id = ? AND atg.article_number = ?
            "#,
        )
        .bind(group.id)
        .bind(number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or(
                "Failed to get article by number",
                format!("article {} in {}", number, group.name),
                e,
            )
        })?;

        self.with_attachments(row.into_article()?).await
    }

    /// Article numbers in `group` selected by NNTP-style `(low, high)`
    /// sentinels, ascending
    ///
    /// See [`NumberRange`] for the encoding. Note that the two-sided form is
    /// an open interval, unlike [`get_articles_by_range`](Self::get_articles_by_range).
    pub async fn get_article_numbers(
        &self,
        group: &Group,
        low: i64,
        high: i64,
    ) -> Result<Vec<i64>> {
        self.get_article_numbers_in(group, NumberRange::from_sentinels(low, high))
            .await
    }

    /// Article numbers in `group` within `range`, ascending
    pub async fn get_article_numbers_in(
        &self,
        group: &Group,
        range: NumberRange,
    ) -> Result<Vec<i64>> {
        let query = match range {
            NumberRange::Empty => return Ok(Vec::new()),
            NumberRange::All => sqlx::query_scalar(
                r#"
                SELECT article_number FROM articles_to_groups
                WHERE group_id = ?
                ORDER BY article_number
                "#,
            )
            .bind(group.id),
            NumberRange::Single(number) => sqlx::query_scalar(
                r#"
                SELECT article_number FROM articles_to_groups
                WHERE group_id = ? AND article_number = ?
                "#,
            )
            .bind(group.id)
            .bind(number),
            NumberRange::After(low) => sqlx::query_scalar(
                r#"
                SELECT article_number FROM articles_to_groups
                WHERE group_id = ? AND article_number > ?
                ORDER BY article_number
                "#,
            )
            .bind(group.id)
            .bind(low),
            NumberRange::Between(low, high) => sqlx::query_scalar(
                r#"
                SELECT article_number FROM articles_to_groups
                WHERE group_id = ? AND article_number > ? AND article_number < ?
                ORDER BY article_number
                "#,
            )
            .bind(group.id)
            .bind(low)
            .bind(high),
        };

        let numbers: Vec<i64> = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("Failed to get article numbers", e))?;

        Ok(numbers)
    }

    /// The article numbered immediately below `article` in `group`
    ///
    /// Fails with [`Error::NotFound`] if `article` is the lowest numbered one.
    /// Attachments are not loaded.
    pub async fn get_last_article_by_num(
        &self,
        group: &Group,
        article: &Article,
    ) -> Result<Article> {
        let row: ArticleRow = sqlx::query_as(
            r#"
            SELECT a.id, a.header, a.body, a.thread, a.created_at, atg.article_number
            FROM articles a
            INNER JOIN articles_to_groups atg ON atg.article_id = a.id
            WHERE atg.group_id = ? AND atg.article_number < ?
            ORDER BY atg.article_number DESC
            LIMIT 1
            "#,
        )
        .bind(group.id)
        .bind(article.number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or(
                "Failed to get previous article",
                format!("article before {} in {}", article.number, group.name),
                e,
            )
        })?;

        row.into_article()
    }

    /// The article numbered immediately above `article` in `group`
    ///
    /// Fails with [`Error::NotFound`] if `article` is the highest numbered one.
    /// Attachments are not loaded.
    pub async fn get_next_article_by_num(
        &self,
        group: &Group,
        article: &Article,
    ) -> Result<Article> {
        let row: ArticleRow = sqlx::query_as(
            r#"
            SELECT a.id, a.header, a.body, a.thread, a.created_at, atg.article_number
            FROM articles a
            INNER JOIN articles_to_groups atg ON atg.article_id = a.id
            WHERE atg.group_id = ? AND atg.article_number > ?
            ORDER BY atg.article_number
            LIMIT 1
            "#,
        )
        .bind(group.id)
        .bind(article.number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or(
                "Failed to get next article",
                format!("article after {} in {}", article.number, group.name),
                e,
            )
        })?;

        row.into_article()
    }

    /// Articles numbered `low..=high` in `group`, ascending
    ///
    /// Both bounds are inclusive. Attachments are not loaded.
    pub async fn get_articles_by_range(
        &self,
        group: &Group,
        low: i64,
        high: i64,
    ) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.header, a.body, a.thread, a.created_at, atg.article_number
            FROM articles a
            INNER JOIN articles_to_groups atg ON atg.article_id = a.id
            WHERE atg.group_id = ? AND atg.article_number >= ? AND atg.article_number <= ?
            ORDER BY atg.article_number
            "#,
        )
        .bind(group.id)
        .bind(low)
        .bind(high)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get articles by range", e))?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }

    /// Message-Ids of articles saved strictly after `since`, oldest first
    ///
    /// Compares whole seconds: `since` is truncated to its second.
    pub async fn get_new_articles_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT message_id FROM articles WHERE created_at > ? ORDER BY created_at, id",
        )
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get new articles", e))?;

        Ok(ids)
    }

    async fn with_attachments(&self, mut article: Article) -> Result<Article> {
        article.attachments = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT content_type, attachment_id
            FROM attachments_articles_mapping
            WHERE article_id = ?
            ORDER BY id
            "#,
        )
        .bind(article.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get attachments", e))?;

        Ok(article)
    }
}
