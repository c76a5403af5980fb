//! Storage backend trait
//!
//! The NNTP command layer talks to storage through [`ArticleBackend`] so it
//! can be exercised against any implementation. [`Database`] is the SQLite
//! implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::db::{Database, Watermarks};
use crate::types::{Article, Group, NewArticle, SavedArticle};

/// Article and newsgroup storage as seen by an NNTP server
///
/// # Examples
///
/// ```no_run
/// use newsstore::{ArticleBackend, Database};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend: Arc<dyn ArticleBackend> =
///     Arc::new(Database::new(Path::new("news.db")).await?);
///
/// for group in backend.list_groups_by_pattern("comp.*,!comp.binaries.*").await? {
///     let marks = backend.get_group_watermarks(&group).await?;
///     println!("{} {} {} {}", group.name, marks.count, marks.low, marks.high);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ArticleBackend: Send + Sync {
    /// All groups
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Groups whose name matches a wildmat pattern
    async fn list_groups_by_pattern(&self, pattern: &str) -> Result<Vec<Group>>;

    /// Group by exact name, [`Error::NotFound`](crate::Error::NotFound) if absent
    async fn get_group(&self, name: &str) -> Result<Group>;

    /// Groups created strictly after `since`
    ///
    /// Creation times are stored in whole seconds and `since` is truncated to
    /// its second before comparing, so a group created later within the same
    /// second as `since` is not reported.
    async fn get_new_groups_since(&self, since: DateTime<Utc>) -> Result<Vec<Group>>;

    /// Number of articles in `group`
    async fn get_articles_count(&self, group: &Group) -> Result<i64>;

    /// Highest article number in `group`, 0 if empty
    async fn get_group_high_water_mark(&self, group: &Group) -> Result<i64>;

    /// Lowest article number in `group`, 0 if empty
    async fn get_group_low_water_mark(&self, group: &Group) -> Result<i64>;

    /// Count and both watermarks in one read
    async fn get_group_watermarks(&self, group: &Group) -> Result<Watermarks>;

    /// Save an article into the named groups, all or nothing
    async fn save_article(&self, article: &NewArticle, groups: &[&str]) -> Result<SavedArticle>;

    /// Article by Message-Id
    async fn get_article(&self, message_id: &str) -> Result<Article>;

    /// Article by number within `group`
    async fn get_article_by_number(&self, group: &Group, number: i64) -> Result<Article>;

    /// Article numbers selected by `(low, high)` sentinels
    async fn get_article_numbers(&self, group: &Group, low: i64, high: i64) -> Result<Vec<i64>>;

    /// Previous article by number within `group`
    async fn get_last_article_by_num(&self, group: &Group, article: &Article) -> Result<Article>;

    /// Next article by number within `group`
    async fn get_next_article_by_num(&self, group: &Group, article: &Article) -> Result<Article>;

    /// Articles numbered `low..=high` within `group`
    async fn get_articles_by_range(&self, group: &Group, low: i64, high: i64)
    -> Result<Vec<Article>>;

    /// Message-Ids of articles saved strictly after `since`
    ///
    /// Save times are stored in whole seconds and `since` is truncated to its
    /// second before comparing, so an article saved later within the same
    /// second as `since` is not reported.
    async fn get_new_articles_since(&self, since: DateTime<Utc>) -> Result<Vec<String>>;

    /// A page of thread root numbers, newest first
    async fn get_new_threads(&self, group: &Group, per_page: u32, page_num: u32)
    -> Result<Vec<i64>>;

    /// Reply numbers for the root numbered `root_number`, oldest first
    async fn get_thread(&self, group: &Group, root_number: i64) -> Result<Vec<i64>>;
}

#[async_trait]
impl ArticleBackend for Database {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        Database::list_groups(self).await
    }

    async fn list_groups_by_pattern(&self, pattern: &str) -> Result<Vec<Group>> {
        Database::list_groups_by_pattern(self, pattern).await
    }

    async fn get_group(&self, name: &str) -> Result<Group> {
        Database::get_group(self, name).await
    }

    async fn get_new_groups_since(&self, since: DateTime<Utc>) -> Result<Vec<Group>> {
        Database::get_new_groups_since(self, since).await
    }

    async fn get_articles_count(&self, group: &Group) -> Result<i64> {
        Database::get_articles_count(self, group).await
    }

    async fn get_group_high_water_mark(&self, group: &Group) -> Result<i64> {
        Database::get_group_high_water_mark(self, group).await
    }

    async fn get_group_low_water_mark(&self, group: &Group) -> Result<i64> {
        Database::get_group_low_water_mark(self, group).await
    }

    async fn get_group_watermarks(&self, group: &Group) -> Result<Watermarks> {
        Database::get_group_watermarks(self, group).await
    }

    async fn save_article(&self, article: &NewArticle, groups: &[&str]) -> Result<SavedArticle> {
        Database::save_article(self, article, groups).await
    }

    async fn get_article(&self, message_id: &str) -> Result<Article> {
        Database::get_article(self, message_id).await
    }

    async fn get_article_by_number(&self, group: &Group, number: i64) -> Result<Article> {
        Database::get_article_by_number(self, group, number).await
    }

    async fn get_article_numbers(&self, group: &Group, low: i64, high: i64) -> Result<Vec<i64>> {
        Database::get_article_numbers(self, group, low, high).await
    }

    async fn get_last_article_by_num(&self, group: &Group, article: &Article) -> Result<Article> {
        Database::get_last_article_by_num(self, group, article).await
    }

    async fn get_next_article_by_num(&self, group: &Group, article: &Article) -> Result<Article> {
        Database::get_next_article_by_num(self, group, article).await
    }

    async fn get_articles_by_range(
        &self,
        group: &Group,
        low: i64,
        high: i64,
    ) -> Result<Vec<Article>> {
        Database::get_articles_by_range(self, group, low, high).await
    }

    async fn get_new_articles_since(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        Database::get_new_articles_since(self, since).await
    }

    async fn get_new_threads(
        &self,
        group: &Group,
        per_page: u32,
        page_num: u32,
    ) -> Result<Vec<i64>> {
        Database::get_new_threads(self, group, per_page, page_num).await
    }

    async fn get_thread(&self, group: &Group, root_number: i64) -> Result<Vec<i64>> {
        Database::get_thread(self, group, root_number).await
    }
}
