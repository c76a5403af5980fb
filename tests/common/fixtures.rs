//! Store and article fixtures

use newsstore::{ArticleBackend, Database, Headers, NewArticle, StoreConfig};
use std::sync::Arc;
use tempfile::TempDir;

/// Open a fresh store in a temp directory behind the backend trait
///
/// The returned `TempDir` must outlive the store.
pub async fn open_store() -> (Arc<dyn ArticleBackend>, Arc<Database>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = StoreConfig::with_path(temp_dir.path().join("news.db"));
    let db = Arc::new(
        Database::open(&config)
            .await
            .expect("Failed to open store"),
    );
    let backend: Arc<dyn ArticleBackend> = db.clone();
    (backend, db, temp_dir)
}

/// Thread root in comp.lang.go
pub fn post(message_id: &str, subject: &str) -> NewArticle {
    NewArticle {
        header: Headers::new()
            .with("Message-Id", message_id)
            .with("From", "gopher@example.com")
            .with("Newsgroups", "comp.lang.go")
            .with("Subject", subject),
        body: format!("{}\r\n", subject),
        ..Default::default()
    }
}

/// Direct reply to `parent`
pub fn follow_up(message_id: &str, parent: &str, subject: &str) -> NewArticle {
    let mut article = post(message_id, subject);
    article.header.append("References", parent);
    article.thread = Some(parent.to_string());
    article
}
