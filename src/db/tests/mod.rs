use crate::db::*;
use crate::types::{Attachment, Headers, NewArticle};
use tempfile::NamedTempFile;


/// Fresh database on a temp file; keep the file alive for the test's duration.
async fn test_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

/// Root article with a subject and a one-line body
fn article(message_id: &str) -> NewArticle {
    NewArticle {
        header: Headers::new()
            .with("Message-Id", message_id)
            .with("Subject", format!("Subject of {}", message_id))
            .with("From", "poster@example.com"),
        body: format!("Body of {}", message_id),
        thread: None,
        attachments: Vec::new(),
    }
}

/// Reply to `parent`
fn reply(message_id: &str, parent: &str) -> NewArticle {
    let mut new = article(message_id);
    new.header.append("References", parent);
    new.thread = Some(parent.to_string());
    new
}

fn attachment(content_type: &str, id: &str) -> Attachment {
    Attachment {
        content_type: content_type.to_string(),
        attachment_id: id.to_string(),
    }
}
