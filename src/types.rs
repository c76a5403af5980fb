//! Core types for newsstore

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Header carrying an article's external identity
pub const MESSAGE_ID_HEADER: &str = "Message-Id";

/// A newsgroup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique database ID, never reassigned
    pub id: i64,
    /// Unique group name (e.g. "comp.lang.go")
    pub name: String,
    /// Short description as shown by LIST NEWSGROUPS
    pub description: Option<String>,
    /// When the group was created
    pub created_at: DateTime<Utc>,
}

/// Ordered header block of an article
///
/// Maps a header name to every value it was given, in arrival order. Names are
/// stored in canonical MIME form (`message-ID` becomes `Message-Id`) so lookups
/// are case-insensitive. Serialized as a JSON object for storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    /// Create an empty header block
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`, keeping earlier values
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(canonical_name(name))
            .or_default()
            .push(value.into());
    }

    /// Builder form of [`append`](Self::append)
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    /// All values for `name` (empty if absent)
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0
            .get(&canonical_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// The article's Message-Id
    ///
    /// Fails unless there is exactly one non-empty value.
    pub fn message_id(&self) -> Result<&str> {
        match self.get_all(MESSAGE_ID_HEADER) {
            [id] if !id.trim().is_empty() => Ok(id.trim()),
            [] => Err(Error::InvalidArticle("missing Message-Id header".into())),
            [_] => Err(Error::InvalidArticle("empty Message-Id header".into())),
            many => Err(Error::InvalidArticle(format!(
                "expected one Message-Id, found {}",
                many.len()
            ))),
        }
    }

    /// Iterate over `(name, values)` in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no headers are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize for storage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored header block
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl<'a, V: Into<String>> FromIterator<(&'a str, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Canonical MIME header name: first letter and letters after `-` upper case
fn canonical_name(name: &str) -> String {
    let mut upper = true;
    name.trim()
        .chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// Attachment stored outside the article body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    /// MIME content type
    pub content_type: String,
    /// Reference to the externally stored attachment
    pub attachment_id: String,
}

/// Article to be saved
#[derive(Clone, Debug, Default)]
pub struct NewArticle {
    /// Header block; must carry exactly one Message-Id
    pub header: Headers,
    /// Body text
    pub body: String,
    /// Message-Id of the article this one replies to, `None` for a thread root
    pub thread: Option<String>,
    /// Attachment descriptors
    pub attachments: Vec<Attachment>,
}

/// Stored article as returned by reads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    /// Unique database ID
    pub id: i64,
    /// Parsed header block
    pub header: Headers,
    /// Body text
    pub body: String,
    /// Message-Id of the replied-to article, `None` for a thread root
    pub thread: Option<String>,
    /// When the article was accepted
    pub created_at: DateTime<Utc>,
    /// Article number within the group it was read through
    pub number: i64,
    /// Attachment descriptors
    pub attachments: Vec<Attachment>,
}

impl Article {
    /// The article's Message-Id
    pub fn message_id(&self) -> Option<&str> {
        self.header.message_id().ok()
    }
}

/// Number assigned to a saved article in one group
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupNumber {
    /// Group name
    pub group: String,
    /// Article number within the group
    pub number: i64,
}

/// Outcome of a successful save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedArticle {
    /// Database ID of the new article
    pub article_id: i64,
    /// The article's Message-Id
    pub message_id: String,
    /// Assigned numbers, in the order the groups were named
    pub numbers: Vec<GroupNumber>,
}

impl SavedArticle {
    /// Number assigned in `group`, if the article was posted there
    pub fn number_in(&self, group: &str) -> Option<i64> {
        self.numbers
            .iter()
            .find(|n| n.group == group)
            .map(|n| n.number)
    }
}

/// Article number selection decoded from NNTP-style `(low, high)` sentinels
///
/// `0` means "unset" and `-1` means "none":
///
/// | low | high | selection |
/// |---|---|---|
/// | 0 | 0 | every number |
/// | -1 | -1 | nothing |
/// | -1 | h | exactly `h` |
/// | l | -1 | numbers `> l` |
/// | l | h | numbers with `l < n < h` |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberRange {
    /// Every number in the group
    All,
    /// No numbers at all
    Empty,
    /// Exactly this number, if present
    Single(i64),
    /// Numbers strictly greater than this one
    After(i64),
    /// Numbers strictly between the bounds (both exclusive)
    Between(i64, i64),
}

impl NumberRange {
    /// Decode the sentinel pair
    pub fn from_sentinels(low: i64, high: i64) -> Self {
        match (low, high) {
            (0, 0) => NumberRange::All,
            (-1, -1) => NumberRange::Empty,
            (-1, h) if h != 0 => NumberRange::Single(h),
            (l, -1) if l != 0 => NumberRange::After(l),
            (l, h) => NumberRange::Between(l, h),
        }
    }
}

pub(crate) fn timestamp_to_utc(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
