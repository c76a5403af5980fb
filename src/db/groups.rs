//! Newsgroup lookup, creation and wildmat filtering.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::error::{DatabaseError, not_found_or};
use crate::types::Group;
use crate::wildmat::Wildmat;
use crate::{Error, Result};

use super::{Database, GroupRow};

const GROUP_COLUMNS: &str = "id, group_name, description, created_at";

impl Database {
    /// List every group, ordered by name
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            "SELECT {} FROM groups ORDER BY group_name",
            GROUP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to list groups", e))?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    /// List groups whose name matches a wildmat pattern, ordered by name
    ///
    /// The pattern is compiled once and evaluated inside SQLite through the
    /// `REGEXP` function: a name matches if some positive alternative matches
    /// and no negated alternative after it does.
    pub async fn list_groups_by_pattern(&self, pattern: &str) -> Result<Vec<Group>> {
        let wildmat = Wildmat::compile(pattern)?;
        if !wildmat.can_match() {
            return Ok(Vec::new());
        }

        let alternatives: Vec<(bool, &str)> = wildmat.alternatives().collect();
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM groups WHERE ", GROUP_COLUMNS));

        let mut first = true;
        for (i, (negated, expr)) in alternatives.iter().enumerate() {
            if *negated {
                continue;
            }
            if !first {
                query_builder.push(" OR ");
            }
            first = false;

            query_builder.push("(group_name REGEXP ");
            query_builder.push_bind(*expr);
            for (later_negated, later) in &alternatives[i + 1..] {
                if *later_negated {
                    query_builder.push(" AND group_name NOT REGEXP ");
                    query_builder.push_bind(*later);
                }
            }
            query_builder.push(")");
        }
        query_builder.push(" ORDER BY group_name");

        let rows: Vec<GroupRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_sqlx("Failed to list groups by pattern", e))?;

        tracing::debug!(
            pattern = wildmat.as_str(),
            matched = rows.len(),
            "Filtered groups by wildmat"
        );

        Ok(rows.into_iter().map(Group::from).collect())
    }

    /// Get a group by its exact name
    pub async fn get_group(&self, name: &str) -> Result<Group> {
        let row: GroupRow = sqlx::query_as(&format!(
            "SELECT {} FROM groups WHERE group_name = ?",
            GROUP_COLUMNS
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or("Failed to get group", format!("group {}", name), e))?;

        Ok(row.into())
    }

    /// Create a new group
    ///
    /// The name is trimmed and must not contain whitespace or wildmat
    /// metacharacters, otherwise it could never be selected by a pattern.
    pub async fn create_group(&self, name: &str, description: Option<&str>) -> Result<Group> {
        let name = name.trim();
        validate_group_name(name)?;

        let now = Utc::now().timestamp();
        let row: GroupRow = sqlx::query_as(&format!(
            "INSERT INTO groups (group_name, description, created_at) VALUES (?, ?, ?) RETURNING {}",
            GROUP_COLUMNS
        ))
        .bind(name)
        .bind(description)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from_sqlx("Failed to create group", e) {
            DatabaseError::ConstraintViolation(_) => Error::GroupExists(name.to_string()),
            other => Error::Database(other),
        })?;

        tracing::info!(group = name, id = row.id, "Created newsgroup");

        Ok(row.into())
    }

    /// Groups created strictly after `since`, oldest first
    ///
    /// Compares whole seconds: `since` is truncated to its second.
    pub async fn get_new_groups_since(&self, since: DateTime<Utc>) -> Result<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!(
            "SELECT {} FROM groups WHERE created_at > ? ORDER BY created_at, id",
            GROUP_COLUMNS
        ))
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_sqlx("Failed to get new groups", e))?;

        Ok(rows.into_iter().map(Group::from).collect())
    }
}

fn validate_group_name(name: &str) -> Result<()> {
    let forbidden = |c: char| c.is_whitespace() || c.is_control() || "*?[]\\,!".contains(c);
    if name.is_empty() || name.contains(forbidden) {
        return Err(Error::InvalidGroupName(name.to_string()));
    }
    Ok(())
}
