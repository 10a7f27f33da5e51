/// Form definition types
///
/// A form is a named, tenant-scoped field schema. The schema itself is an
/// opaque JSON value the engine stores and returns unchanged.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row};

/// A reusable form definition
///
/// Forms are immutable once created: there is no update operation, only
/// create and cascade delete. Tasks and submissions reference forms by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    /// Unique form identifier (UUID)
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// User who created the form
    pub user_id: String,
    /// Human-readable form name
    pub name: String,
    /// Field schema: an ordered list of { "id", "type", "label" } objects.
    /// Stored opaquely; submissions are never validated against it.
    pub content: Option<Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl FormDefinition {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        let content: Option<String> = row.get("content");
        Ok(Self {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            content: content.map(|c| serde_json::from_str(&c)).transpose()?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
