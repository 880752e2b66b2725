//! Message template storage.

use alert_core::MessageTemplate;
use sqlx::SqlitePool;

use crate::models::TemplateRow;
use crate::{DatabaseError, Result};

/// Create or update a template.
pub async fn upsert_template(pool: &SqlitePool, template: &MessageTemplate) -> Result<()> {
    let required_variables = serde_json::to_string(&template.required_variables)
        .map_err(|e| DatabaseError::Corrupt {
            entity: "template",
            id: template.id.clone(),
            reason: e.to_string(),
        })?;

    sqlx::query(
        r#"
        INSERT INTO message_templates (id, body, required_variables)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            body = excluded.body,
            required_variables = excluded.required_variables,
            updated_at = datetime('now')
        "#,
    )
    .bind(&template.id)
    .bind(&template.body)
    .bind(required_variables)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a template by id.
pub async fn get_template(pool: &SqlitePool, id: &str) -> Result<Option<MessageTemplate>> {
    let row = sqlx::query_as::<_, TemplateRow>(
        r#"
        SELECT id, body, required_variables, updated_at
        FROM message_templates
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(TemplateRow::into_template).transpose()
}

/// All templates.
pub async fn list_templates(pool: &SqlitePool) -> Result<Vec<MessageTemplate>> {
    let rows = sqlx::query_as::<_, TemplateRow>(
        r#"
        SELECT id, body, required_variables, updated_at
        FROM message_templates
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TemplateRow::into_template).collect()
}
