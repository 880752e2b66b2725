//! Contact storage.

use alert_core::Contact;
use sqlx::SqlitePool;

use crate::models::ContactRow;
use crate::Result;

/// Create or update a contact, keyed by phone number.
pub async fn upsert_contact(pool: &SqlitePool, contact: &Contact) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contacts (phone, name, relationship, priority, enabled)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(phone) DO UPDATE SET
            name = excluded.name,
            relationship = excluded.relationship,
            priority = excluded.priority,
            enabled = excluded.enabled,
            updated_at = datetime('now')
        "#,
    )
    .bind(&contact.phone)
    .bind(&contact.name)
    .bind(&contact.relationship)
    .bind(contact.priority as i64)
    .bind(contact.enabled)
    .execute(pool)
    .await?;

    Ok(())
}

/// All contacts, sorted ascending by priority.
pub async fn list_contacts(pool: &SqlitePool) -> Result<Vec<Contact>> {
    let rows = sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT phone, name, relationship, priority, enabled, updated_at
        FROM contacts
        ORDER BY priority ASC, name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Contact::from).collect())
}

/// Get a contact by phone number.
pub async fn get_contact(pool: &SqlitePool, phone: &str) -> Result<Option<Contact>> {
    let row = sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT phone, name, relationship, priority, enabled, updated_at
        FROM contacts
        WHERE phone = ?
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Contact::from))
}

/// Delete a contact by phone number. Returns whether a row was removed.
pub async fn delete_contact(pool: &SqlitePool, phone: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM contacts
        WHERE phone = ?
        "#,
    )
    .bind(phone)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
