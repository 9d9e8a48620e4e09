use anyhow::anyhow;
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{postgres::PgRow, query, PgPool, Row};
use tokio::sync::broadcast;

use crate::middleware::error_handling::Result;
use crate::models::inquiry::{CreateInquiryRequest, Inquiry, InquiryStatus};

const INQUIRY_COLUMNS: &str = "id, inquiry_number, full_name, email, phone, service_type, \
     message, status, notes, created_at, last_updated, assigned_to";

/// Storage seam for the `inquiries` collection: create, read-one, ordered
/// read-all, partial update, delete. Every successful write signals the
/// change broadcaster so live dashboard streams can re-snapshot.
pub struct InquiryRepository {
    pool: PgPool,
    events: broadcast::Sender<()>,
}

/// Opaque document id, assigned once at creation and never reused.
fn new_document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

fn row_to_inquiry(row: &PgRow) -> Result<Inquiry> {
    let service_type: String = row.try_get("service_type")?;
    let status: String = row.try_get("status")?;
    Ok(Inquiry {
        id: row.try_get("id")?,
        inquiry_number: row.try_get("inquiry_number")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        service_type: service_type
            .parse()
            .map_err(|e| anyhow!("stored service_type: {e}"))?,
        message: row.try_get("message")?,
        status: status.parse().map_err(|e| anyhow!("stored status: {e}"))?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        last_updated: row.try_get("last_updated")?,
        assigned_to: row.try_get("assigned_to")?,
    })
}

impl InquiryRepository {
    pub fn new(pool: PgPool, events: broadcast::Sender<()>) -> Self {
        Self { pool, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.events.subscribe()
    }

    fn notify(&self) {
        // No subscribers is fine; snapshots are pulled lazily.
        let _ = self.events.send(());
    }

    /// Creates one inquiry with `status = pending`, empty notes and a
    /// server-assigned creation timestamp. Visitor fields are stored trimmed.
    pub async fn create(&self, request: &CreateInquiryRequest) -> Result<Inquiry> {
        let id = new_document_id();
        let row = query(&format!(
            r#"
            INSERT INTO inquiries (id, full_name, email, phone, service_type, message, status, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, '', NOW())
            RETURNING {INQUIRY_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(request.full_name.trim())
        .bind(request.email.trim())
        .bind(request.phone.trim())
        .bind(request.service_type.as_str())
        .bind(request.message.trim())
        .bind(InquiryStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        let inquiry = row_to_inquiry(&row)?;
        self.notify();
        Ok(inquiry)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Inquiry>> {
        let row = query(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_inquiry).transpose()
    }

    /// The full collection, newest submission first.
    pub async fn list_all(&self) -> Result<Vec<Inquiry>> {
        let rows = query(&format!(
            "SELECT {INQUIRY_COLUMNS} FROM inquiries ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_inquiry).collect()
    }

    /// Atomic partial write of `status` and `last_updated`, guarded at the
    /// storage layer: the row is only touched while its current status is in
    /// `allowed_from`, so a concurrent transition cannot slip past the guard
    /// table. Returns `None` when the guard (or the row) no longer matches.
    pub async fn update_status(
        &self,
        id: &str,
        status: InquiryStatus,
        allowed_from: &[InquiryStatus],
    ) -> Result<Option<Inquiry>> {
        let allowed: Vec<String> = allowed_from
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();

        let row = query(&format!(
            r#"
            UPDATE inquiries
            SET status = $2, last_updated = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {INQUIRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(&allowed)
        .fetch_optional(&self.pool)
        .await?;

        let inquiry = row.as_ref().map(row_to_inquiry).transpose()?;
        if inquiry.is_some() {
            self.notify();
        }
        Ok(inquiry)
    }

    /// Partial write of `notes` and `last_updated`. The draft is persisted
    /// exactly as given; trimming only ever applies to the dirty check.
    pub async fn update_notes(&self, id: &str, notes: &str) -> Result<Option<Inquiry>> {
        let row = query(&format!(
            r#"
            UPDATE inquiries
            SET notes = $2, last_updated = NOW()
            WHERE id = $1
            RETURNING {INQUIRY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        let inquiry = row.as_ref().map(row_to_inquiry).transpose()?;
        if inquiry.is_some() {
            self.notify();
        }
        Ok(inquiry)
    }

    /// Hard delete; non-recoverable, no tombstone.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM inquiries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.notify();
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_are_opaque_alphanumeric() {
        let id = new_document_id();
        assert_eq!(id.len(), 20);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn document_ids_are_not_reused() {
        let a = new_document_id();
        let b = new_document_id();
        assert_ne!(a, b);
    }
}
