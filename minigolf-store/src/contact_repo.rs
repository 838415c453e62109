use async_trait::async_trait;
use chrono::{DateTime, Utc};
use minigolf_core::contact::{ContactStatus, ContactSubmission};
use minigolf_core::repository::ContactRepository;
use minigolf_core::{CoreError, CoreResult};
use minigolf_shared::Masked;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{db_err, parse_column};

pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, phone, subject, message, status, created_at";

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    subject: String,
    message: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for ContactSubmission {
    type Error = CoreError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(ContactSubmission {
            id: row.id,
            name: row.name,
            email: Masked(row.email),
            phone: row.phone.map(Masked),
            subject: row.subject,
            message: row.message,
            status: parse_column("status", &row.status)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn create_submission(&self, submission: &ContactSubmission) -> CoreResult<ContactSubmission> {
        let row: ContactRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO contact_submissions (id, name, email, phone, subject, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        ))
        .bind(submission.id)
        .bind(&submission.name)
        .bind(submission.email.expose())
        .bind(submission.phone.as_ref().map(|p| p.expose()))
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(submission.status.as_str())
        .bind(submission.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.try_into()
    }

    async fn list_submissions(&self, status: Option<ContactStatus>) -> CoreResult<Vec<ContactSubmission>> {
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contact_submissions WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC",
            CONTACT_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(ContactSubmission::try_from).collect()
    }

    async fn update_submission_status(&self, id: Uuid, status: ContactStatus) -> CoreResult<ContactSubmission> {
        let row: Option<ContactRow> = sqlx::query_as(&format!(
            "UPDATE contact_submissions SET status = $2 WHERE id = $1 RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| CoreError::NotFound(format!("Contact submission {}", id)))?
            .try_into()
    }
}
