use sqlx::PgPool;
use uuid::Uuid;

use crate::middleware::error_handling::Result;
use crate::models::user::Staff;

pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT id, email, password_hash, display_name, disabled, created_at \
             FROM staff WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(
            "SELECT id, email, password_hash, display_name, disabled, created_at \
             FROM staff WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }
}
