//! Password History Repository Implementation
//!
//! PostgreSQL implementation of the append-only password history.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::PasswordHistoryRepository;
use crate::shared::error::AppError;

/// PostgreSQL password history repository.
#[derive(Clone)]
pub struct PgPasswordHistoryRepository {
    pool: PgPool,
}

impl PgPasswordHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordHistoryRepository for PgPasswordHistoryRepository {
    async fn create_record(&self, user_id: &str, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO password_history (user_id, password_hash) VALUES ($1, $2)")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn last_n_hashes(&self, user_id: &str, n: usize) -> Result<Vec<String>, AppError> {
        let mut hashes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT password_hash
            FROM password_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        // Newest-first from the query, oldest-first on the way out.
        hashes.reverse();
        Ok(hashes)
    }
}
