//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait. Maps between
//! the `users` / `user_bio` tables and the domain entities. All reads
//! filter soft-deleted rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{User, UserBio, UserBioUpdate, UserRepository};
use crate::shared::error::AppError;

/// Database row representation matching the `users` table schema.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// Database row representation matching the `user_bio` table schema.
#[derive(Debug, sqlx::FromRow)]
struct UserBioRow {
    user_id: String,
    fullname: String,
    location: String,
    bio: String,
    web: String,
    picture: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserBioRow {
    fn into_bio(self) -> UserBio {
        UserBio {
            user_id: self.user_id,
            fullname: self.fullname,
            location: self.location,
            bio: self.bio,
            web: self.web,
            picture: self.picture,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL user repository implementation.
///
/// Uses sqlx against a shared pool; prepared statements are cached by the
/// driver for the life of the pool.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, is_active, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, is_active, created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Insert the user and its bio row in one transaction. A failure of
    /// the bio insert rolls the user back.
    async fn create_user(&self, user: &User, bio: &UserBio) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, is_active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("user already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_bio (user_id, fullname, location, bio, web, picture)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&bio.user_id)
        .bind(&bio.fullname)
        .bind(&bio.location)
        .bind(&bio.bio)
        .bind(&bio.web)
        .bind(&bio.picture)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn update_activation_status_by_id(
        &self,
        id: &str,
        is_active: bool,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        Ok(())
    }

    async fn update_password_by_id(&self, id: &str, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        Ok(())
    }

    async fn update_email_by_id(&self, id: &str, email: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("email is already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        Ok(())
    }

    async fn get_user_bio_by_id(&self, id: &str) -> Result<Option<UserBio>, AppError> {
        let row = sqlx::query_as::<_, UserBioRow>(
            r#"
            SELECT user_id, fullname, location, bio, web, picture, created_at, updated_at
            FROM user_bio
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_bio()))
    }

    /// Empty strings for location / bio / web keep the stored column;
    /// fullname always overwrites.
    async fn update_user_bio_by_id(&self, id: &str, bio: &UserBioUpdate) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE user_bio
            SET fullname = $2,
                location = COALESCE(NULLIF($3, ''), location),
                bio = COALESCE(NULLIF($4, ''), bio),
                web = COALESCE(NULLIF($5, ''), web),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .bind(&bio.fullname)
        .bind(&bio.location)
        .bind(&bio.bio)
        .bind(&bio.web)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        Ok(())
    }

    async fn update_picture_by_id(&self, id: &str, path: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE user_bio SET picture = $2, updated_at = NOW() WHERE user_id = $1")
                .bind(id)
                .bind(path)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        Ok(())
    }

    async fn delete_user_by_id(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {} not found", id)));
        }

        Ok(())
    }
}
