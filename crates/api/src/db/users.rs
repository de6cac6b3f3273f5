//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wear_with_pride_core::{Email, UserId, UserRole, UserStatus};

use super::RepositoryError;
use crate::models::{User, UserFilter};

const USER_COLUMNS: &str = "id, name, email, role, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    role: UserRole,
    status: UserStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            name: r.name,
            email,
            role: r.role,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// One page of users matching `filter`, newest first, plus the total
    /// number of matching users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email is invalid.
    pub async fn list(&self, filter: &UserFilter) -> Result<(Vec<User>, u64), RepositoryError> {
        const WHERE: &str = r"
            WHERE ($1::shop.user_role IS NULL OR role = $1)
              AND ($2::shop.user_status IS NULL OR status = $2)
              AND ($3::text IS NULL
                   OR name ILIKE '%' || $3 || '%'
                   OR email ILIKE '%' || $3 || '%')
        ";

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM shop.users
            {WHERE}
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(filter.role)
        .bind(filter.status)
        .bind(filter.search.as_deref())
        .bind(i64::from(filter.limit))
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM shop.users {WHERE}"))
                .bind(filter.role)
                .bind(filter.status)
                .bind(filter.search.as_deref())
                .fetch_one(self.pool)
                .await?;

        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {total}")))?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total))
    }

    /// Flip a user between active and blocked in one statement.
    ///
    /// Returns `None` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn toggle_status(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.users
            SET status = CASE WHEN status = 'active' THEN 'blocked'::shop.user_status
                              ELSE 'active'::shop.user_status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = &row {
            tracing::info!(user_id = row.id, status = ?row.status, "User status toggled");
        }
        row.map(User::try_from).transpose()
    }
}
