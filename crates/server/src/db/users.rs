//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use resold_core::{Role, UserId};

use super::RepositoryError;
use crate::models::User;

/// Fields an admin may edit on a user.
///
/// `None` means "leave unchanged".
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub disabled: Option<bool>,
}

#[derive(FromRow)]
struct UserRow {
    id: i32,
    firstname: String,
    lastname: String,
    email: String,
    role: String,
    disabled: bool,
    verified: bool,
    registered_at: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid role in database: {e}")))?;

        Ok(User {
            id: UserId::new(self.id),
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            role,
            disabled: self.disabled,
            verified: self.verified,
            registered_at: self.registered_at,
            last_login: self.last_login,
        })
    }
}

const USER_COLUMNS: &str =
    "id, firstname, lastname, email, role, disabled, verified, registered_at, last_login";

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

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if the stored role is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// List users, optionally filtered by a case-insensitive search over
    /// first name, last name, and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<User>, RepositoryError> {
        let rows = match search {
            Some(term) => {
                let pattern = format!("%{term}%");
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE firstname ILIKE $1 OR lastname ILIKE $1 OR email ILIKE $1
                     ORDER BY id"
                ))
                .bind(pattern)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserRow>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY id"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Apply an admin edit, returning the updated user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist, or
    /// `RepositoryError::Conflict` if the new email is taken.
    pub async fn update(&self, id: UserId, up: UserUpdate) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET
                firstname = COALESCE($2, firstname),
                lastname  = COALESCE($3, lastname),
                email     = COALESCE($4, email),
                role      = COALESCE($5, role),
                disabled  = COALESCE($6, disabled)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(up.firstname)
        .bind(up.lastname)
        .bind(up.email)
        .bind(up.role.map(|r| r.to_string()))
        .bind(up.disabled)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// Set or clear the disabled (moderation) flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_disabled(&self, id: UserId, disabled: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET disabled = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(disabled)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a user.
    ///
    /// # Returns
    ///
    /// Returns `true` if the user was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Display names for a set of users, keyed by id.
    ///
    /// Missing users are simply absent from the result; callers render them
    /// as "Unknown" rather than failing the request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn display_names(
        &self,
        ids: &[UserId],
    ) -> Result<std::collections::HashMap<UserId, String>, RepositoryError> {
        if ids.is_empty() {
            return Ok(std::collections::HashMap::new());
        }

        let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let rows: Vec<(i32, String, String)> = sqlx::query_as(
            "SELECT id, firstname, lastname FROM users WHERE id = ANY($1)",
        )
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, first, last)| (UserId::new(id), format!("{first} {last}")))
            .collect())
    }
}
