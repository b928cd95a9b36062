//! User provisioning and lookup service.
//!
//! Owns the write side the authentication core depends on: new accounts get
//! their password hashed here before the record is stored.

use crate::database::models::{CreateUser, User};
use crate::errors::{AuthError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::utils::password;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

/// Payload for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewUser {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub is_superuser: bool,
}

pub struct UserService<'a> {
    /// Shared database connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user, hashing the password before storage.
    pub async fn create_user(&self, create_user: CreateNewUser) -> ServiceResult<User> {
        if let Err(validation_errors) = create_user.validate() {
            let error_messages: Vec<String> = validation_errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| {
                        format!(
                            "{}: {}",
                            field,
                            error.message.as_ref().unwrap_or(&"Invalid value".into())
                        )
                    })
                })
                .collect();
            return Err(AuthError::validation(error_messages.join(", ")));
        }

        let repo = UserRepository::new(self.pool);

        if repo.username_exists(&create_user.username).await? {
            return Err(AuthError::validation("Username already taken"));
        }
        if repo.email_exists(&create_user.email).await? {
            return Err(AuthError::validation("Email already registered"));
        }

        let password_hash = password::hash_password(&create_user.password)?;

        let user = repo
            .create_user(CreateUser {
                id: Uuid::new_v4().to_string(),
                username: create_user.username,
                email: create_user.email,
                password_hash,
                is_superuser: create_user.is_superuser,
            })
            .await?;

        Ok(user)
    }

    /// Retrieves a user by ID, failing if absent.
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user)
    }
}
