use crate::entities::*;
use sea_orm::*;

pub mod password;

use password::PasswordError;

/// A registered account, without its credentials.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct User {
    id: String,
    username: String,
}

impl User {
    pub fn new(id: String, username: String) -> Self {
        Self { id, username }
    }

    /// Returns the ID of the user.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        User::new(model.id, model.username)
    }
}

/// Error type for UserService operations.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// The username is already taken.
    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// Represents a failure while hashing or verifying a password.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

pub struct UserService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl UserService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> UserService<'_> {
        UserService { db }
    }

    /// Registers a new user with a hashed password.
    ///
    /// # Arguments
    ///
    /// * `username` - The unique username.
    /// * `password` - The plain text password. Only its hash is stored.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `User`, or `UserAlreadyExists` when the username is taken.
    #[tracing::instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        password: String,
    ) -> Result<User, UserServiceError> {
        if self.find_by_username(username).await?.is_some() {
            return Err(UserServiceError::UserAlreadyExists(username.to_string()));
        }

        let password_hash = password::hash_password(password).await?;
        let active_model = user::ActiveModel {
            id: ActiveValue::Set(uuid::Uuid::new_v4().to_string()),
            username: ActiveValue::Set(username.to_string()),
            password_hash: ActiveValue::Set(password_hash),
        };

        // A concurrent signup can still win the race between the lookup and the insert.
        match active_model.insert(self.db).await {
            Ok(created) => Ok(User::from(created)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(UserServiceError::UserAlreadyExists(username.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Looks up a user by username and checks the password.
    ///
    /// Returns `None` both for an unknown username and for a wrong password so callers cannot
    /// tell the two apart.
    #[tracing::instrument(skip(self, password))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: String,
    ) -> Result<Option<User>, UserServiceError> {
        let Some(model) = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?
        else {
            return Ok(None);
        };

        let matches = password::verify_password(model.password_hash.clone(), password).await?;
        if !matches {
            tracing::info!("Rejected login for existing user");
            return Ok(None);
        }
        Ok(Some(User::from(model)))
    }

    /// Retrieves a user by username.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?
            .map(User::from);
        Ok(user)
    }

    /// Retrieves a user by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, UserServiceError> {
        let user = user::Entity::find_by_id(id).one(self.db).await?.map(User::from);
        Ok(user)
    }
}
