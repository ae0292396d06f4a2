use crate::entities::*;
use crate::user::User;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use sea_orm::*;

pub mod cookie;

pub use cookie::{SESSION_COOKIE_NAME, SessionCookies};

const SESSION_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
const SESSION_ID_LENGTH: usize = 40;

/// How long a session stays valid after it is created or refreshed.
pub fn session_lifetime() -> TimeDelta {
    TimeDelta::days(30)
}

/// Sessions with less than this much time left are extended on the next request.
pub fn refresh_window() -> TimeDelta {
    session_lifetime() / 2
}

/// A server-side login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    /// Set when the expiration was just extended and the client needs a new cookie.
    pub fresh: bool,
}

impl From<session::Model> for Session {
    fn from(model: session::Model) -> Self {
        Session {
            id: model.id,
            user_id: model.user_id,
            expires_at: model.expires_at,
            fresh: false,
        }
    }
}

/// A valid session together with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    pub session: Session,
    pub user: User,
}

/// Error type for SessionService operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct SessionService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl SessionService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> SessionService<'_> {
        SessionService { db }
    }

    /// Creates a new session for the given user, valid for [`session_lifetime`].
    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self, user_id: &str) -> Result<Session, SessionServiceError> {
        let active_model = session::ActiveModel {
            id: ActiveValue::Set(generate_session_id()),
            user_id: ActiveValue::Set(user_id.to_string()),
            expires_at: ActiveValue::Set(Utc::now() + session_lifetime()),
        };
        let created = active_model.insert(self.db).await?;
        let mut session = Session::from(created);
        session.fresh = true;
        Ok(session)
    }

    /// Validates a session token against the current time.
    ///
    /// See [`validate_session_at`](Self::validate_session_at).
    #[tracing::instrument(skip_all)]
    pub async fn validate_session(
        &self,
        session_id: &str,
    ) -> Result<Option<ValidatedSession>, SessionServiceError> {
        self.validate_session_at(session_id, Utc::now()).await
    }

    /// Validates a session token as of `now`.
    ///
    /// Unknown tokens yield `None`. Expired sessions are deleted and yield `None`. Sessions
    /// inside the refresh window get a new expiration and come back marked `fresh`.
    pub async fn validate_session_at(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ValidatedSession>, SessionServiceError> {
        let Some((model, Some(user_model))) = session::Entity::find_by_id(session_id)
            .find_also_related(user::Entity)
            .one(self.db)
            .await?
        else {
            return Ok(None);
        };

        if now >= model.expires_at {
            tracing::debug!("Session expired, removing it");
            session::Entity::delete_by_id(model.id).exec(self.db).await?;
            return Ok(None);
        }

        let session = if now >= model.expires_at - refresh_window() {
            let mut active_model: session::ActiveModel = model.into();
            active_model.expires_at = ActiveValue::Set(now + session_lifetime());
            let updated = active_model.update(self.db).await?;
            let mut session = Session::from(updated);
            session.fresh = true;
            session
        } else {
            Session::from(model)
        };

        Ok(Some(ValidatedSession {
            session,
            user: User::from(user_model),
        }))
    }

    /// Deletes a single session. Unknown IDs are ignored.
    #[tracing::instrument(skip_all)]
    pub async fn invalidate_session(&self, session_id: &str) -> Result<(), SessionServiceError> {
        session::Entity::delete_by_id(session_id)
            .exec(self.db)
            .await?;
        Ok(())
    }

    /// Deletes every session of a user.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_user_sessions(&self, user_id: &str) -> Result<u64, SessionServiceError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Removes sessions that expired before now.
    #[tracing::instrument(skip(self))]
    pub async fn delete_expired_sessions(&self) -> Result<u64, SessionServiceError> {
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(Utc::now()))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

fn generate_session_id() -> String {
    let mut rng = rand::rng();
    (0..SESSION_ID_LENGTH)
        .map(|_| SESSION_ID_ALPHABET[rng.random_range(0..SESSION_ID_ALPHABET.len())] as char)
        .collect()
}
