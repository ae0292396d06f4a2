use askama::Template;
use axum::Router;
use axum::extract::{Extension, Form, Request, State};
use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::config::Config;
use crate::session::{
    SESSION_COOKIE_NAME, Session, SessionCookies, SessionService, SessionServiceError,
};
use crate::user::{User, UserService, UserServiceError};
use crate::web::htmx;

pub mod forms;

use forms::{AuthFormState, INVALID_CREDENTIALS, LoginForm, SignupForm, USER_ALREADY_EXISTS};

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: String, username: String) -> Self {
        Self { id, username }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        CurrentUser::new(user.id().to_string(), user.username().to_string())
    }
}

/// Authentication state shared by the auth routes and the session middleware.
#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub cookies: SessionCookies,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config, db: Arc<sea_orm::DatabaseConnection>) -> Self {
        Self {
            db,
            cookies: SessionCookies::new(config.secure_cookie),
        }
    }
}

/// Creates the router serving the login and signup pages and actions.
pub fn create_auth_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/signup", get(signup_page_handler).post(signup_handler))
        .with_state(state)
}

/// Creates the logout router. Callers wrap it in the login redirect.
pub fn create_logout_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/logout", post(logout_handler))
        .with_state(state)
}

/// Session middleware that validates the session cookie and sets the `CurrentUser` and
/// `Session` extensions.
///
/// Refreshed sessions get a new cookie and unknown or expired ones a blank cookie, unless the
/// handler already set a session cookie on the response. This middleware does not redirect.
pub async fn session_middleware(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut cookie_update = None;

    if let Some(token) = jar
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value())
        .filter(|token| !token.is_empty())
    {
        match SessionService::new(&state.db).validate_session(token).await {
            Ok(Some(validated)) => {
                if validated.session.fresh {
                    cookie_update = Some(state.cookies.session_cookie(&validated.session.id));
                }
                request
                    .extensions_mut()
                    .insert(CurrentUser::from(validated.user));
                request.extensions_mut().insert(validated.session);
            }
            Ok(None) => cookie_update = Some(state.cookies.blank_cookie()),
            Err(err) => tracing::error!(error = %err, "Failed to validate session"),
        }
    }

    let mut response = next.run(request).await;

    if let Some(cookie) = cookie_update {
        if !sets_session_cookie(&response) {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| value.as_bytes().starts_with(prefix.as_bytes()))
}

/// Login redirect middleware that redirects unauthenticated users to the login page.
/// Apply it inside `session_middleware`, which provides the `CurrentUser` extension.
pub async fn login_redirect_middleware(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        return htmx::redirect(request.headers(), "/login");
    }

    next.run(request).await
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a user service error.
    #[error("User service error: {0}")]
    Users(#[from] UserServiceError),
    /// Represents a session service error.
    #[error("Session service error: {0}")]
    Session(#[from] SessionServiceError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "Unexpected error while handling auth request");
        let user_facing_error_message =
            "An unexpected error occurred while processing your request. Please try again later.";
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub form: AuthFormState,
}

#[derive(Template)]
#[template(path = "login/login_form.html")]
pub struct LoginFormTemplate {
    pub form: AuthFormState,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub form: AuthFormState,
}

#[derive(Template)]
#[template(path = "signup/signup_form.html")]
pub struct SignupFormTemplate {
    pub form: AuthFormState,
}

/// Renders the login form alone for htmx requests and the whole page otherwise.
fn render_login(headers: &HeaderMap, form: AuthFormState) -> Result<Response, AuthError> {
    let html = if htmx::is_htmx_request(headers) {
        LoginFormTemplate { form }.render()?
    } else {
        LoginTemplate { form }.render()?
    };
    Ok(Html(html).into_response())
}

/// Renders the signup form alone for htmx requests and the whole page otherwise.
fn render_signup(headers: &HeaderMap, form: AuthFormState) -> Result<Response, AuthError> {
    let html = if htmx::is_htmx_request(headers) {
        SignupFormTemplate { form }.render()?
    } else {
        SignupTemplate { form }.render()?
    };
    Ok(Html(html).into_response())
}

/// Starts a session for `user`, sets its cookie and sends the browser to the todos.
///
/// A session the request was already carrying is invalidated first.
async fn start_session(
    state: &AuthState,
    jar: CookieJar,
    headers: &HeaderMap,
    previous_session: Option<Extension<Session>>,
    user: &User,
) -> Result<Response, AuthError> {
    let sessions = SessionService::new(&state.db);
    if let Some(Extension(previous)) = previous_session {
        sessions.invalidate_session(&previous.id).await?;
    }

    let session = sessions.create_session(user.id()).await?;
    tracing::info!(username = user.username(), "Session started");
    let jar = jar.add(state.cookies.session_cookie(&session.id));
    Ok((jar, htmx::redirect(headers, "/todos")).into_response())
}

/// Handles GET requests to display the login page.
#[tracing::instrument(skip(headers))]
pub async fn login_page_handler(
    headers: HeaderMap,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, AuthError> {
    if current_user.is_some() {
        return Ok(htmx::redirect(&headers, "/todos"));
    }
    render_login(&headers, AuthFormState::default())
}

/// Handles the login request.
/// Unknown usernames and wrong passwords get the same form-level error.
#[tracing::instrument(skip_all)]
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    jar: CookieJar,
    previous_session: Option<Extension<Session>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AuthError> {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(form) => return render_login(&headers, form),
    };

    let Some(user) = UserService::new(&state.db)
        .verify_credentials(&credentials.username, credentials.password)
        .await?
    else {
        return render_login(
            &headers,
            AuthFormState::with_error(credentials.username, INVALID_CREDENTIALS),
        );
    };

    start_session(&state, jar, &headers, previous_session, &user).await
}

/// Handles GET requests to display the signup page.
#[tracing::instrument(skip(headers))]
pub async fn signup_page_handler(
    headers: HeaderMap,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, AuthError> {
    if current_user.is_some() {
        return Ok(htmx::redirect(&headers, "/todos"));
    }
    render_signup(&headers, AuthFormState::default())
}

/// Handles the signup request.
#[tracing::instrument(skip_all)]
pub async fn signup_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    jar: CookieJar,
    previous_session: Option<Extension<Session>>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AuthError> {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(form) => return render_signup(&headers, form),
    };

    let user = match UserService::new(&state.db)
        .create_user(&credentials.username, credentials.password)
        .await
    {
        Ok(user) => user,
        Err(UserServiceError::UserAlreadyExists(_)) => {
            return render_signup(
                &headers,
                AuthFormState::with_error(credentials.username, USER_ALREADY_EXISTS),
            );
        }
        Err(err) => return Err(err.into()),
    };

    start_session(&state, jar, &headers, previous_session, &user).await
}

/// Handles the logout request: invalidates the session, clears the cookie and redirects to
/// the login page.
#[tracing::instrument(skip_all)]
pub async fn logout_handler(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Extension(session): Extension<Session>,
) -> Result<(CookieJar, Response), AuthError> {
    SessionService::new(&state.db)
        .invalidate_session(&session.id)
        .await?;

    let jar = jar.add(state.cookies.blank_cookie());
    Ok((jar, htmx::redirect(&headers, "/login")))
}
