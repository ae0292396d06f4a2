use askama::Template;
use axum::{
    Extension, Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use todos_core::Todo;

use crate::auth::CurrentUser;
use crate::todo::input::{TodoId, TodoTitle};
use crate::todo::{TodoService, TodoServiceError};
use crate::web::htmx;

const CREATE_REJECTED_MESSAGE: &str = "This todo could not be created";
const NOT_FOUND_MESSAGE: &str = "Todo not found";

const CREATE_UNAUTHENTICATED: &str = "You must be logged in to create a todo";
const UPDATE_UNAUTHENTICATED: &str = "You must be logged in to update a todo";
const TOGGLE_UNAUTHENTICATED: &str = "You must be logged in to toggle a todo";
const DELETE_UNAUTHENTICATED: &str = "You must be logged in to delete a todo";
const VIEW_UNAUTHENTICATED: &str = "You must be logged in to view a todo";
const EDIT_UNAUTHENTICATED: &str = "You must be logged in to edit a todo";

#[derive(Clone, Debug)]
pub struct TodoState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub select_limit: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

impl ListQuery {
    /// The trimmed search term, or an empty string when no search is active.
    fn search(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameTodoForm {
    #[serde(default)]
    title: String,
}

/// Custom error type for todo handler operations.
#[derive(Debug, thiserror::Error)]
enum TodoError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a todo service error.
    #[error("Todo service error")]
    Service(#[from] TodoServiceError),
    /// The submitted form did not pass validation.
    #[error("Invalid input: {0}")]
    Validation(&'static str),
    /// No user is logged in.
    #[error("{0}")]
    Unauthenticated(&'static str),
    /// The todo does not exist or belongs to someone else.
    #[error("Todo not found")]
    NotFound,
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            TodoError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, *message),
            // Same message for own and foreign ids.
            TodoError::Service(TodoServiceError::DuplicateId(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, CREATE_REJECTED_MESSAGE)
            }
            TodoError::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, *message),
            TodoError::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            TodoError::Template(_) | TodoError::Service(_) => {
                tracing::error!(error = ?self, "Unexpected error while handling todo request");
                let Ok(rendered) = ErrorBoundaryTemplate.render() else {
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                };
                let mut response =
                    (StatusCode::INTERNAL_SERVER_ERROR, Html(rendered)).into_response();
                htmx::retarget(&mut response, "#todo-list", "outerHTML");
                return response;
            }
        };

        let error_template = ErrorMessageTemplate::new(message.to_string());
        let Ok(rendered) = error_template.render() else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };

        let mut response = (status_code, Html(rendered)).into_response();
        htmx::retarget(&mut response, "#todo-error", "innerHTML");
        response
    }
}

#[derive(Template)]
#[template(path = "todos.html")]
struct TodosPageTemplate {
    username: String,
    todos: Vec<Todo>,
    search: String,
}

#[derive(Template)]
#[template(path = "todos/todo_list_fragment.html")]
struct TodoListTemplate<'a> {
    todos: Vec<Todo>,
    search: &'a str,
}

#[derive(Template)]
#[template(path = "todos/todo_item.html")]
struct TodoItemTemplate<'a> {
    todo: Todo,
    search: &'a str,
}

#[derive(Template)]
#[template(path = "todos/edit_todo_form.html")]
struct EditTodoFormTemplate<'a> {
    todo: Todo,
    search: &'a str,
}

#[derive(Template)]
#[template(path = "todos/error_message.html")]
struct ErrorMessageTemplate {
    message: String,
}

impl ErrorMessageTemplate {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

#[derive(Template)]
#[template(path = "error_boundary.html")]
struct ErrorBoundaryTemplate;

fn require_user(
    current_user: Option<Extension<CurrentUser>>,
    message: &'static str,
) -> Result<CurrentUser, TodoError> {
    current_user
        .map(|Extension(user)| user)
        .ok_or(TodoError::Unauthenticated(message))
}

/// Queries the current list of `owner_id` and renders it as the list fragment.
#[tracing::instrument(skip(state))]
async fn render_todo_list(
    state: &TodoState,
    owner_id: &str,
    search: &str,
) -> Result<Html<String>, TodoError> {
    let service = TodoService::new(&state.db);
    let todos = service
        .list_todos(owner_id, Some(search), state.select_limit)
        .await?;
    let template = TodoListTemplate { todos, search };
    template.render().map(Html).map_err(TodoError::from)
}

/// Sends `/todos` to the default view.
#[tracing::instrument]
async fn todos_redirect_handler(headers: HeaderMap) -> Response {
    htmx::redirect(&headers, "/todos/inbox")
}

/// Handler for the full todo page of the logged in user.
#[tracing::instrument(skip(state))]
async fn inbox_handler(
    State(state): State<Arc<TodoState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TodoError> {
    let search = query.search();
    let todos = TodoService::new(&state.db)
        .list_todos(&user.id, Some(search), state.select_limit)
        .await?;
    let template = TodosPageTemplate {
        username: user.username,
        todos,
        search: search.to_string(),
    };
    template.render().map(Html).map_err(TodoError::from)
}

/// Handler that re-renders the list fragment, used for revalidation.
#[tracing::instrument(skip(state))]
async fn todo_list_handler(
    State(state): State<Arc<TodoState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TodoError> {
    render_todo_list(&state, &user.id, query.search()).await
}

/// Handler for creating a todo via POST request.
#[tracing::instrument(skip(state))]
async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    current_user: Option<Extension<CurrentUser>>,
    Query(query): Query<ListQuery>,
    Form(form): Form<CreateTodoForm>,
) -> Result<Html<String>, TodoError> {
    let user = require_user(current_user, CREATE_UNAUTHENTICATED)?;
    let title = TodoTitle::parse(&form.title).map_err(TodoError::Validation)?;
    let id = match form.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(TodoId::parse(id).map_err(TodoError::Validation)?),
        _ => None,
    };

    TodoService::new(&state.db)
        .create_todo(&user.id, title, id)
        .await?;
    render_todo_list(&state, &user.id, query.search()).await
}

/// Handler for renaming a todo via PUT request.
#[tracing::instrument(skip(state))]
async fn rename_todo_handler(
    State(state): State<Arc<TodoState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
    Form(form): Form<RenameTodoForm>,
) -> Result<Html<String>, TodoError> {
    let user = require_user(current_user, UPDATE_UNAUTHENTICATED)?;
    let id = TodoId::parse(&id).map_err(TodoError::Validation)?;
    let title = TodoTitle::parse(&form.title).map_err(TodoError::Validation)?;

    TodoService::new(&state.db)
        .rename_todo(&user.id, &id, title)
        .await?;
    render_todo_list(&state, &user.id, query.search()).await
}

/// Handler for flipping the completion state of a todo.
#[tracing::instrument(skip(state))]
async fn toggle_todo_handler(
    State(state): State<Arc<TodoState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TodoError> {
    let user = require_user(current_user, TOGGLE_UNAUTHENTICATED)?;

    TodoService::new(&state.db).toggle_todo(&user.id, &id).await?;
    render_todo_list(&state, &user.id, query.search()).await
}

/// Handler for deleting a todo via DELETE request.
#[tracing::instrument(skip(state))]
async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TodoError> {
    let user = require_user(current_user, DELETE_UNAUTHENTICATED)?;

    TodoService::new(&state.db).delete_todo(&user.id, &id).await?;
    render_todo_list(&state, &user.id, query.search()).await
}

/// Handler for a single todo row, used to leave edit mode.
#[tracing::instrument(skip(state))]
async fn todo_item_handler(
    State(state): State<Arc<TodoState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TodoError> {
    let user = require_user(current_user, VIEW_UNAUTHENTICATED)?;
    let todo = TodoService::new(&state.db)
        .get_todo(&user.id, &id)
        .await?
        .ok_or(TodoError::NotFound)?;

    let template = TodoItemTemplate {
        todo,
        search: query.search(),
    };
    template.render().map(Html).map_err(TodoError::from)
}

/// Handler for the inline edit form of a todo.
#[tracing::instrument(skip(state))]
async fn edit_todo_handler(
    State(state): State<Arc<TodoState>>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, TodoError> {
    let user = require_user(current_user, EDIT_UNAUTHENTICATED)?;
    let todo = TodoService::new(&state.db)
        .get_todo(&user.id, &id)
        .await?
        .ok_or(TodoError::NotFound)?;

    let template = EditTodoFormTemplate {
        todo,
        search: query.search(),
    };
    template.render().map(Html).map_err(TodoError::from)
}

/// Creates the router for the todo pages. Callers wrap it in the login redirect.
pub fn create_todo_pages_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route("/todos", get(todos_redirect_handler))
        .route("/todos/inbox", get(inbox_handler))
        .route("/todos/list", get(todo_list_handler))
        .with_state(state)
}

/// Creates the router for todo actions. Unauthenticated calls are answered with a message.
pub fn create_todo_actions_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route("/todos/items", post(create_todo_handler))
        .route(
            "/todos/items/{id}",
            get(todo_item_handler)
                .put(rename_todo_handler)
                .delete(delete_todo_handler),
        )
        .route("/todos/items/{id}/edit", get(edit_todo_handler))
        .route("/todos/items/{id}/toggle", post(toggle_todo_handler))
        .with_state(state)
}
