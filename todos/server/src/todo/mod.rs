use crate::entities::*;
use chrono::Utc;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::*;
use todos_core::Todo;

pub mod input;
pub mod web;

pub use input::{TodoId, TodoTitle};
pub use web::{TodoState, create_todo_actions_router, create_todo_pages_router};

/// Default number of todos shown in a list.
pub const TODOS_SELECT_LIMIT: u64 = 15;

/// Error type for TodoService operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoServiceError {
    /// A client-supplied ID collides with an existing todo.
    #[error("Todo with ID {0} already exists")]
    DuplicateId(String),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<todo::Model> for Todo {
    fn from(model: todo::Model) -> Self {
        Todo {
            id: model.id,
            title: model.title,
            completed: model.completed,
            created_at: model.created_at,
        }
    }
}

/// Persistence for todos. Every query is scoped to the owning user.
///
/// Mutations never check that the todo exists first: a missing or foreign todo simply
/// affects zero rows, and the number of affected rows is returned.
pub struct TodoService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl TodoService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> TodoService<'_> {
        TodoService { db }
    }

    /// Creates a new, not yet completed todo for `owner_id`.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - The ID of the user creating the todo.
    /// * `title` - The validated title.
    /// * `id` - An optional client-generated ID. A fresh one is generated when absent.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Todo`, or `DuplicateId` when the ID is already taken.
    #[tracing::instrument(skip(self))]
    pub async fn create_todo(
        &self,
        owner_id: &str,
        title: TodoTitle,
        id: Option<TodoId>,
    ) -> Result<Todo, TodoServiceError> {
        let id = id.unwrap_or_else(TodoId::generate).into_inner();
        let now = Utc::now();
        let active_model = todo::ActiveModel {
            id: ActiveValue::Set(id.clone()),
            title: ActiveValue::Set(title.into_inner()),
            user_id: ActiveValue::Set(owner_id.to_string()),
            description: ActiveValue::Set(String::new()),
            completed: ActiveValue::Set(false),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        match active_model.insert(self.db).await {
            Ok(created) => Ok(Todo::from(created)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(TodoServiceError::DuplicateId(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Flips the completion flag of a todo in a single statement.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_todo(&self, owner_id: &str, id: &str) -> Result<u64, TodoServiceError> {
        let flipped = SimpleExpr::from(Expr::col(todo::Column::Completed)).not();
        let result = todo::Entity::update_many()
            .col_expr(todo::Column::Completed, flipped)
            .col_expr(todo::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(todo::Column::Id.eq(id))
            .filter(todo::Column::UserId.eq(owner_id))
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            tracing::debug!("Toggle matched no todo");
        }
        Ok(result.rows_affected)
    }

    /// Replaces the title of a todo.
    #[tracing::instrument(skip(self))]
    pub async fn rename_todo(
        &self,
        owner_id: &str,
        id: &TodoId,
        title: TodoTitle,
    ) -> Result<u64, TodoServiceError> {
        let result = todo::Entity::update_many()
            .col_expr(todo::Column::Title, Expr::value(title.into_inner()))
            .col_expr(todo::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(todo::Column::Id.eq(id.as_str()))
            .filter(todo::Column::UserId.eq(owner_id))
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            tracing::debug!("Rename matched no todo");
        }
        Ok(result.rows_affected)
    }

    /// Deletes a todo.
    #[tracing::instrument(skip(self))]
    pub async fn delete_todo(&self, owner_id: &str, id: &str) -> Result<u64, TodoServiceError> {
        let result = todo::Entity::delete_many()
            .filter(todo::Column::Id.eq(id))
            .filter(todo::Column::UserId.eq(owner_id))
            .exec(self.db)
            .await?;
        if result.rows_affected == 0 {
            tracing::debug!("Delete matched no todo");
        }
        Ok(result.rows_affected)
    }

    /// Retrieves a single todo owned by `owner_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_todo(&self, owner_id: &str, id: &str) -> Result<Option<Todo>, TodoServiceError> {
        let todo = todo::Entity::find()
            .filter(todo::Column::Id.eq(id))
            .filter(todo::Column::UserId.eq(owner_id))
            .one(self.db)
            .await?
            .map(Todo::from);
        Ok(todo)
    }

    /// Lists the newest todos of `owner_id`.
    ///
    /// Titles are compared with Unicode lowercasing on both sides; SQLite's `LOWER` folds ASCII
    /// only. When searching, rows are read page by page, newest first, until `limit` match.
    ///
    /// # Arguments
    ///
    /// * `owner_id` - The ID of the user whose todos are listed.
    /// * `search` - Optional case-insensitive substring the title must contain.
    /// * `limit` - Maximum number of todos returned.
    #[tracing::instrument(skip(self))]
    pub async fn list_todos(
        &self,
        owner_id: &str,
        search: Option<&str>,
        limit: u64,
    ) -> Result<Vec<Todo>, TodoServiceError> {
        let query = todo::Entity::find()
            .filter(todo::Column::UserId.eq(owner_id))
            .order_by_desc(todo::Column::CreatedAt);

        let Some(needle) = search
            .filter(|search| !search.is_empty())
            .map(str::to_lowercase)
        else {
            let todos = query
                .limit(limit)
                .all(self.db)
                .await?
                .into_iter()
                .map(Todo::from)
                .collect();
            return Ok(todos);
        };

        let capacity = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut todos = Vec::new();
        let mut pages = query.paginate(self.db, SEARCH_PAGE_SIZE);
        while todos.len() < capacity {
            let Some(page) = pages.fetch_and_next().await? else {
                break;
            };
            todos.extend(
                page.into_iter()
                    .filter(|model| title_contains(&model.title, &needle))
                    .map(Todo::from),
            );
        }
        todos.truncate(capacity);
        Ok(todos)
    }
}

/// Rows read per round trip while searching.
const SEARCH_PAGE_SIZE: u64 = 100;

/// Whether `title` contains the already lowercased `needle`, ignoring case.
fn title_contains(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
}
