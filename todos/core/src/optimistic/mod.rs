//! Client-side prediction of list mutations.
//!
//! A change is applied to the visible list as soon as it is dispatched, before the server has
//! confirmed it. Once the server answers, the predicted state is thrown away and replaced by
//! the authoritative list (see [`OptimisticTodos::reconcile`]). There is no per-action
//! rollback and no merging of concurrent edits.

use chrono::{DateTime, Utc};

use crate::todo::Todo;

/// Partial changes applied to an existing todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    /// A patch that only replaces the title.
    pub fn title(title: impl Into<String>) -> Self {
        TodoPatch {
            title: Some(title.into()),
            completed: None,
        }
    }

    /// A patch that only sets the completion flag.
    pub fn completed(completed: bool) -> Self {
        TodoPatch {
            title: None,
            completed: Some(completed),
        }
    }

    fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title.clone_from(title);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

/// A predicted mutation of the todo list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add {
        id: String,
        title: String,
        created_at: DateTime<Utc>,
    },
    Update {
        id: String,
        patch: TodoPatch,
    },
    Delete {
        id: String,
    },
}

impl Action {
    /// Builds an add action with a freshly generated id, stamped with the current time.
    ///
    /// The same id is expected to be sent along with the create request so the confirmed
    /// row lines up with the predicted one.
    pub fn add(title: impl Into<String>) -> Self {
        Action::add_with_id(uuid::Uuid::new_v4().to_string(), title)
    }

    /// Builds an add action for a caller-chosen id.
    pub fn add_with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Action::Add {
            id: id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    pub fn update(id: impl Into<String>, patch: TodoPatch) -> Self {
        Action::Update {
            id: id.into(),
            patch,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Action::Delete { id: id.into() }
    }

    /// The id of the todo this action targets.
    pub fn id(&self) -> &str {
        match self {
            Action::Add { id, .. } | Action::Update { id, .. } | Action::Delete { id } => id,
        }
    }
}

/// Applies a single action to a list and returns the resulting list.
///
/// Entries not targeted by the action are returned untouched and in their original order.
pub fn reduce(mut todos: Vec<Todo>, action: &Action) -> Vec<Todo> {
    match action {
        Action::Add {
            id,
            title,
            created_at,
        } => {
            todos.insert(0, Todo::new(id.clone(), title.clone(), *created_at));
            todos
        }
        Action::Update { id, patch } => {
            for todo in todos.iter_mut().filter(|todo| &todo.id == id) {
                patch.apply(todo);
            }
            todos
        }
        Action::Delete { id } => {
            todos.retain(|todo| &todo.id != id);
            todos
        }
    }
}

/// Confirmed list plus the actions that have been predicted on top of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimisticTodos {
    confirmed: Vec<Todo>,
    pending: Vec<Action>,
}

impl OptimisticTodos {
    /// Starts from a list the server has already confirmed.
    pub fn new(confirmed: Vec<Todo>) -> Self {
        OptimisticTodos {
            confirmed,
            pending: Vec::new(),
        }
    }

    /// Records a predicted action. It shows up in [`todos`](Self::todos) immediately.
    pub fn dispatch(&mut self, action: Action) {
        self.pending.push(action);
    }

    /// The list as the user should currently see it.
    pub fn todos(&self) -> Vec<Todo> {
        self.pending
            .iter()
            .fold(self.confirmed.clone(), |todos, action| reduce(todos, action))
    }

    /// The last list the server confirmed.
    pub fn confirmed(&self) -> &[Todo] {
        &self.confirmed
    }

    /// Returns whether any predicted action is still waiting for the server.
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Replaces the confirmed list with the server's answer and drops every prediction.
    pub fn reconcile(&mut self, confirmed: Vec<Todo>) {
        self.confirmed = confirmed;
        self.pending.clear();
    }
}
