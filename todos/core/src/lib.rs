//! Core domain models and the optimistic list reducer for the todos app.
//!
//! The server renders from the database only and never predicts changes. The htmx pages
//! send mutations and swap in the list the server returns. The browser only generates the id
//! of a new todo ahead of time. [`OptimisticTodos`] is the state model for richer clients
//! that want to show a change before the server confirms it.
pub mod optimistic;
pub mod todo;

pub use optimistic::{Action, OptimisticTodos, TodoPatch, reduce};
pub use todo::Todo;
