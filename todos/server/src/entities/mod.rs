//! `SeaORM` Entity, hand-maintained alongside the `migration` crate.

pub mod prelude;

pub mod session;
pub mod todo;
pub mod user;
