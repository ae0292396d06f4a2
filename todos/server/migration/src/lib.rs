pub use sea_orm_migration::prelude::*;

mod m20241016_000001_create_user_table;
mod m20241016_000002_create_session_table;
mod m20241016_000003_create_todo_table;
mod m20241016_000004_add_todo_created_at_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241016_000001_create_user_table::Migration),
            Box::new(m20241016_000002_create_session_table::Migration),
            Box::new(m20241016_000003_create_todo_table::Migration),
            Box::new(m20241016_000004_add_todo_created_at_index::Migration),
        ]
    }
}
