use sea_orm_migration::prelude::*;

use crate::m20241016_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Todo::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Todo::Title).text().not_null())
                    .col(ColumnDef::new(Todo::UserId).string().not_null())
                    .col(ColumnDef::new(Todo::Description).text().not_null())
                    .col(ColumnDef::new(Todo::Completed).boolean().not_null())
                    .col(
                        ColumnDef::new(Todo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Todo::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todo_user_id")
                            .from(Todo::Table, Todo::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Todo {
    Table,
    Id,
    Title,
    UserId,
    Description,
    Completed,
    CreatedAt,
    UpdatedAt,
}
