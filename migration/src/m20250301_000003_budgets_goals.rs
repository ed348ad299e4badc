//! 预算与储蓄目标表

use sea_orm_migration::prelude::*;

use crate::m20250301_000001_users_categories::{Categories, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Budgets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Budgets::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Budgets::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Budgets::CategoryId).big_integer().null())
                    .col(ColumnDef::new(Budgets::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Budgets::AmountCents).big_integer().not_null())
                    .col(ColumnDef::new(Budgets::Period).string_len(16).not_null())
                    .col(ColumnDef::new(Budgets::StartDate).date().not_null())
                    // 提醒去重：记录最近一次提醒所在周期及级别
                    .col(ColumnDef::new(Budgets::AlertPeriodStart).date().null())
                    .col(ColumnDef::new(Budgets::AlertLevel).string_len(16).null())
                    .col(
                        ColumnDef::new(Budgets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Budgets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budgets_user")
                            .from(Budgets::Table, Budgets::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budgets_category")
                            .from(Budgets::Table, Budgets::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_budgets_user")
                    .table(Budgets::Table)
                    .col(Budgets::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Goals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Goals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Goals::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Goals::TargetCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Goals::CurrentCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Goals::Deadline).date().null())
                    .col(
                        ColumnDef::new(Goals::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Goals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Goals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goals_user")
                            .from(Goals::Table, Goals::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_goals_user")
                    .table(Goals::Table)
                    .col(Goals::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_goals_user").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_budgets_user").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budgets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Budgets {
    Table,
    Id,
    UserId,
    CategoryId,
    Name,
    AmountCents,
    Period,
    StartDate,
    AlertPeriodStart,
    AlertLevel,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Goals {
    Table,
    Id,
    UserId,
    Name,
    TargetCents,
    CurrentCents,
    Deadline,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
