use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Debts are not tied to `groups` by a foreign key: membership may come from
/// another store, and group removal purges debts through the ledger.
#[derive(Iden)]
enum Debts {
    Table,
    Id,
    GroupId,
    CreditorId,
    DebtorId,
    OriginalAmountMinor,
    AmountMinor,
    Currency,
    Description,
    Status,
    SettledAt,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Debts::GroupId).string().not_null())
                    .col(ColumnDef::new(Debts::CreditorId).string().not_null())
                    .col(ColumnDef::new(Debts::DebtorId).string().not_null())
                    .col(
                        ColumnDef::new(Debts::OriginalAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Debts::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Debts::Currency)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Debts::Description).string().not_null())
                    .col(
                        ColumnDef::new(Debts::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Debts::SettledAt).timestamp())
                    .col(ColumnDef::new(Debts::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Debts::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Debts::UpdatedAt).timestamp().not_null())
                    .check(Expr::col(Debts::CreditorId).ne(Expr::col(Debts::DebtorId)))
                    .check(Expr::col(Debts::AmountMinor).gt(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-pair_status")
                    .table(Debts::Table)
                    .col(Debts::CreditorId)
                    .col(Debts::DebtorId)
                    .col(Debts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-group_status")
                    .table(Debts::Table)
                    .col(Debts::GroupId)
                    .col(Debts::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-debtor_id")
                    .table(Debts::Table)
                    .col(Debts::DebtorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await
    }
}
