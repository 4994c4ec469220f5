use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Portfolios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Portfolios::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Portfolios::OwnerId).string().not_null())
                    .col(ColumnDef::new(Portfolios::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Portfolios::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolios_owner_id")
                            .from(Portfolios::Table, Portfolios::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One portfolio per owner, enforced by the store rather than check-then-insert.
        manager
            .create_index(
                Index::create()
                    .name("uq_portfolios_owner_id")
                    .table(Portfolios::Table)
                    .col(Portfolios::OwnerId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PortfolioMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortfolioMembers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PortfolioMembers::PortfolioId).string().not_null())
                    .col(ColumnDef::new(PortfolioMembers::UserId).string().not_null())
                    .col(ColumnDef::new(PortfolioMembers::InvitedBy).string())
                    .col(
                        ColumnDef::new(PortfolioMembers::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(PortfolioMembers::InvitedAt).big_integer().not_null())
                    .col(ColumnDef::new(PortfolioMembers::AcceptedAt).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolio_members_portfolio_id")
                            .from(PortfolioMembers::Table, PortfolioMembers::PortfolioId)
                            .to(Portfolios::Table, Portfolios::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolio_members_user_id")
                            .from(PortfolioMembers::Table, PortfolioMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A collaborator belongs to one portfolio at a time.
        manager
            .create_index(
                Index::create()
                    .name("uq_portfolio_members_user_id")
                    .table(PortfolioMembers::Table)
                    .col(PortfolioMembers::UserId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_portfolio_members_portfolio_id")
                    .table(PortfolioMembers::Table)
                    .col(PortfolioMembers::PortfolioId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PortfolioInvitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortfolioInvitations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PortfolioInvitations::PortfolioId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PortfolioInvitations::Email).string().not_null())
                    .col(ColumnDef::new(PortfolioInvitations::Token).string().not_null())
                    .col(ColumnDef::new(PortfolioInvitations::InvitedBy).string().not_null())
                    .col(
                        ColumnDef::new(PortfolioInvitations::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PortfolioInvitations::ExpiresAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PortfolioInvitations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolio_invitations_portfolio_id")
                            .from(PortfolioInvitations::Table, PortfolioInvitations::PortfolioId)
                            .to(Portfolios::Table, Portfolios::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_portfolio_invitations_invited_by")
                            .from(PortfolioInvitations::Table, PortfolioInvitations::InvitedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_portfolio_invitations_token")
                    .table(PortfolioInvitations::Table)
                    .col(PortfolioInvitations::Token)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_portfolio_invitations_portfolio_email")
                    .table(PortfolioInvitations::Table)
                    .col(PortfolioInvitations::PortfolioId)
                    .col(PortfolioInvitations::Email)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(PortfolioInvitations::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(PortfolioMembers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Portfolios::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Portfolios {
    Table,
    Id,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PortfolioMembers {
    Table,
    Id,
    PortfolioId,
    UserId,
    InvitedBy,
    Status,
    InvitedAt,
    AcceptedAt,
}

#[derive(DeriveIden)]
enum PortfolioInvitations {
    Table,
    Id,
    PortfolioId,
    Email,
    Token,
    InvitedBy,
    Status,
    ExpiresAt,
    CreatedAt,
}
