pub use sea_orm_migration::prelude::*;

mod m20260601_000001_accounts;
mod m20260601_000002_portfolios;
mod m20260601_000003_posts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260601_000001_accounts::Migration),
            Box::new(m20260601_000002_portfolios::Migration),
            Box::new(m20260601_000003_posts::Migration),
        ]
    }
}
