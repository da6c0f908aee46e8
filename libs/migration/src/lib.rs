pub use sea_orm_migration::prelude::*;

mod m20260105_000000_bootstrap;
mod m20260105_000001_create_events;
mod m20260106_000000_create_interactions;
mod m20260112_000000_create_compensation_queue;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000000_bootstrap::Migration),
            Box::new(m20260105_000001_create_events::Migration),
            Box::new(m20260106_000000_create_interactions::Migration),
            Box::new(m20260112_000000_create_compensation_queue::Migration),
        ]
    }
}
