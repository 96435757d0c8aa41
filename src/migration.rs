//! Schema migrations.

use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entities::{comment, group, post, user};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTables)]
    }
}

/// Users, groups, posts and comments, created from the entity definitions
/// so column types and foreign keys follow the models.
struct CreateTables;

impl MigrationName for CreateTables {
    fn name(&self) -> &str {
        "m20210820_000001_create_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager.create_table(schema.create_table_from_entity(user::Entity)).await?;
        manager.create_table(schema.create_table_from_entity(group::Entity)).await?;
        manager.create_table(schema.create_table_from_entity(post::Entity)).await?;
        manager.create_table(schema.create_table_from_entity(comment::Entity)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, comment::Entity).await?;
        drop_table(manager, post::Entity).await?;
        drop_table(manager, group::Entity).await?;
        drop_table(manager, user::Entity).await
    }
}

async fn drop_table<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
