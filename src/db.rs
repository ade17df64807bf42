use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Set, Statement, TransactionTrait,
};

use crate::entities::{director, genre};

const DEFAULT_GENRES: [&str; 3] = ["Action", "Sci-Fi", "Drama"];
const DEFAULT_DIRECTOR: &str = "Christopher Nolan";

pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    // Every pooled connection to `:memory:` would open its own empty database.
    if database_url.contains(":memory:") {
        options.min_connections(1).max_connections(1);
    }
    let db = Database::connect(options).await?;

    // These run on a single pooled connection. sqlx already turns on foreign keys
    // for every connection it opens, and WAL mode is stored in the database file.
    for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Inserts the stock genres and director when their tables are still empty.
pub async fn seed_defaults<C>(conn: &C) -> Result<(), sea_orm::DbErr>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = conn.begin().await?;

    if genre::Entity::find().count(&txn).await? == 0 {
        let rows = DEFAULT_GENRES.iter().map(|name| genre::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        });
        genre::Entity::insert_many(rows).exec_without_returning(&txn).await?;
        tracing::info!(count = DEFAULT_GENRES.len(), "seeded genres");
    }

    if director::Entity::find().count(&txn).await? == 0 {
        let row = director::ActiveModel { name: Set(DEFAULT_DIRECTOR.to_string()), ..Default::default() };
        director::Entity::insert(row).exec_without_returning(&txn).await?;
        tracing::info!(name = DEFAULT_DIRECTOR, "seeded director");
    }

    txn.commit().await
}

#[cfg(test)]
mod tests {
    use sea_orm::QueryOrder;

    use super::*;

    #[tokio::test]
    async fn seeding_is_idempotent() -> Result<(), sea_orm::DbErr> {
        let db = connect_and_migrate("sqlite::memory:").await?;
        seed_defaults(&db).await?;
        seed_defaults(&db).await?;

        let genres = genre::Entity::find().order_by_asc(genre::Column::Id).all(&db).await?;
        let names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, DEFAULT_GENRES);
        assert_eq!(director::Entity::find().count(&db).await?, 1);
        Ok(())
    }
}
