use anyhow::Result;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, Schema, SqlxPostgresConnector,
};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use crate::entity::{
    BlogCategories, BlogPosts, CompetitionResults, Competitions, HorseTransporters,
    Notifications, OrderItems, Orders, ProductCategories, Products, PushSubscriptions,
    ServiceBookings, ServiceReviews, Users, Veterinarians,
};

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Create the Postgres pool shared by migrations and the ORM.
pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Wrap an existing sqlx pool in a SeaORM connection.
pub fn orm_from_pool(pool: DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool)
}

/// Apply the embedded SQL migrations in `migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Build every table straight from the entity definitions.
///
/// Used against throwaway databases (the test-suite runs on in-memory SQLite);
/// production schemas come from `run_migrations`.
pub async fn create_schema(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    create_table(conn, &schema, Users).await?;
    create_table(conn, &schema, ProductCategories).await?;
    create_table(conn, &schema, Products).await?;
    create_table(conn, &schema, Orders).await?;
    create_table(conn, &schema, OrderItems).await?;
    create_table(conn, &schema, Competitions).await?;
    create_table(conn, &schema, CompetitionResults).await?;
    create_table(conn, &schema, BlogCategories).await?;
    create_table(conn, &schema, BlogPosts).await?;
    create_table(conn, &schema, Veterinarians).await?;
    create_table(conn, &schema, HorseTransporters).await?;
    create_table(conn, &schema, ServiceBookings).await?;
    create_table(conn, &schema, ServiceReviews).await?;
    create_table(conn, &schema, Notifications).await?;
    create_table(conn, &schema, PushSubscriptions).await?;

    Ok(())
}

async fn create_table<E>(conn: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let stmt = schema.create_table_from_entity(entity);
    conn.execute(backend.build(&stmt)).await?;
    Ok(())
}
