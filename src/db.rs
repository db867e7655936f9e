use diesel::{prelude::*, r2d2};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::config::Settings;

pub type DbPool = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn initialize_db_pool(settings: &Settings) -> Result<DbPool, r2d2::PoolError> {
    let manager = r2d2::ConnectionManager::<PgConnection>::new(&settings.database_url);
    r2d2::Pool::builder()
        .max_size(settings.db_pool_size)
        .build(manager)
}

pub fn run_migrations(
    conn: &mut PgConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    for version in &applied {
        log::info!("applied migration {}", version);
    }
    Ok(())
}
