use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use innkeeper::config::Settings;
use innkeeper::storage::{BlobStore, LocalDiskStore};
use innkeeper::{catalog, db, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(io::Error::other)?;

    // initialize DB pool outside of `HttpServer::new` so that it is shared across all workers
    let pool = db::initialize_db_pool(&settings).map_err(io::Error::other)?;

    if settings.run_migrations || settings.seed_catalog {
        let mut conn = pool.get().map_err(io::Error::other)?;
        if settings.run_migrations {
            db::run_migrations(&mut conn).map_err(io::Error::other)?;
        }
        if settings.seed_catalog {
            catalog::seed_catalog(&mut conn).map_err(io::Error::other)?;
        }
    }

    let store: Arc<dyn BlobStore> = Arc::new(LocalDiskStore::new(
        &settings.storage_root,
        settings.public_base_url.as_str(),
    ));
    let store = web::Data::from(store);

    log::info!(
        "starting HTTP server at http://{}:{}, files under {}",
        settings.bind_addr,
        settings.port,
        settings.storage_root.display()
    );

    HttpServer::new(move || {
        App::new()
            // add DB pool handle to app data; enables use of `web::Data<DbPool>` extractor
            .app_data(web::Data::new(pool.clone()))
            .app_data(store.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind((settings.bind_addr.as_str(), settings.port))?
    .run()
    .await
}
