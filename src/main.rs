use std::time::Duration;

use actix_web::{middleware, web, App, HttpRequest, HttpServer, Responder};
use diesel_migrations::MigrationHarness;

use vitrola::{db, logging, routes, storage::BlobStore};

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[actix_web::get("/")]
async fn index(_req: HttpRequest) -> impl Responder {
    "API is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(log::LevelFilter::Info);
    logging::init(log_level).expect("Failed to initialize logging");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "vitrola.db".to_string());
    let pool = db::build_pool(&database_url).expect("Failed to create DB pool");
    pool.get()
        .expect("Failed to get DB connection")
        .run_pending_migrations(db::MIGRATIONS)
        .expect("Failed to run migrations");

    let songs_dir = std::env::var("SONGS_DIR").unwrap_or_else(|_| "songs".to_string());
    let store = BlobStore::new(songs_dir.as_str())?;

    // Reclaims staged uploads left behind by aborted requests.
    {
        let store = store.clone();
        actix_web::rt::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                match store.sweep_stale(SWEEP_INTERVAL).await {
                    Ok(0) => {}
                    Ok(removed) => log::info!("swept {removed} stale staged upload(s)"),
                    Err(err) => log::warn!("stale upload sweep failed: {err}"),
                }
            }
        });
    }

    log::info!("Starting server on port {port}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(store.clone()))
            .wrap(middleware::Logger::default())
            .service(index)
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
