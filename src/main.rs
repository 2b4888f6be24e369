use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;

use home_price_backend::{handlers, logger, ArtifactStore, ServerConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = ServerConfig::parse();
    logger::init(config.verbose);

    if let Err(err) = config.validate() {
        tracing::error!("configuration validation failed: {err}");
        std::process::exit(1);
    }

    let store = web::Data::new(ArtifactStore::new(&config.artifacts_dir));
    // Eager load at startup; missing or corrupt artifacts are repaired here.
    store.load();
    tracing::info!("artifacts loaded from {}", config.artifacts_dir.display());

    let bind = (config.host.clone(), config.port);
    tracing::info!("server running at http://{}:{}", config.host, config.port);

    let config = web::Data::new(config);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(store.clone())
            .app_data(config.clone())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await
}
