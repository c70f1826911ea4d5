use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use coursehub::auth::AuthMiddleware;
use coursehub::config::Config;
use coursehub::routes::{self, health};
use coursehub::services::notify::LogNotifier;
use coursehub::services::payment::RazorpayGateway;
use coursehub::store::PgStore;
use coursehub::AppState;

fn cors(origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600);
    match origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store = PgStore::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    store.migrate().await.expect("Failed to run migrations");

    let gateway = RazorpayGateway::new(
        &config.razorpay_api_base,
        &config.razorpay_key,
        &config.razorpay_secret,
    );
    let state = web::Data::new(AppState::from_config(
        &config,
        Arc::new(store),
        Arc::new(LogNotifier),
        Arc::new(gateway),
    ));

    log::info!("Starting CourseHub server at {}", config.server_url());
    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
