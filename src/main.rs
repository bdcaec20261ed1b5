use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use paylinkr_be::database::repositories::{
    EmployeeRepository, PaymentRepository, SessionRepository,
};
use paylinkr_be::middleware::RequestIdMiddleware;
use paylinkr_be::services::HttpProviderClient;
use paylinkr_be::{database, handlers, AppState, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    println!("🚀 Starting PayLinkr backend");
    println!("📊 Environment: {}", config.environment);
    println!("🌐 Server will bind to: {}", config.server_address());

    let pool = database::init_database(&config.database_url)
        .await
        .expect("Failed to initialize database");

    let provider =
        Arc::new(HttpProviderClient::new(&config).expect("Failed to build provider client"));
    let state = AppState::build(pool.clone(), provider, &config);

    let server_address = config.server_address();

    println!("✅ PayLinkr backend ready at http://{}", server_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(cors)
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(SessionRepository::new(pool.clone())))
            .app_data(web::Data::new(EmployeeRepository::new(pool.clone())))
            .app_data(web::Data::new(PaymentRepository::new(pool.clone())))
            .configure(handlers::configure)
    })
    .bind(server_address)?
    .run()
    .await
}
