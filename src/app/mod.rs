use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{
    HttpResponse, web::{self, Data},
    middleware, App, HttpServer, Result
};
use std::time;

use crate::shared::util::auth::TokenSecret;
use crate::shared::util::{config, secret};

use crate::shared::handlers::postgres_handler::PostgresHandler as SharedPostgresHandler;
use crate::market::handlers::postgres_handler::PostgresHandler as MarketPostgresHandler;
use crate::files::image_host::ImageHostClient;

use crate::shared::app as shared_app;
use crate::market::app as market_app;
use crate::files::app as files_app;

use crate::shared::types::app as app_types;


async fn not_found() -> Result<HttpResponse> {
    let response = app_types::ErrorResponse::err("Resource not found");
    Ok(HttpResponse::NotFound().json(response))
}

fn routes(app: &mut web::ServiceConfig) {
    app
        // Auth + user handling
        .service(shared_app::signup)
        .service(shared_app::login)
        .service(shared_app::logout)
        .service(shared_app::me)
        .service(shared_app::update_me)
        // Search registers before the {id} route so it matches first
        .service(shared_app::users_search)
        .service(shared_app::get_user)
        .service(shared_app::change_role)
        .service(shared_app::change_status)
        .service(shared_app::delete_user)

        // Marketplace
        .service(market_app::create_post)
        .service(market_app::update_post)
        .service(market_app::delete_post)
        .service(market_app::approve_post)
        .service(market_app::get_posts)
        .service(market_app::get_post)
        .service(market_app::purchase_post)
        .service(market_app::get_purchases)
        .service(market_app::add_favorites)
        .service(market_app::remove_favorites)
        .service(market_app::get_favorites)
        .service(market_app::rate_post)
        .service(market_app::create_comment)
        .service(market_app::get_comments)
        .service(market_app::delete_comment)

        // Files
        .service(files_app::create_file);
}

pub async fn start() -> std::io::Result<()> {
    if config::get_config().server.log {
        std::env::set_var("RUST_LOG", "debug");
        env_logger::init();
    }

    let token_secret = TokenSecret(secret::get_token_secret()?);

    let handler1 = SharedPostgresHandler::new().await.unwrap();
    let handler2 = MarketPostgresHandler::new().await.unwrap();

    handler1.init().await.unwrap();
    handler2.init().await.unwrap();

    let image_host = ImageHostClient::new();

    println!("starting HTTP server at http://localhost:{}", config::get_config().server.port);

    HttpServer::new(move || {
        let governor_conf = GovernorConfigBuilder::default()
            .per_millisecond(config::get_config().server.request_quota_replenish_ms)
            .burst_size(config::get_config().server.request_quota)
            .finish().unwrap();

        App::new()
            .app_data(Data::new(handler1.clone()))
            .app_data(Data::new(handler2.clone()))
            .app_data(Data::new(image_host.clone()))
            .app_data(Data::new(token_secret.clone()))
            .configure(routes)
            .wrap(Governor::new(&governor_conf))
            .wrap(Cors::permissive())
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::Logger::default())
            .default_service(web::route().to(not_found))
    })
        .keep_alive(time::Duration::from_secs(30))
        .bind(("127.0.0.1", config::get_config().server.port))?
        .run().await
}
