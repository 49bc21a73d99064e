//! This module holds the server definition

use std::net::SocketAddr;

use actix_toolbox::tb_middleware::{
    setup_logging_mw, DBSessionStore, LoggingMiddlewareConfig, PersistentSession,
    SessionMiddleware,
};
use actix_web::cookie::time::Duration;
use actix_web::cookie::Key;
use actix_web::middleware::Compress;
use actix_web::web::{scope, Data, JsonConfig, PathConfig, PayloadConfig, QueryConfig};
use actix_web::{App, HttpServer};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use log::info;
use rorm::Database;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::graph::{DbStore, RelationshipGraph};
use crate::server::error::StartServerError;
use crate::server::handler::{
    accept_friend_request, block_account, get_friend_request, get_friends,
    get_incoming_requests, get_me, get_sent_requests, login, logout, register_account,
    reject_friend_request, send_friend_request,
};
use crate::server::middleware::{
    json_extractor_error, path_extractor_error, query_extractor_error, AuthenticationRequired,
};
use crate::server::swagger::ApiDoc;

pub mod error;
pub mod handler;
pub mod middleware;
pub mod swagger;

/// The relationship graph as it is shared between the handlers
pub type Graph = RelationshipGraph<DbStore>;

/// Start the friendgraph server
///
/// **Parameter**:
/// - `config`: Reference to a [Config] struct
/// - `db`: [Database]
pub async fn start_server(config: &Config, db: Database) -> Result<(), StartServerError> {
    let key = Key::try_from(
        BASE64_STANDARD
            .decode(&config.server.secret_key)
            .map_err(|_| StartServerError::InvalidSecretKey)?
            .as_slice(),
    )
    .map_err(|_| StartServerError::InvalidSecretKey)?;

    let graph: Data<Graph> = Data::new(RelationshipGraph::new(
        DbStore::new(db.clone()),
        config.relationships.page_limits(),
    ));

    let s_addr = SocketAddr::new(config.server.listen_address, config.server.listen_port);

    info!("Starting to listen on {}", s_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(PayloadConfig::default())
            .app_data(JsonConfig::default().error_handler(json_extractor_error))
            .app_data(QueryConfig::default().error_handler(query_extractor_error))
            .app_data(PathConfig::default().error_handler(path_extractor_error))
            .app_data(Data::new(db.clone()))
            .app_data(graph.clone())
            .wrap(setup_logging_mw(LoggingMiddlewareConfig::default()))
            .wrap(
                SessionMiddleware::builder(DBSessionStore::new(db.clone()), key.clone())
                    .session_lifecycle(PersistentSession::session_ttl(
                        PersistentSession::default(),
                        Duration::hours(1),
                    ))
                    .build(),
            )
            .wrap(Compress::default())
            .service(SwaggerUi::new("/docs/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()))
            .service(register_account)
            .service(scope("/api/v1/auth").service(login).service(logout))
            .service(
                scope("/api/v1")
                    .wrap(AuthenticationRequired)
                    .service(get_me)
                    .service(send_friend_request)
                    .service(get_incoming_requests)
                    .service(get_sent_requests)
                    .service(get_friend_request)
                    .service(accept_friend_request)
                    .service(reject_friend_request)
                    .service(block_account)
                    .service(get_friends),
            )
    })
    .bind(s_addr)?
    .run()
    .await?;

    Ok(())
}
