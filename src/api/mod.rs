mod admin;
pub mod auth;
pub mod error;
mod orders;
mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/reset-password", post(auth::reset_password))
        .route(
            "/reset-password/confirm",
            post(auth::confirm_reset_password),
        );

    let order_routes = Router::new()
        .route("/crear-pedidos", post(orders::create_orders))
        .route("/procesar-sap", post(orders::process_erp))
        .route(
            "/listar-pedidos/:usuario_id",
            get(orders::list_orders_for_user),
        )
        .route("/ver-detalle/:id", get(orders::order_detail))
        .route("/actualizar-cantidades/:id", put(orders::update_quantities))
        .route("/eliminar/:id", delete(orders::delete_order));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:user_id", delete(admin::delete_user))
        .route("/clientes", get(admin::list_all_clients))
        .route(
            "/users/:user_id/clientes",
            post(admin::associate_clients).get(admin::list_clients_for_user),
        )
        .route("/users/:user_id/historial", get(admin::user_history))
        .route(
            "/users/:user_id/sugerencias-grupo",
            get(admin::group_suggestions),
        );

    // Only the SPA origin may call the API with credentials.
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors
                .frontend_origin
                .parse::<HeaderValue>()
                .expect("Invalid frontend origin"),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .nest("/pedidos", order_routes)
        .nest("/admin", admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
