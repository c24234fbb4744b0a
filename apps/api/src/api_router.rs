use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use hearth_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

use cors::build_cors_layer;

pub fn build_router<Store>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<Store>,
) -> Result<Router, AppError>
where
    Store: SessionStore + Clone,
{
    let protected_routes = Router::new()
        .route(
            "/api/finances/bills",
            get(handlers::bills::list_bills_handler).post(handlers::bills::create_bill_handler),
        )
        .route(
            "/api/finances/bills/{bill_id}",
            get(handlers::bills::get_bill_handler)
                .patch(handlers::bills::update_bill_handler)
                .delete(handlers::bills::delete_bill_handler),
        )
        .route(
            "/api/resources/{resource_type}/{resource_id}/credentials",
            get(handlers::credentials::get_credentials_handler)
                .patch(handlers::credentials::update_credentials_handler),
        )
        .route(
            "/api/resources/{resource_type}/{resource_id}/permissions",
            get(handlers::permissions::list_permissions_handler)
                .post(handlers::permissions::grant_permission_handler),
        )
        .route(
            "/api/resources/{resource_type}/{resource_id}/permissions/{member_id}",
            delete(handlers::permissions::revoke_permission_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
