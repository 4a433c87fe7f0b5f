//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    chart::{
        create_account_endpoint, delete_account_endpoint, get_chart_json, get_chart_page,
        get_edit_account_page, update_account_endpoint,
    },
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    wallet::{
        create_wallet_endpoint, delete_wallet_endpoint, get_edit_wallet_page, get_wallets_page,
        set_active_wallet_endpoint, update_wallet_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::WALLETS_VIEW, get(get_wallets_page))
        .route(endpoints::EDIT_WALLET_VIEW, get(get_edit_wallet_page))
        .route(endpoints::CHART_VIEW, get(get_chart_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // The /api routes are requested by HTMX, which needs the HX-Redirect header to follow auth redirects.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::POST_WALLET, post(create_wallet_endpoint))
            .route(endpoints::ACTIVE_WALLET, post(set_active_wallet_endpoint))
            .route(
                endpoints::PUT_WALLET,
                put(update_wallet_endpoint).delete(delete_wallet_endpoint),
            )
            .route(
                endpoints::CHART_API,
                get(get_chart_json).post(create_account_endpoint),
            )
            .route(
                endpoints::PUT_ACCOUNT,
                put(update_account_endpoint).delete(delete_account_endpoint),
            )
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the chart of accounts page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::CHART_VIEW)
}
