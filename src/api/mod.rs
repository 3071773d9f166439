//! API routes for bookstore-server

pub mod admin;
pub mod books;
pub mod health;
pub mod users;

use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, require_admin};
use crate::state::AppState;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Catalog browsing and account creation (no auth)
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/books", get(books::list_books))
        .route("/api/books/search", get(books::search_books))
        .route("/api/books/{isbn}", get(books::get_book))
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login));

    // Customer routes (JWT authenticated)
    let customer = Router::new()
        .route("/api/users/me", get(users::me))
        .route("/api/users/me/orders", get(users::my_orders))
        .route("/api/books/orders", post(books::order_books))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Admin routes (JWT authenticated + Admin role)
    let admin = Router::new()
        .route(
            "/api/admin/books",
            get(admin::list_all_books).post(admin::add_book),
        )
        .route(
            "/api/admin/books/{isbn}",
            get(admin::get_book)
                .put(admin::update_book)
                .delete(admin::remove_book),
        )
        .route("/api/admin/publishers", get(admin::list_publishers))
        .route(
            "/api/admin/publisher-orders",
            get(admin::list_publisher_orders),
        )
        .route(
            "/api/admin/publisher-orders/{order_id}/confirm",
            put(admin::confirm_publisher_order),
        )
        .route(
            "/api/admin/customer-orders",
            get(admin::list_customer_orders),
        )
        .route(
            "/api/admin/reports/sales/previous-month",
            get(admin::sales_previous_month),
        )
        .route("/api/admin/reports/sales/by-date", get(admin::sales_by_date))
        .route("/api/admin/reports/top-customers", get(admin::top_customers))
        .route("/api/admin/reports/top-books", get(admin::top_books))
        .route(
            "/api/admin/reports/replenishment-history/{isbn}",
            get(admin::replenishment_history),
        )
        // Inner layer runs after the outer auth layer has inserted AuthUser.
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(admin)
        .nest_service("/images", ServeDir::new(&state.image_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
