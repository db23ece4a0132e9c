use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    admin, applications, auth, entry_types, health_check, payments, purchases, tickets, venues,
};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let cors = create_cors_layer(state.config.cors_allowed_origins.as_deref());
    let security_headers = create_security_headers_layer(state.config.production);

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/plans", get(venues::list_plans))
        .route("/venues", get(venues::list_venues))
        .route("/venues/available", get(venues::list_available))
        .route("/venues/:id", get(venues::get_venue))
        .route("/venues/:id/availability", get(venues::get_availability))
        .route("/venues/:id/available-dates", get(venues::get_available_dates))
        .route(
            "/venues/:id/entry-types",
            get(entry_types::list).post(entry_types::create),
        )
        .route("/venues/:id/photos", post(venues::add_photo))
        .route("/venues/:id/plan", put(venues::change_plan))
        .route("/venues/:id/subscription", put(venues::set_subscription))
        .route("/venues/:id/scan-stats", get(venues::scan_stats))
        .route("/venues/:id/staff", post(auth::create_staff))
        .route("/venues/:id/ratings", get(venues::list_ratings))
        .route(
            "/entry-types/:id",
            put(entry_types::update).delete(entry_types::deactivate),
        )
        .route("/purchases", post(purchases::create_purchase))
        .route("/purchases/:id", get(purchases::get_purchase))
        .route("/purchases/:id/cancel", post(purchases::cancel_purchase))
        .route("/purchases/:id/rating", post(purchases::rate_purchase))
        .route(
            "/venue-applications",
            get(applications::list_mine).post(applications::submit),
        )
        .route("/payments/webhook", post(payments::webhook))
        .route("/tickets/validate", post(tickets::validate))
        .route("/tickets/search", get(tickets::search))
        .route("/admin/distributions/summary", get(admin::distribution_summary))
        .route("/admin/distributions/backfill", post(admin::backfill_distributions))
        .route(
            "/admin/distributions/:id/recalculate",
            post(admin::recalculate_distribution),
        )
        .route("/admin/distributions/:id/payout", post(admin::payout_distribution))
        .route("/admin/distributions/:id/fail", post(admin::fail_distribution))
        .route("/admin/purchases/expire", post(admin::expire_purchases))
        .route("/admin/venue-applications", get(applications::list))
        .route(
            "/admin/venue-applications/:id/approve",
            post(applications::approve),
        )
        .route("/admin/venue-applications/:id/reject", post(applications::reject))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .layer(cors)
}
