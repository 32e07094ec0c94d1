//! HTTP surface.
//!
//! Handlers are thin: they extract the caller and the request body, call into
//! `core`, and let [`crate::errors::Error`] render the failure.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post, put},
};
use handlers::{
    admin, auth, bookings, catalog, chef, chefs, courses, orders, partners, payments, uploads,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Builds the application router over the given state.
///
/// Uploaded files are served back from `/uploads`.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    let public = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/login", post(auth::log_in))
        .route("/auth/me", get(auth::me))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/services", get(catalog::list_services))
        .route("/products", get(catalog::list_products))
        .route("/products/:id", get(catalog::get_product))
        .route("/chefs", get(chefs::list_chefs))
        .route("/chefs/:id", get(chefs::get_chef))
        .route("/courses", get(courses::list_courses))
        .route("/courses/:id", get(courses::get_course))
        .route("/paystack-webhook", post(payments::paystack_webhook))
        .route("/partner-inquiry", post(partners::submit_inquiry));

    let client = Router::new()
        .route("/auth/change-password", post(auth::change_password))
        .route(
            "/bookings",
            post(bookings::create_booking).get(bookings::list_my_bookings),
        )
        .route("/booking/retry-payment", post(bookings::retry_payment))
        .route("/booking/verify-payment", get(bookings::verify_payment))
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::list_my_orders))
        .route("/orders/:id", get(orders::get_order))
        .route(
            "/chef/application",
            post(chef::submit_application).get(chef::my_application),
        )
        .route("/chef/bookings", get(chef::my_bookings))
        .route("/chef/bookings/:id", put(chef::update_booking))
        .route(
            "/chef/portfolio",
            post(chef::upload_portfolio_image).put(chef::set_portfolio),
        )
        .route(
            "/learning/progress",
            get(courses::my_progress).post(courses::record_progress),
        )
        .route("/partner/referrals", get(partners::referrals))
        .route("/upload", post(uploads::upload));

    let admin = Router::new()
        .route("/admin/bookings", get(admin::list_bookings))
        .route("/admin/bookings/:id", put(admin::update_booking))
        .route("/admin/bookings/:id/assign-chef", post(admin::assign_chef))
        .route("/admin/applications", get(admin::list_applications))
        .route("/admin/applications/:id", put(admin::review_application))
        .route("/admin/inquiries", get(admin::list_inquiries))
        .route("/admin/inquiries/:id", put(admin::update_inquiry))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/orders/:id", put(admin::update_order))
        .route("/admin/services", post(admin::create_service))
        .route("/admin/products", post(admin::create_product))
        .route("/admin/courses", post(admin::create_course))
        .route(
            "/admin/courses/:id",
            put(admin::update_course).delete(admin::delete_course),
        )
        .route("/admin/users/:id/role", put(admin::set_user_role))
        .route("/admin/dashboard", get(admin::dashboard));

    public
        .merge(client)
        .merge(admin)
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
