//! Administrator endpoints, plus the internal chef-assignment hook.

use crate::{
    api::{
        extractors::{AdminUser, InternalCaller},
        state::AppState,
    },
    config::catalog::{CourseConfig, ProductConfig, ServiceConfig},
    core::{
        applications, assignment,
        booking::{self, BookingUpdate},
        catalog, courses, identity, inquiries, notifications, orders,
        report::{self, AdminDashboard},
    },
    entities::{
        ApplicationStatus, InquiryStatus, OrderStatus, Role, booking as booking_entity,
        chef_application, course, inquiry, order, product, service, user,
    },
    errors::Result,
    tasks::BackgroundTask,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ApplicationReview {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub struct InquiryStatusUpdate {
    pub status: InquiryStatus,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub success: bool,
    pub assigned_chef_id: i64,
    pub booking: booking_entity::Model,
}

pub async fn list_bookings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<booking_entity::Model>>> {
    Ok(Json(booking::list_all_bookings(&state.db).await?))
}

pub async fn update_booking(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(booking_id): Path<i64>,
    Json(update): Json<BookingUpdate>,
) -> Result<Json<booking_entity::Model>> {
    Ok(Json(
        booking::update_booking(&state.db, &admin, booking_id, update).await?,
    ))
}

/// Runs chef selection synchronously and notifies the client.
pub async fn assign_chef(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Path(booking_id): Path<i64>,
) -> Result<Json<AssignmentResponse>> {
    let assigned =
        assignment::assign_chef(&state.db, state.generator.as_ref(), booking_id).await?;
    state.tasks.dispatch(BackgroundTask::SendEmail(notifications::chef_assigned(
        &assigned.client,
        &assigned.chef,
        &assigned.booking,
    )));
    Ok(Json(AssignmentResponse {
        success: true,
        assigned_chef_id: assigned.chef.id,
        booking: assigned.booking,
    }))
}

pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<chef_application::Model>>> {
    Ok(Json(applications::list_applications(&state.db).await?))
}

pub async fn review_application(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(application_id): Path<i64>,
    Json(review): Json<ApplicationReview>,
) -> Result<Json<chef_application::Model>> {
    Ok(Json(
        applications::review_application(&state.db, &state.tasks, application_id, review.status)
            .await?,
    ))
}

pub async fn list_inquiries(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<inquiry::Model>>> {
    Ok(Json(inquiries::list_inquiries(&state.db).await?))
}

pub async fn update_inquiry(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(inquiry_id): Path<i64>,
    Json(update): Json<InquiryStatusUpdate>,
) -> Result<Json<inquiry::Model>> {
    Ok(Json(
        inquiries::update_inquiry_status(&state.db, inquiry_id, update.status).await?,
    ))
}

pub async fn list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<order::Model>>> {
    Ok(Json(orders::list_all_orders(&state.db).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(order_id): Path<i64>,
    Json(update): Json<OrderStatusUpdate>,
) -> Result<Json<order::Model>> {
    Ok(Json(
        orders::update_order_status(&state.db, order_id, update.status).await?,
    ))
}

pub async fn create_service(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<ServiceConfig>,
) -> Result<(StatusCode, Json<service::Model>)> {
    let created = catalog::create_service(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn create_product(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<ProductConfig>,
) -> Result<(StatusCode, Json<product::Model>)> {
    let created = catalog::create_product(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn create_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<CourseConfig>,
) -> Result<(StatusCode, Json<course::Model>)> {
    let created = courses::create_course(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(course_id): Path<i64>,
    Json(input): Json<CourseConfig>,
) -> Result<Json<course::Model>> {
    Ok(Json(courses::update_course(&state.db, course_id, &input).await?))
}

pub async fn delete_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(course_id): Path<i64>,
) -> Result<StatusCode> {
    courses::delete_course(&state.db, course_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_user_role(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
    Json(update): Json<RoleUpdate>,
) -> Result<Json<user::Model>> {
    Ok(Json(identity::set_user_role(&state.db, user_id, update.role).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AdminDashboard>> {
    Ok(Json(report::generate_admin_dashboard(&state.db).await?))
}
