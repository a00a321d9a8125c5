use crate::errors::PaymentEngineError;
use crate::metrics;
use crate::models::{CreatePaymentRequest, PaymentListQuery, UpdateStatusRequest};
use crate::security::{AuthenticatedUser, Requester};
use crate::services::PaymentService;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "payment-engine",
        "version": "1.0.0"
    }))
}

/// Record a payment attempt (owner = requester)
pub async fn create_payment(
    service: web::Data<Arc<PaymentService>>,
    user: AuthenticatedUser,
    request: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, PaymentEngineError> {
    let payment = service.create_payment(&user, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(payment))
}

/// List payments visible to the requester
pub async fn list_payments(
    service: web::Data<Arc<PaymentService>>,
    user: AuthenticatedUser,
    query: web::Query<PaymentListQuery>,
) -> Result<HttpResponse, PaymentEngineError> {
    let payments = service.list_payments(&user, query.status).await?;
    Ok(HttpResponse::Ok().json(json!({
        "total": payments.len(),
        "payments": payments
    })))
}

/// Get one payment by ID
pub async fn get_payment(
    service: web::Data<Arc<PaymentService>>,
    user: AuthenticatedUser,
    payment_id: web::Path<Uuid>,
) -> Result<HttpResponse, PaymentEngineError> {
    let payment = service.get_payment(&user, *payment_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

/// Payment-method callback / admin status update
pub async fn update_payment_status(
    service: web::Data<Arc<PaymentService>>,
    user: AuthenticatedUser,
    payment_id: web::Path<Uuid>,
    request: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, PaymentEngineError> {
    let payment = service
        .update_status(&user, *payment_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(payment))
}

/// Daily revenue statistics, newest first
pub async fn list_analytics(
    service: web::Data<Arc<PaymentService>>,
    requester: Requester,
) -> Result<HttpResponse, PaymentEngineError> {
    service.require_user(&requester)?;
    let stats = service.list_stats().await?;
    Ok(HttpResponse::Ok().json(json!({
        "total": stats.len(),
        "stats": stats
    })))
}

/// One day of statistics
pub async fn get_analytics_by_date(
    service: web::Data<Arc<PaymentService>>,
    requester: Requester,
    date: web::Path<NaiveDate>,
) -> Result<HttpResponse, PaymentEngineError> {
    service.require_user(&requester)?;
    let stat = service.get_stat(*date).await?;
    Ok(HttpResponse::Ok().json(stat))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint() -> HttpResponse {
    match metrics::metrics_handler() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => HttpResponse::InternalServerError().json(json!({
            "error": "Failed to gather metrics",
            "details": e.to_string()
        })),
    }
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/payments")
            .route("", web::post().to(create_payment))
            .route("", web::get().to(list_payments))
            .route("/{id}", web::get().to(get_payment))
            .route("/{id}/status", web::post().to(update_payment_status)),
    )
    .service(
        web::scope("/api/v1/analytics")
            .route("", web::get().to(list_analytics))
            .route("/{date}", web::get().to(get_analytics_by_date)),
    )
    .route("/metrics", web::get().to(metrics_endpoint))
    .route("/health", web::get().to(health_check));
}
