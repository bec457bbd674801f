use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use log::{debug, info, warn};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    contact::{ContactRequest, ContactValidationError},
    notification::{ContactNotifier, DeliveryOutcome},
};

pub const SUCCESS_MESSAGE: &str = "Emails sent successfully to admin and user.";
pub const DELIVERY_FAILED_MESSAGE: &str = "Failed to send emails. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub notifier: Arc<ContactNotifier>,
}

pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(health))
        .route("/api/contact", post(submit_contact))
        .layer(cors)
        .with_state(state)
}

pub async fn run(
    router: Router,
    bind_address: &str,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!("Server is running on {}", bind_address);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP server shut down gracefully");
    Ok(())
}

async fn health() -> &'static str {
    "server is running "
}

#[derive(serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        // Oversized or unreadable streams keep axum's own status, e.g. 413.
        Err(JsonRejection::BytesRejection(rejection)) => {
            warn!("Failed to read contact body: {}", rejection);
            return Err(ApiError::Body(rejection.into_response()));
        }
        // A body that is not a JSON object carries no fields at all.
        Err(rejection) => {
            debug!("Unreadable contact body: {}", rejection);
            ContactRequest::default()
        }
    };

    let submission = request.into_submission().map_err(|e| {
        warn!("Rejected contact submission: {}", e);
        ApiError::Validation(e)
    })?;

    match state.notifier.notify(&submission).await {
        DeliveryOutcome::Delivered => Ok(Json(MessageResponse {
            message: SUCCESS_MESSAGE.to_string(),
        })),
        // Partial delivery is still reported as a failure to the caller.
        DeliveryOutcome::AdminFailed(e) | DeliveryOutcome::ConfirmationFailed(e) => {
            debug!("Reporting delivery failure to client: {}", e);
            Err(ApiError::Delivery)
        }
    }
}

pub enum ApiError {
    Validation(ContactValidationError),
    Delivery,
    Body(axum::response::Response),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Delivery => (
                StatusCode::INTERNAL_SERVER_ERROR,
                DELIVERY_FAILED_MESSAGE.to_string(),
            ),
            ApiError::Body(response) => return response,
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}
