//! Accounting webhook from the network infrastructure.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use tracing::error;

use crate::provision::{models::AccountingEvent, service};

#[utoipa::path(
    post,
    path = "/api/radius/accounting",
    request_body = AccountingEvent,
    responses(
        (status = 204, description = "Accounting record applied or acknowledged"),
        (status = 400, description = "Missing payload"),
        (status = 500, description = "Accounting update failed")
    ),
    tag = "infrastructure"
)]
pub async fn accounting(
    pool: Extension<PgPool>,
    payload: Option<Json<AccountingEvent>>,
) -> impl IntoResponse {
    let Some(Json(event)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    match service::record_accounting(&pool, &event).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Accounting update failed: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Accounting update failed").into_response()
        }
    }
}
