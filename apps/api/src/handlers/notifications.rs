use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use rentfold_core::UserIdentity;

use crate::dto::{NotificationQuery, NotificationResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_notifications_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let notifications = state
        .notification_service
        .list_for_actor(&identity, query.limit)
        .await?;

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from_notification)
            .collect(),
    ))
}

pub async fn mark_notification_read_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(notification_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .notification_service
        .mark_read(&identity, notification_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
