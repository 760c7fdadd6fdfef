use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rentfold_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::{BootstrapRequest, LoginRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Session key holding the authenticated identity.
pub const SESSION_USER_KEY: &str = "user_identity";

/// Creates the first admin account and signs it in.
///
/// Guarded by the shared bootstrap token and closed once any account exists.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<(StatusCode, Json<UserIdentityResponse>)> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let identity = state
        .user_service
        .bootstrap_admin(&payload.email, &payload.display_name, &payload.password)
        .await?;

    establish_session(&session, &identity).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserIdentityResponse::from_identity(&identity)),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = state
        .user_service
        .login(&payload.email, &payload.password)
        .await?;

    establish_session(&session, &identity).await?;

    Ok(Json(UserIdentityResponse::from_identity(&identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the caller's identity, re-read from storage so revoked accounts
/// drop out even with a live session cookie.
pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let identity = state.user_service.find_identity(identity.subject()).await?;

    Ok(Json(UserIdentityResponse::from_identity(&identity)))
}

async fn establish_session(session: &Session, identity: &UserIdentity) -> ApiResult<()> {
    // Session id regeneration on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(())
}
