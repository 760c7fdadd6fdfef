use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use rentfold_application::{ExecutionHistoryQuery, ExecutionStatus};
use rentfold_core::{AppError, UserIdentity};
use serde_json::Value;

use crate::dto::{
    AttemptResponse, DispatchEventRequest, DispatchEventResponse, ExecuteWorkflowRequest,
    ExecutionHistoryResponse, ExecutionResponse, HistoryQuery, SaveWorkflowRequest,
    WorkflowResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_workflows_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<WorkflowResponse>>> {
    let records = state.workflow_service.list_workflows(&identity).await?;

    Ok(Json(
        records.into_iter().map(WorkflowResponse::from_record).collect(),
    ))
}

pub async fn create_workflow_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<SaveWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<WorkflowResponse>)> {
    let record = state
        .workflow_service
        .create_workflow(&identity, payload.into_input())
        .await?;

    Ok((StatusCode::CREATED, Json(WorkflowResponse::from_record(record))))
}

pub async fn get_workflow_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(workflow_id): Path<String>,
) -> ApiResult<Json<WorkflowResponse>> {
    let record = state
        .workflow_service
        .get_workflow(&identity, workflow_id.as_str())
        .await?;

    Ok(Json(WorkflowResponse::from_record(record)))
}

/// Triggers one manual execution.
///
/// Inline mode answers 201 with the terminal execution; queued mode answers
/// 202 with the running intent record. Retry exhaustion answers a generic
/// 500; the detailed reason lives in the execution record and the logs.
pub async fn execute_workflow_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(workflow_id): Path<String>,
    Json(payload): Json<ExecuteWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<ExecutionResponse>)> {
    let trigger_payload = payload
        .trigger_payload
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let execution = state
        .workflow_service
        .execute_workflow(&identity, workflow_id.as_str(), trigger_payload)
        .await?;

    if execution.status == ExecutionStatus::Failed {
        return Err(AppError::Internal(format!(
            "workflow execution '{}' failed: {}",
            execution.execution_id,
            execution.retry_reason.as_deref().unwrap_or("unknown error")
        ))
        .into());
    }

    let status = if execution.status == ExecutionStatus::Running {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(ExecutionResponse::from_execution(execution))))
}

pub async fn dispatch_event_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<DispatchEventRequest>,
) -> ApiResult<Json<DispatchEventResponse>> {
    let event_payload = payload
        .event_payload
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    let dispatched = state
        .workflow_service
        .dispatch_event(&identity, payload.event_name.as_str(), event_payload)
        .await?;

    Ok(Json(DispatchEventResponse {
        dispatched: u64::try_from(dispatched).unwrap_or(u64::MAX),
    }))
}

pub async fn execution_history_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(workflow_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<ExecutionHistoryResponse>> {
    let page = state
        .workflow_service
        .execution_history(
            &identity,
            workflow_id.as_str(),
            ExecutionHistoryQuery::new(query.page, query.limit),
        )
        .await?;

    Ok(Json(ExecutionHistoryResponse::from_page(page)))
}

pub async fn execution_attempts_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(execution_id): Path<String>,
) -> ApiResult<Json<Vec<AttemptResponse>>> {
    let attempts = state
        .workflow_service
        .execution_attempts(&identity, execution_id.as_str())
        .await?;

    Ok(Json(
        attempts.into_iter().map(AttemptResponse::from_attempt).collect(),
    ))
}
