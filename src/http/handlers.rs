//! Route handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::http::error::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::scoring::{rescore_all, rescore_one, RescoreSummary, Rescored};
use crate::store::{Company, CompanyUpdate, ListParams, ListQuery};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /companies`: search, order and page through companies.
pub async fn list_companies(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Company>>> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let query = ListQuery::try_from(params).map_err(ApiError::Validation)?;

    let companies = state.store.list_companies(&query).await?;
    Ok(Json(companies))
}

/// `POST /score/{company_id}`: rescore one company.
pub async fn score_one(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
) -> ApiResult<Json<Rescored>> {
    let rescored = rescore_one(&state.store, &state.scorer, &company_id).await?;
    Ok(Json(rescored))
}

/// `POST /score/cron`: rescore every company.
///
/// The job runs on its own task: if the request times out, the client gets
/// the timeout but the run still completes.
pub async fn score_all(State(state): State<AppState>) -> ApiResult<Json<RescoreSummary>> {
    let batch_size = state.rescore.batch_size;
    tracing::info!(batch_size, "Bulk rescoring requested");

    let job = tokio::spawn(async move {
        rescore_all(&state.store, &state.scorer, batch_size).await
    });

    let summary = job
        .await
        .map_err(|e| ApiError::Internal(format!("rescoring task failed: {}", e)))??;
    Ok(Json(summary))
}

/// `PATCH /companies/{company_id}`: update arbitrary fields.
pub async fn update_company_fields(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    payload: Result<Json<CompanyUpdate>, JsonRejection>,
) -> ApiResult<Json<Company>> {
    let Json(update) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields provided for update".to_string()));
    }
    update.validate().map_err(ApiError::Validation)?;

    let updated = state.store.update_fields(&company_id, &update).await?;
    Ok(Json(updated))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}
