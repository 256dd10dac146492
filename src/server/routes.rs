use axum::{
    body::Bytes,
    extract::State,
    Json,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use crate::server::AppState;
use crate::storage::{SqliteStore, SurveyStats};
use crate::survey::{server_timestamp, SubmitAck, SurveyRecord, SurveySubmission};
use crate::{Error, ErrorKind};
use std::sync::Arc;

const ADMIN_PAGE: &str = include_str!("admin.html");

/// Errors surfaced to HTTP callers. Bodies are fixed plain-text messages;
/// the underlying cause is only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    InvalidBody,
    Unavailable,
    SaveFailed,
    FetchFailed,
    StatsFailed,
    ExportFailed,
}

impl ApiError {
    /// Map a storage error onto `Unavailable` or the operation-specific failure
    pub fn from_storage(err: &Error, operation_failed: ApiError) -> Self {
        match err.kind() {
            ErrorKind::StorageUnavailable => ApiError::Unavailable,
            _ => operation_failed,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::InvalidBody => "Invalid request body",
            ApiError::Unavailable => "Database error",
            ApiError::SaveFailed => "Failed to save response",
            ApiError::FetchFailed => "Failed to fetch responses",
            ApiError::StatsFailed => "Failed to compute statistics",
            ApiError::ExportFailed => "Failed to export responses",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

fn storage_failure(context: &str, err: Error, operation_failed: ApiError) -> ApiError {
    tracing::error!("{}: {} ({:?})", context, err, err.kind());
    ApiError::from_storage(&err, operation_failed)
}

/// Store calls block on SQLite and the connection lock; run them on the blocking pool.
async fn with_store<T, F>(
    state: &Arc<AppState>,
    context: &'static str,
    operation_failed: ApiError,
    op: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SqliteStore) -> crate::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    match tokio::task::spawn_blocking(move || op(&state.store)).await {
        Ok(result) => result.map_err(|e| storage_failure(context, e, operation_failed)),
        Err(e) => {
            tracing::error!("{}: storage task failed: {}", context, e);
            Err(operation_failed)
        }
    }
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SubmitAck>, ApiError> {
    let submission: SurveySubmission = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!("Rejected survey body: {}", e);
        ApiError::InvalidBody
    })?;

    let row = submission.into_row(server_timestamp());
    let id = with_store(&state, "Failed to save survey response", ApiError::SaveFailed, move |store| {
        store.insert(&row)
    })
    .await?;

    tracing::info!("Survey response saved with id {}", id);
    Ok(Json(SubmitAck::saved()))
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SurveyRecord>>, ApiError> {
    let listing = with_store(&state, "Failed to fetch survey responses", ApiError::FetchFailed, |store| {
        store.list_all()
    })
    .await?;

    if listing.skipped > 0 {
        tracing::warn!("Listing omitted {} undecodable rows", listing.skipped);
    }

    Ok(Json(listing.rows.into_iter().map(SurveyRecord::from).collect()))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<SurveyStats>, ApiError> {
    let stats = with_store(&state, "Failed to compute survey statistics", ApiError::StatsFailed, |store| {
        store.stats()
    })
    .await?;

    Ok(Json(stats))
}

pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let (rows, csv) = with_store(&state, "Failed to export survey responses", ApiError::ExportFailed, |store| {
        let mut csv = Vec::new();
        let rows = store.export_csv(&mut csv)?;
        Ok((rows, csv))
    })
    .await?;

    let filename = format!(
        "survey_responses_{}.csv",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    tracing::info!("Exported {} survey responses as {}", rows, filename);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={}", filename)),
        ],
        csv,
    )
        .into_response())
}

/// Read-only dashboard over the stats, listing and export endpoints
pub async fn admin() -> Html<&'static str> {
    Html(ADMIN_PAGE)
}
