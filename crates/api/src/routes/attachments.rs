//! Attachment routes.
//!
//! Names arrive as repeated `file` query parameters, e.g.
//! `?file=a.txt&file=b.txt`.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    routing::{delete, get, patch, put},
};
use axum_extra::extract::{Query, QueryRejection};
use coffer_core::attachment::{AttachmentMetadata, SignedDownload, UploadInput};
use coffer_core::owner::PublicProfile;
use coffer_shared::AppError;
use serde::Deserialize;
use tracing::info;

use crate::{AppState, error::ApiError, error::ApiResult};

/// Multipart field holding the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(list_files))
        .route("/users/{user_id}/upload", put(upload_file))
        .route("/users/{user_id}/file-update", patch(update_description))
        .route("/users/{user_id}/download", get(download_file))
        .route("/users/{user_id}/file", delete(delete_files))
        .route("/admin/users/{user_id}/download", get(download_file))
        .route("/admin/users/{user_id}/file", delete(delete_files))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// File names selected by the query string.
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    /// Every `file` parameter, in order.
    #[serde(default)]
    pub file: Vec<String>,
}

/// Request body for updating descriptions.
#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    /// New description.
    pub description: String,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract the requested names, rejecting a missing key or an empty value.
fn requested_names(
    user_id: &str,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> ApiResult<Vec<String>> {
    let Query(query) = query.map_err(|e| {
        ApiError::bad_request(format!("Invalid query string: {e}"), "Check the file parameters")
    })?;

    if query.file.is_empty() {
        return Err(ApiError::bad_request(
            format!("Expected file key in query for user {user_id}"),
            "Add ?file=<name> to the request",
        ));
    }
    if query.file.iter().any(String::is_empty) {
        return Err(ApiError::bad_request(
            format!("Expected file name in query for user {user_id}"),
            "Every file parameter needs a name",
        ));
    }
    Ok(query.file)
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            AppError::PayloadTooLarge(err.body_text()),
            vec!["File size should be less than 10 MB".to_string()],
        )
    } else {
        ApiError::bad_request(
            format!("Failed to read form data: {}", err.body_text()),
            "Send the file as multipart/form-data",
        )
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/files`
/// Attachment mappings of every owner, in list order.
async fn list_files(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BTreeMap<String, AttachmentMetadata>>>> {
    let files = state
        .records
        .list(None)
        .await?
        .into_iter()
        .map(|owner| owner.attachments)
        .collect();
    Ok(Json(files))
}

/// PUT `/users/{user_id}/upload`
/// Store the multipart `file` field as an attachment.
async fn upload_file(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PublicProfile>> {
    let mut multipart = multipart.map_err(|e| {
        ApiError::bad_request(
            format!("Expected multipart form data: {e}"),
            "Send the file as multipart/form-data",
        )
    })?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(&e))? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            return Err(ApiError::bad_request(
                "The file field has no file name",
                "Provide a file name in the form data",
            ));
        };
        let content = field.bytes().await.map_err(|e| multipart_error(&e))?;
        upload = Some((file_name, content));
        break;
    }

    let Some((proposed_name, content)) = upload else {
        return Err(ApiError::bad_request(
            format!("Failed to get form data from key {FILE_FIELD}"),
            "Send the file under the form key \"file\"",
        ));
    };

    let size = content.len() as u64;
    let owner = state
        .attachments
        .upload(UploadInput {
            owner_id: user_id.clone(),
            proposed_name,
            size,
            content,
        })
        .await?;

    info!(user_id = %user_id, size, "File uploaded");
    Ok(Json(owner.public_view()))
}

/// PATCH `/users/{user_id}/file-update?file=..`
/// Set the description of the named attachments.
async fn update_description(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<FileQuery>, QueryRejection>,
    payload: Result<Json<UpdateDescriptionRequest>, JsonRejection>,
) -> ApiResult<Json<PublicProfile>> {
    let names = requested_names(&user_id, query)?;
    let Json(payload) = payload.map_err(|e| {
        ApiError::bad_request(
            format!("Invalid request body: {e}"),
            "Check file description update request body",
        )
    })?;

    let owner = state
        .attachments
        .update_description(&user_id, &names, &payload.description)
        .await?;
    Ok(Json(owner.public_view()))
}

/// GET `/users/{user_id}/download?file=..`
/// Signed download link for the first named attachment.
async fn download_file(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> ApiResult<Json<SignedDownload>> {
    let names = requested_names(&user_id, query)?;
    let link = state.attachments.download(&user_id, &names[0]).await?;
    Ok(Json(link))
}

/// DELETE `/users/{user_id}/file?file=..&file=..`
/// Delete the named attachments in order, stopping at the first failure.
async fn delete_files(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<FileQuery>, QueryRejection>,
) -> ApiResult<Json<PublicProfile>> {
    let names = requested_names(&user_id, query)?;
    let owner = state.attachments.delete(&user_id, &names).await?;
    Ok(Json(owner.public_view()))
}
