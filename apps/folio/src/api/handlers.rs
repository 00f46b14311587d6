//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    error::ApiError,
    types::{AcceptHeader, HealthResponse, TagQuery, TagRequest},
};
use crate::sources::{RequestedSources, load_tags, select_tag_sources};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use folio_core::{TagSet, render, storage::validate_classmark};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// TAGS HANDLER
// =============================================================================

/// Aggregated tags of one document.
pub async fn tags_handler(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(query): Query<TagQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let accept = AcceptHeader::from_header(headers.get(header::ACCEPT));

    send_tag_response(&state, TagRequest::from_segment(&segment, query, accept)).await
}

/// Select, load, negotiate and render one tag request.
///
/// The `Content-Type` is exactly the chosen format's media type.
pub async fn send_tag_response(state: &AppState, request: TagRequest) -> Result<Response, ApiError> {
    validate_classmark(&request.classmark)?;

    let requested = RequestedSources::from(request.sources.as_deref());
    let sources = select_tag_sources(&state.registry, requested)?;
    let item = load_tags(&sources, &request.classmark).await?;

    let format = request.format();
    let body = render(&item, format)?;

    tracing::info!(
        classmark = %request.classmark,
        format = %format,
        tags = item.tags.len(),
        "Served tags"
    );

    Ok(([(header::CONTENT_TYPE, format.media_type())], body).into_response())
}
