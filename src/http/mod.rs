//! HTTP surface.
//!
//! A single transformation endpoint at `GET /`. The request kind is
//! decided by which of `url` and `text` are present: neither serves the
//! help page, `url` alone transforms the fetched image, both composite a
//! transparent text layer over the fetched image before transforming,
//! and `text` alone renders a standalone text canvas through the same
//! pipeline. Every processing failure maps to the same 500 JSON body.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::Config;
use crate::constants::{ERROR_MESSAGE, HELP_PAGE};
use crate::error::ServiceError;
use crate::fetch::ImageFetcher;
use crate::params::RequestParams;
use crate::pipeline::{self, PipelineOutput};
use crate::text::{self, TextStyle};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: ImageFetcher,
}

/// Build the application router.
pub fn router(config: &Config) -> Result<Router, ServiceError> {
    let state = AppState {
        fetcher: ImageFetcher::new(config.fetch_timeout)?,
    };
    Ok(Router::new()
        .route("/", get(transform))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .layer(CatchPanicLayer::custom(
            |_: Box<dyn std::any::Any + Send + 'static>| {
                error!("request handler panicked");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            },
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn transform(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let params = RequestParams::from_query(&query);
    match handle(&state, params).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "image request failed");
            error_response().into_response()
        }
    }
}

fn error_response() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": ERROR_MESSAGE })),
    )
}

async fn handle(state: &AppState, params: RequestParams) -> Result<Response, ServiceError> {
    let source = match (params.url.clone(), params.text.clone()) {
        (None, None) => return Ok(Html(HELP_PAGE).into_response()),
        (Some(url), None) => state
            .fetcher
            .fetch(&url, params.fallback_url.as_deref())
            .await?
            .to_vec(),
        (Some(url), Some(overlay_text)) => {
            let base = state
                .fetcher
                .fetch(&url, params.fallback_url.as_deref())
                .await?;
            let style = TextStyle::overlay(&params);
            run_blocking(move || {
                let layer = text::render_text(&overlay_text, &style)?;
                pipeline::composite_centered(&base, &layer)
            })
            .await?
        }
        (None, Some(canvas_text)) => {
            let style = TextStyle::standalone(&params);
            run_blocking(move || text::render_text_png(&canvas_text, &style)).await?
        }
    };

    if params.metadata_only {
        let metadata = run_blocking(move || pipeline::read_metadata(&source)).await?;
        return Ok(Json(metadata).into_response());
    }

    let output = {
        let params = params.clone();
        run_blocking(move || pipeline::run(&source, &params)).await?
    };

    if params.base64_encoding {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&output.data);
        let uri = format!("data:{};base64,{}", output.format.content_type(), encoded);
        return Ok(Json(json!({ "data": uri })).into_response());
    }

    Ok(binary_response(output, &params))
}

/// Pixel work is CPU-bound; keep it off the async worker threads.
async fn run_blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::engine_failed(format!("worker task failed: {e}")))?
}

fn binary_response(output: PipelineOutput, params: &RequestParams) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(output.format.content_type()),
    );
    let cache_control = HeaderValue::from_str(&format!("max-age={}", params.max_age))
        .unwrap_or_else(|_| HeaderValue::from_static("max-age=31536000"));
    headers.insert(header::CACHE_CONTROL, cache_control);
    if let Some(filename) = params.filename.as_deref() {
        // A filename the header cannot carry is dropped, not an error.
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    (headers, output.data).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> PipelineOutput {
        PipelineOutput {
            data: vec![1, 2, 3],
            format: crate::params::OutputFormat::Png,
        }
    }

    #[test]
    fn test_binary_response_headers() {
        let params = RequestParams {
            max_age: "60".to_string(),
            filename: Some("photo".to_string()),
            ..RequestParams::default()
        };
        let response = binary_response(output(), &params);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=60");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"photo\""
        );
    }

    #[test]
    fn test_binary_response_bad_max_age_falls_back() {
        let params = RequestParams {
            max_age: "bad\nvalue".to_string(),
            ..RequestParams::default()
        };
        let response = binary_response(output(), &params);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=31536000");
    }

    #[test]
    fn test_error_response_shape() {
        let (status, Json(body)) = error_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], ERROR_MESSAGE);
    }
}
