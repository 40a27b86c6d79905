//! HTTP routes.
//!
//! - `GET /health`   liveness, always `200 OK`
//! - `GET /ready`    `200` once a model is loaded, `503` otherwise
//! - `POST /predict` JSON array of records in, JSON array of 0/1 labels out
//! - `POST /reload`  re-read the artifact and swap it in

use std::convert::Infallible;
use std::sync::Arc;

use titanic_core::{Dataset, TitanicModel};
use warp::hyper::body::Bytes;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

use crate::error::ApiError;
use crate::state::ModelSlot;

/// Fixed liveness acknowledgment.
pub const HEALTH_ACK: &str = "OK";

/// All routes with rejection handling applied.
pub fn routes(
    slot: Arc<ModelSlot>,
    max_body_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status(HEALTH_ACK, StatusCode::OK));

    let ready = warp::path!("ready")
        .and(warp::get())
        .and(with_slot(slot.clone()))
        .map(ready_handler);

    let predict = warp::path!("predict")
        .and(warp::post())
        .and(warp::body::content_length_limit(max_body_bytes))
        .and(warp::body::bytes())
        .and(with_slot(slot.clone()))
        .and_then(predict_handler);

    let reload = warp::path!("reload")
        .and(warp::post())
        .and(with_slot(slot))
        .and_then(reload_handler);

    health
        .or(ready)
        .or(predict)
        .or(reload)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

fn with_slot(
    slot: Arc<ModelSlot>,
) -> impl Filter<Extract = (Arc<ModelSlot>,), Error = Infallible> + Clone {
    warp::any().map(move || slot.clone())
}

fn ready_handler(slot: Arc<ModelSlot>) -> Response {
    match slot.model() {
        Ok(_) => warp::reply::json(&serde_json::json!({ "status": "ready" })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn predict_handler(body: Bytes, slot: Arc<ModelSlot>) -> Result<Response, Infallible> {
    let model = match slot.model() {
        Ok(model) => model,
        Err(e) => return Ok(e.into_response()),
    };

    let outcome = tokio::task::spawn_blocking(move || predict_payload(&model, &body)).await;
    let response = match outcome {
        Ok(Ok(predictions)) => warp::reply::json(&predictions).into_response(),
        Ok(Err(e)) => {
            if e.is_client_error() {
                tracing::debug!(code = e.code, message = %e.message, "rejected prediction request");
            }
            e.into_response()
        }
        Err(join) => ApiError::internal(format!("prediction task failed: {join}")).into_response(),
    };
    Ok(response)
}

/// Decodes a JSON array of records and predicts a label for each.
///
/// Only the model's feature columns are read, so records may carry
/// differing extra columns. A record lacking a feature column is reported
/// as `missing_column`.
pub fn predict_payload(model: &TitanicModel, body: &[u8]) -> Result<Vec<u8>, ApiError> {
    let dataset: Dataset = serde_json::from_slice(body)
        .map_err(|e| ApiError::malformed(format!("expected a JSON array of records: {e}")))?;
    Ok(model.predict(&dataset)?)
}

async fn reload_handler(slot: Arc<ModelSlot>) -> Result<Response, Infallible> {
    let response = match tokio::task::spawn_blocking(move || slot.reload()).await {
        Ok(Ok(())) => warp::reply::json(&serde_json::json!({ "status": "ready" })).into_response(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "model reload failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.code(), e.to_string())
                .into_response()
        }
        Err(join) => ApiError::internal(format!("reload task failed: {join}")).into_response(),
    };
    Ok(response)
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let api_error = if err.is_not_found() {
        ApiError::new(StatusCode::NOT_FOUND, "not_found", "no such route")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "request body exceeds the configured limit",
        )
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        ApiError::new(
            StatusCode::LENGTH_REQUIRED,
            "length_required",
            "prediction requests need a Content-Length header",
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "method not allowed for this route",
        )
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        ApiError::internal("unhandled rejection")
    };
    Ok(api_error.into_response())
}
