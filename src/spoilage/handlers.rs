use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};

use super::dto::PredictionResponse;
use crate::{error::ApiError, state::AppState};

const IMAGE_FIELD: &str = "image";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/predict_from_esp32",
            post(predict_from_esp32).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
        .route("/latest_esp32_image", get(latest_esp32_image))
        .route("/get_latest_prediction_result", get(get_latest_prediction_result))
}

async fn image_field(mp: &mut Multipart) -> Result<Option<Bytes>, ApiError> {
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            return Ok(Some(data).filter(|d| !d.is_empty()));
        }
    }
    Ok(None)
}

/// POST /predict_from_esp32 (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn predict_from_esp32(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let image = image_field(&mut mp)
        .await?
        .ok_or_else(|| ApiError::bad_request("No image uploaded"))?;
    info!(bytes = image.len(), "esp32 image received");

    state.images.put_latest(image.clone()).await?;

    let result = state
        .classifier
        .classify(&image)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(result.into()))
}

#[instrument(skip(state))]
pub async fn latest_esp32_image(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .images
        .latest()
        .await?
        .ok_or_else(|| ApiError::not_found("No image available"))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], image))
}

#[instrument(skip(state))]
pub async fn get_latest_prediction_result(
    State(state): State<AppState>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let image = state
        .images
        .latest()
        .await?
        .ok_or_else(|| ApiError::not_found("No image has been received from ESP32 yet."))?;

    let result = state
        .classifier
        .classify(&image)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get latest prediction: {e}")))?;
    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::FromRequest, http::Request, http::StatusCode};

    use super::*;

    fn multipart(field: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--X\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"cam.jpg\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n--X--\r\n");
        Request::builder()
            .method("POST")
            .uri("/predict_from_esp32")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap()
    }

    async fn extract(req: Request<Body>) -> Multipart {
        Multipart::from_request(req, &()).await.unwrap()
    }

    #[tokio::test]
    async fn nothing_stored_yet() {
        let state = AppState::fake();
        let err = latest_esp32_image(State(state.clone())).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "No image available");

        let err = get_latest_prediction_result(State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "No image has been received from ESP32 yet.");
    }

    #[tokio::test]
    async fn upload_without_image_field_is_rejected() {
        let mp = extract(multipart("photo", b"jpeg")).await;
        let err = predict_from_esp32(State(AppState::fake()), mp).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No image uploaded");
    }

    #[tokio::test]
    async fn upload_is_stored_and_classified() {
        let state = AppState::fake();
        let mp = extract(multipart("image", b"fake-jpeg")).await;
        let Json(res) = predict_from_esp32(State(state.clone()), mp).await.unwrap();
        assert_eq!(res.status, "success");
        assert_eq!(res.result.source, "api");

        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["predictedClass"], "spoiled");

        let stored = state.images.latest().await.unwrap().unwrap();
        assert_eq!(stored, Bytes::from_static(b"fake-jpeg"));

        let res = latest_esp32_image(State(state.clone())).await.unwrap().into_response();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/jpeg");

        let Json(again) = get_latest_prediction_result(State(state)).await.unwrap();
        assert_eq!(again.result.predicted_class, "spoiled");
    }

    #[tokio::test]
    async fn classifier_failure_is_internal_error() {
        let state = AppState::fake_failing_classifier();
        state.images.put_latest(Bytes::from_static(b"x")).await.unwrap();
        let err = get_latest_prediction_result(State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to get latest prediction:"));
    }
}
