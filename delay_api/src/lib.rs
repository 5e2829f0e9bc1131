//! HTTP front for the delay model: `GET /health` and `POST /predict`.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use delay_model::{DelayModel, Features, FlightRecord};
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod types;
pub mod validate;

use error::ApiError;
use types::{HealthResponse, PredictResponse};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<DelayModel>,
    pub log_pred: bool,
}

impl AppState {
    pub fn new(model: DelayModel) -> Self {
        Self {
            model: Arc::new(model),
            log_pred: false,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

// ---------- Handlers ----------

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "OK" })
}

async fn predict(State(state): State<AppState>, body: Bytes) -> Result<Json<PredictResponse>, ApiError> {
    let request = validate::predict_request(&body)?;
    let records: Vec<FlightRecord> = request.flights.into_iter().map(Into::into).collect();

    let features = state.model.preprocess(&records)?;
    if state.log_pred {
        log_features(&features);
    }

    let predict = state.model.predict(&features)?;
    Ok(Json(PredictResponse { predict }))
}

// Debug signal: how many indicators fired, and the first row by name.
fn log_features(features: &Features) {
    let nonzero = features.values.iter().filter(|x| **x != 0.0).count();
    let sample: Vec<String> = features
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| features.values.get((0, *i)).is_some_and(|v| *v != 0.0))
        .map(|(_, name)| name.clone())
        .collect();
    tracing::info!(
        "recv rows={} in_dim={} nonzero={} first=[{}]",
        features.n_rows(),
        features.columns.len(),
        nonzero,
        sample.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use delay_model::{LogisticRegression, OneHotEncoder, FEATURE_COLS};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Delay iff the flight is Grupo LATAM.
    fn latam_weights() -> Vec<f64> {
        FEATURE_COLS
            .iter()
            .map(|c| if *c == "OPERA_Grupo LATAM" { 4.0 } else { 0.0 })
            .collect()
    }

    fn test_app() -> Router {
        let encoder = OneHotEncoder::fit(&[
            FlightRecord::new("Grupo LATAM", "I", 7),
            FlightRecord::new("Latin American Wings", "N", 10),
            FlightRecord::new("Sky Airline", "I", 12),
            FlightRecord::new("Copa Air", "N", 4),
            FlightRecord::new("Grupo LATAM", "I", 11),
            FlightRecord::new("Aerolineas Argentinas", "N", 3),
        ])
        .unwrap();
        let classifier = LogisticRegression::from_parts(latam_weights().into(), -2.0);
        app(AppState::new(DelayModel::new(encoder, classifier).unwrap()))
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_predict(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = test_app();
        let _ = call(app.clone(), post_predict(json!({"flights": []}))).await;
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "OK"}));
    }

    #[tokio::test]
    async fn predict_returns_one_label_per_flight() {
        let body = json!({"flights": [
            {"OPERA": "Grupo LATAM", "TIPOVUELO": "I", "MES": 7},
            {"OPERA": "Aerolineas Argentinas", "TIPOVUELO": "N", "MES": 3},
            {"OPERA": "Grupo LATAM", "TIPOVUELO": "N", "MES": 4}
        ]});
        let (status, body) = call(test_app(), post_predict(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"predict": [1, 0, 1]}));
    }

    #[tokio::test]
    async fn unknown_category_is_client_error() {
        let body = json!({"flights": [{"OPERA": "Nonexistent Airline", "TIPOVUELO": "I", "MES": 7}]});
        let (status, body) = call(test_app(), post_predict(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"detail": "Unknown categories 'Nonexistent Airline' found in column 'OPERA'"})
        );
    }

    #[tokio::test]
    async fn unseen_month_is_client_error() {
        let body = json!({"flights": [{"OPERA": "Grupo LATAM", "TIPOVUELO": "I", "MES": 13}]});
        let (status, body) = call(test_app(), post_predict(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("'MES'"));
    }

    #[tokio::test]
    async fn empty_batch_reports_missing_columns() {
        let (status, body) = call(test_app(), post_predict(json!({"flights": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "Missing required columns: OPERA, TIPOVUELO, MES"}));
    }

    #[tokio::test]
    async fn schema_violations_list_every_field() {
        let body = json!({"flights": [{"OPERA": "Grupo LATAM", "MES": "julio"}]});
        let (status, body) = call(test_app(), post_predict(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0]["loc"], json!(["body", "flights", 0, "TIPOVUELO"]));
        assert_eq!(detail[1]["loc"], json!(["body", "flights", 0, "MES"]));
    }

    #[tokio::test]
    async fn internal_failure_is_server_error() {
        let err: ApiError = delay_model::Error::FeatureWidth { got: 9, expected: 10 }.into();
        let resp = axum::response::IntoResponse::into_response(err);
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
