use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::artifacts::{ArtifactFingerprint, InferenceContext};
use crate::engine;
use crate::error::PredictError;
use crate::render::{self, Outcome, AGE_RANGE, PRODUCTS_RANGE, TENURE_RANGE};
use crate::telemetry::{RecentPrediction, StatsSnapshot, TelemetryStore};
use crate::types::{CustomerRecord, Prediction, Verdict, CHURN_THRESHOLD};

#[derive(Clone)]
pub struct ApiState {
    pub context: Arc<InferenceContext>,
    pub telemetry: Arc<TelemetryStore>,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    probability: f64,
    display_probability: String,
    verdict: Verdict,
    message: &'static str,
    columns: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct SchemaResponse {
    geography: Vec<String>,
    gender: Vec<String>,
    age: (u32, u32),
    tenure: (u32, u32),
    num_of_products: (u32, u32),
    has_cr_card: [u8; 2],
    is_active_member: [u8; 2],
    columns: Vec<String>,
    threshold: f64,
}

#[derive(Debug, Serialize)]
struct ApiStatus {
    model_id: String,
    columns: usize,
    artifacts: Vec<ArtifactFingerprint>,
    stats: StatsSnapshot,
    recent: Vec<RecentPrediction>,
}

pub fn router(state: ApiState, cors_origin: &str) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/api/schema", get(schema))
        .route("/api/status", get(status))
        .with_state(state)
        .layer(cors_layer(cors_origin))
}

pub async fn serve(
    addr: String,
    state: ApiState,
    cors_origin: String,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state, &cors_origin);

    let addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("[API] Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(state): State<ApiState>) -> Html<String> {
    Html(render::page(&state.context, None, Outcome::Empty))
}

async fn predict_form(
    State(state): State<ApiState>,
    payload: Result<Form<CustomerRecord>, FormRejection>,
) -> (StatusCode, Html<String>) {
    let record = match payload {
        Ok(Form(record)) => record,
        Err(rejection) => {
            let message = rejection.body_text();
            log::warn!("[API] Rejected form: {}", message);
            state.telemetry.record_rejected_request().await;
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render::page(&state.context, None, Outcome::Failed(&message))),
            );
        }
    };

    match run_prediction(&state, &record).await {
        Ok(prediction) => (
            StatusCode::OK,
            Html(render::page(
                &state.context,
                Some(&record),
                Outcome::Predicted(&prediction),
            )),
        ),
        Err(error) => {
            let message = error.to_string();
            (
                error_status(&error),
                Html(render::page(
                    &state.context,
                    Some(&record),
                    Outcome::Failed(&message),
                )),
            )
        }
    }
}

async fn predict_json(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => {
            let message = rejection.body_text();
            log::warn!("[API] Rejected JSON body: {}", message);
            state.telemetry.record_rejected_request().await;
            return Err((
                rejection.status(),
                Json(ErrorResponse {
                    status: "error",
                    kind: "invalid_request",
                    message,
                }),
            ));
        }
    };

    match run_prediction(&state, &record).await {
        Ok(prediction) => Ok(Json(PredictResponse {
            probability: prediction.probability,
            display_probability: prediction.display_probability(),
            verdict: prediction.verdict,
            message: prediction.verdict.message(),
            columns: state.context.columns().to_vec(),
        })),
        Err(error) => Err((
            error_status(&error),
            Json(ErrorResponse {
                status: "error",
                kind: error.kind(),
                message: error.to_string(),
            }),
        )),
    }
}

async fn schema(State(state): State<ApiState>) -> Json<SchemaResponse> {
    let context = &state.context;
    Json(SchemaResponse {
        geography: context.geography().categories().to_vec(),
        gender: context.gender().classes().to_vec(),
        age: AGE_RANGE,
        tenure: TENURE_RANGE,
        num_of_products: PRODUCTS_RANGE,
        has_cr_card: [0, 1],
        is_active_member: [0, 1],
        columns: context.columns().to_vec(),
        threshold: CHURN_THRESHOLD,
    })
}

async fn status(State(state): State<ApiState>) -> Json<ApiStatus> {
    let stats = state.telemetry.snapshot_stats().await;
    let recent = state.telemetry.snapshot_recent().await;

    Json(ApiStatus {
        model_id: state.context.model().model_id.clone(),
        columns: state.context.columns().len(),
        artifacts: state.context.fingerprints().to_vec(),
        stats,
        recent,
    })
}

async fn run_prediction(
    state: &ApiState,
    record: &CustomerRecord,
) -> Result<Prediction, PredictError> {
    match engine::predict(&state.context, record) {
        Ok(prediction) => {
            state.telemetry.record_prediction(&prediction).await;
            Ok(prediction)
        }
        Err(error) => {
            if error.is_defect() {
                log::error!("[PREDICT] {}", error);
            } else {
                log::warn!("[PREDICT] {}", error);
            }
            state.telemetry.record_failure(&error).await;
            Err(error)
        }
    }
}

fn error_status(error: &PredictError) -> StatusCode {
    if error.is_defect() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

fn cors_layer(allowed: &str) -> CorsLayer {
    let cors = if allowed.trim() == "*" {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = allowed
            .split(',')
            .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    cors.allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::test_support;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> ApiState {
        ApiState {
            context: Arc::new(test_support::context()),
            telemetry: Arc::new(TelemetryStore::new(10)),
        }
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    const EXAMPLE_JSON: &str = r#"{
        "credit_score": 650, "gender": "Female", "age": 40, "tenure": 3,
        "balance": 50000.0, "num_of_products": 2, "has_cr_card": 1,
        "is_active_member": 1, "estimated_salary": 60000.0, "geography": "France"
    }"#;

    #[tokio::test]
    async fn index_serves_form_with_fitted_options() {
        let app = router(state(), "*");
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("<option value=\"Germany\">Germany</option>"));
        assert!(html.contains("Predict Churn"));
    }

    #[tokio::test]
    async fn json_prediction_follows_threshold() {
        let app = router(state(), "*");
        let request = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(EXAMPLE_JSON))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let probability = body["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&probability));
        let expected = if probability > 0.5 {
            "likely_to_churn"
        } else {
            "not_likely_to_churn"
        };
        assert_eq!(body["verdict"], expected);
        assert_eq!(body["columns"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn unknown_geography_is_unprocessable() {
        let state = state();
        let app = router(state.clone(), "*");
        let payload = EXAMPLE_JSON.replace("France", "Italy");
        let request = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["kind"], "unknown_category");
        assert_eq!(state.telemetry.snapshot_stats().await.rejected, 1);
    }

    #[tokio::test]
    async fn form_submission_renders_result() {
        let state = state();
        let app = router(state.clone(), "*");
        let form = "geography=Spain&gender=Male&age=40&balance=50000&credit_score=650\
                    &estimated_salary=60000&tenure=3&num_of_products=2&has_cr_card=1&is_active_member=1";
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Prediction Result"));
        assert!(html.contains("Churn Probability:"));
        assert!(html.contains("<option value=\"Spain\" selected>Spain</option>"));
        assert_eq!(state.telemetry.snapshot_stats().await.predictions, 1);
    }

    #[tokio::test]
    async fn incomplete_form_is_rejected() {
        let state = state();
        let app = router(state.clone(), "*");
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("geography=France&gender=Female"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("Prediction Failed"));

        let stats = state.telemetry.snapshot_stats().await;
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.predictions, 0);
    }

    #[tokio::test]
    async fn incomplete_json_is_rejected_and_counted() {
        let state = state();
        let app = router(state.clone(), "*");
        let request = Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"geography": "France", "gender": "Female"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["kind"], "invalid_request");

        let stats = state.telemetry.snapshot_stats().await;
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.defects, 0);
    }

    #[tokio::test]
    async fn schema_and_status_describe_artifacts() {
        let app = router(state(), "*");
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/schema").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let schema: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(schema["geography"], serde_json::json!(["France", "Germany", "Spain"]));
        assert_eq!(schema["age"], serde_json::json!([18, 92]));
        assert_eq!(schema["threshold"], 0.5);

        let response = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(status["model_id"], "test-logit");
        assert_eq!(status["columns"], 12);
        assert_eq!(status["stats"]["predictions"], 0);
    }
}
