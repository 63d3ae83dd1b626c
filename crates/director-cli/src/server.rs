//! HTTP boundary. Handlers parse the wire format, call the orchestrator and
//! map typed errors onto status codes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use director_contracts::{ChatReply, ChatTurn, GuidanceResult, Mode, ModeController, ModeState};
use director_engine::{
    EditResult, EffectResult, Frame, GuidanceError, GuidanceRequest, GuideResult, Orchestrator,
    VideoEffectResult,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;
const DEFAULT_CHAT_CONTEXT: &str = "Professional Profile";
const DEFAULT_VIDEO_CONTEXT: &str = "advertising";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub modes: Arc<ModeController>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            modes: Arc::new(ModeController::new()),
        }
    }
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/analyze", post(analyze))
        .route("/analyze/scene", post(analyze_scene))
        .route("/edit", post(edit))
        .route("/apply_effect", post(apply_effect))
        .route("/video_effect", post(video_effect))
        .route("/guide", post(guide))
        .route("/chat", post(chat))
        .route("/mode/set", post(set_mode))
        .route("/mode/current", get(current_mode))
        .route("/mode/recording", post(set_recording))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "detail": detail.into(), "kind": "bad_request" }),
        }
    }
}

impl From<GuidanceError> for ApiError {
    fn from(err: GuidanceError) -> Self {
        let status = match err {
            GuidanceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GuidanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        let body = serde_json::to_value(&err)
            .unwrap_or_else(|_| json!({ "detail": err.to_string(), "kind": err.kind() }));
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Text fields and the optional `file` part of a multipart form.
#[derive(Debug, Default)]
struct FormFields {
    text: HashMap<String, String>,
    file: Option<Vec<u8>>,
}

impl FormFields {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut fields = FormFields::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::bad_request(format!("malformed form: {err}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::bad_request(format!("unreadable file: {err}")))?;
                fields.file = Some(bytes.to_vec());
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::bad_request(format!("unreadable field {name}: {err}")))?;
                fields.text.insert(name, value);
            }
        }
        Ok(fields)
    }

    fn optional(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> Result<&str, ApiError> {
        self.optional(name)
            .ok_or_else(|| ApiError::bad_request(format!("missing form field '{name}'")))
    }

    fn frame(&mut self) -> Result<Frame, ApiError> {
        let bytes = self
            .file
            .take()
            .ok_or_else(|| ApiError::bad_request("missing form field 'file'"))?;
        Ok(Frame::decode(bytes)?)
    }

    /// `custom_prompt` wins over `effect_type` when both are sent.
    fn effect_prompt(&self) -> Result<String, ApiError> {
        let effect_type = self.required("effect_type")?;
        Ok(self
            .optional("custom_prompt")
            .unwrap_or(effect_type)
            .to_string())
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Director guidance backend is running" }))
}

async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GuidanceResult>, ApiError> {
    let mut form = FormFields::read(multipart).await?;
    let frame = form.frame()?;
    let request = GuidanceRequest::new(form.required("context")?, state.modes.current_mode())
        .with_image(frame);
    Ok(Json(state.orchestrator.analyze(&request).await?))
}

async fn analyze_scene(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GuidanceResult>, ApiError> {
    let mut form = FormFields::read(multipart).await?;
    let frame = form.frame()?;
    let request = GuidanceRequest::new(form.required("context")?, state.modes.current_mode())
        .with_image(frame);
    Ok(Json(state.orchestrator.analyze_scene(&request).await?))
}

async fn edit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EditResult>, ApiError> {
    let mut form = FormFields::read(multipart).await?;
    let frame = form.frame()?;
    let prompt = form.required("prompt")?;
    Ok(Json(state.orchestrator.edit(prompt, &frame).await?))
}

async fn apply_effect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EffectResult>, ApiError> {
    let mut form = FormFields::read(multipart).await?;
    let frame = form.frame()?;
    let prompt = form.effect_prompt()?;
    tracing::debug!(effect = %prompt, "apply_effect request");
    Ok(Json(state.orchestrator.apply_effect(&frame, &prompt).await?))
}

async fn video_effect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<VideoEffectResult>, ApiError> {
    let form = FormFields::read(multipart).await?;
    let prompt = form.effect_prompt()?;
    let context = form.optional("context").unwrap_or(DEFAULT_VIDEO_CONTEXT);
    tracing::debug!(effect = %prompt, context, "video_effect request");
    Ok(Json(
        state
            .orchestrator
            .apply_video_effect(context, &prompt)
            .await?,
    ))
}

async fn guide(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<GuideResult>, ApiError> {
    let form = FormFields::read(multipart).await?;
    let context = form.required("context")?;
    Ok(Json(state.orchestrator.generate_guide(context).await?))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
    #[serde(default)]
    context: Option<String>,
}

async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let context = payload
        .context
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_CHAT_CONTEXT);
    let request =
        GuidanceRequest::new(context, state.modes.current_mode()).with_history(payload.history);
    Ok(Json(state.orchestrator.chat(&request, &payload.message).await?))
}

/// Accepts either a bare JSON string or `{"mode": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModeBody {
    Bare(String),
    Wrapped { mode: String },
}

async fn set_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeBody>,
) -> Result<Json<ModeState>, ApiError> {
    let raw = match &body {
        ModeBody::Bare(mode) | ModeBody::Wrapped { mode } => mode.as_str(),
    };
    let mode = Mode::parse(raw).ok_or_else(|| {
        ApiError::bad_request(format!(
            "unknown mode '{raw}', expected 'photography' or 'videography'"
        ))
    })?;
    Ok(Json(state.modes.set_mode(mode)))
}

async fn current_mode(State(state): State<AppState>) -> Json<ModeState> {
    Json(state.modes.state())
}

#[derive(Debug, Deserialize)]
struct RecordingBody {
    is_recording: bool,
}

async fn set_recording(
    State(state): State<AppState>,
    Json(body): Json<RecordingBody>,
) -> Json<ModeState> {
    Json(state.modes.set_recording(body.is_recording))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use director_engine::EngineConfig;
    use image::{DynamicImage, Rgb, RgbImage};
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "director-test-boundary";

    fn test_app(static_dir: &Path) -> Router {
        let config = EngineConfig {
            gemini_api_base: "http://127.0.0.1:9/v1beta".to_string(),
            imagen_api_base: "http://127.0.0.1:9/v1beta".to_string(),
            ..EngineConfig::default()
        }
        .with_static_dir(static_dir);
        let orchestrator = Orchestrator::from_config(config).expect("orchestrator");
        router(AppState::new(orchestrator), static_dir)
    }

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(16, 16, Rgb([200, 160, 90]));
        director_engine::frame::encode_png(&DynamicImage::ImageRgb8(image)).expect("png")
    }

    fn multipart_body(fields: &[(&str, &str)], file: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"frame.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(uri: &str, fields: &[(&str, &str)], file: Option<&[u8]>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, file)))
            .expect("request")
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
        let response = app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    #[tokio::test]
    async fn root_reports_running() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        let (status, body) = send(&app, Request::get("/").body(Body::empty())?).await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn analyze_without_credentials_returns_mock() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        let png = png_bytes();
        let (status, body) = send(
            &app,
            multipart_request("/analyze", &[("context", "Professional Profile")], Some(&png)),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["composition_score"], json!(70));
        assert_eq!(body["lighting"], json!("Unknown"));
        assert_eq!(body["is_ready_to_shoot"], json!(false));
        assert_eq!(body["technical_adjustments"]["zoom_level"], json!(1.0));
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_frame_is_unprocessable() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        let (status, body) = send(
            &app,
            multipart_request("/analyze/scene", &[("context", "Wedding")], Some(b"not an image")),
        )
        .await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], json!("invalid_input"));
        assert!(body["detail"].as_str().is_some());
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_are_bad_requests() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        let (status, body) =
            send(&app, multipart_request("/analyze", &[("context", "Portrait")], None)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], json!("bad_request"));
        Ok(())
    }

    #[tokio::test]
    async fn mode_round_trip_keeps_features_consistent() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());

        let (status, body) = send(&app, json_request("/mode/set", json!("videography"))).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_mode"], json!("videography"));
        assert_eq!(
            body["active_features"],
            json!(["video_stabilization", "audio_monitoring", "continuous_focus"])
        );

        let (_, body) = send(&app, json_request("/mode/recording", json!({"is_recording": true}))).await?;
        assert_eq!(body["is_recording"], json!(true));

        let (_, body) =
            send(&app, json_request("/mode/set", json!({"mode": "photography"}))).await?;
        assert_eq!(body["current_mode"], json!("photography"));
        assert_eq!(body["is_recording"], json!(true));

        let (status, body) =
            send(&app, Request::get("/mode/current").body(Body::empty())?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["active_features"],
            json!(["scene_analysis", "composition_guide", "shutter_control"])
        );

        let (status, _) = send(&app, json_request("/mode/set", json!("timelapse"))).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn chat_routes_by_context_label() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        send(&app, json_request("/mode/set", json!("videography"))).await?;

        let (status, body) = send(
            &app,
            json_request(
                "/chat",
                json!({"message": "Ready?", "history": [{"role": "ai", "content": "Hi"}]}),
            ),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], Value::Null);

        let (status, body) = send(
            &app,
            json_request(
                "/chat",
                json!({"message": "Ready?", "context": "Wedding Video"}),
            ),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], json!("start_recording"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_chat_message_is_unprocessable() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        let (status, _) = send(&app, json_request("/chat", json!({"message": "  "}))).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        Ok(())
    }

    #[tokio::test]
    async fn effect_placeholder_is_served_from_static() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());
        let png = png_bytes();

        let (status, body) = send(
            &app,
            multipart_request(
                "/apply_effect",
                &[("effect_type", "film grain"), ("custom_prompt", "soft bokeh")],
                Some(&png),
            ),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("mock"));
        assert_eq!(body["effect_type"], json!("soft bokeh"));

        let url = body["overlay_url"].as_str().unwrap_or_default().to_string();
        assert!(url.starts_with("/static/effects/"));
        let response = app
            .clone()
            .oneshot(Request::get(url.as_str()).body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn video_effect_and_guide_without_credentials() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let app = test_app(temp.path());

        let (status, body) = send(
            &app,
            multipart_request("/video_effect", &[("effect_type", "no fx")], None),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["veo_overlay_stream"], json!(""));
        assert_eq!(body["metadata"], json!({}));

        let (status, body) = send(
            &app,
            multipart_request("/guide", &[("context", "Food Commercial")], None),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert!(body["video_url"]
            .as_str()
            .is_some_and(|url| url.starts_with("/static/effects/video_fx_")));
        Ok(())
    }
}
