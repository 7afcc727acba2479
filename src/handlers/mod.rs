pub mod coordinate;
pub mod form;
pub mod generate_image;
pub mod responses;

use axum::extract::DefaultBodyLimit;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::utils::language::Language;

pub const COORDINATE_PATH: &str = "/api/coordinate";
pub const GENERATE_IMAGE_PATH: &str = "/api/generate-coordinate-image";

pub fn request_language(headers: &HeaderMap) -> Language {
    Language::from_accept_language(
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok()),
    )
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();
    Router::new()
        .route(
            COORDINATE_PATH,
            get(coordinate::health).post(coordinate::create),
        )
        .route(
            GENERATE_IMAGE_PATH,
            get(generate_image::health).post(generate_image::create),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm::media::InlineImage;
    use crate::pipeline::testing::StubGateway;

    const PNG_HEADER: [u8; 16] = [
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
    ];
    const BOUNDARY: &str = "autofit-test-boundary";

    fn app(stub: Arc<StubGateway>, config: Config) -> Router {
        router(AppState::new(Arc::new(config), stub))
    }

    fn scenario() -> Value {
        json!({
            "bodyInfo": {"height": 170, "weight": 65, "bodyType": "표준", "skinTone": "중성"},
            "styleOptions": ["캐주얼"],
            "tpo": {"time": "저녁", "place": "카페", "occasion": "데이트"},
            "bodyConcerns": []
        })
    }

    fn json_request(path: &str, body: &Value, language: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(language) = language {
            builder = builder.header("accept-language", language);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn multipart_request(path: &str, fields: &Value, file: Option<(&str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields.as_object().unwrap() {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((mime, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"me\"\r\nContent-Type: {mime}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(path)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    const ANALYSIS_REPLY: &str = "```json\n{\"stylingTips\": [\"1\", \"2\", \"3\", \"4\", \"5\", \"6\"], \"accessories\": [], \"colorPalette\": [{\"name\": \"베이지\", \"hex\": \"#D8C3A5\", \"usage\": \"메인\"}], \"overallComment\": \"편안한 캐주얼\"}\n```";

    #[tokio::test]
    async fn health_endpoints_report_ok() {
        let stub = Arc::new(StubGateway::default());
        for (path, message) in [
            (COORDINATE_PATH, "Coordinate API is running"),
            (GENERATE_IMAGE_PATH, "Generate Coordinate Image API is running"),
        ] {
            let request = Request::builder().uri(path).body(Body::empty()).unwrap();
            let (status, body) = send(app(stub.clone(), Config::default()), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "status": "ok", "message": message }));
        }
    }

    #[tokio::test]
    async fn json_scenario_returns_capped_result() {
        let stub = Arc::new(StubGateway::replying_text(ANALYSIS_REPLY));
        let (status, body) = send(
            app(stub.clone(), Config::default()),
            json_request(COORDINATE_PATH, &scenario(), None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["stylingTips"].as_array().unwrap().len(), 5);
        assert!(body["data"]["colorPalette"].is_array());
        assert!(body["data"].get("score").is_none());
        let calls = stub.text_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].image.is_none());
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_model() {
        let stub = Arc::new(StubGateway::replying_text(ANALYSIS_REPLY));
        let mut too_short = scenario();
        too_short["bodyInfo"]["height"] = json!(90);
        let (status, body) = send(
            app(stub.clone(), Config::default()),
            json_request(COORDINATE_PATH, &too_short, Some("en-US,en;q=0.9")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid input"));

        let mut wrong_shape = scenario();
        wrong_shape["bodyInfo"]["gender"] = json!("남성");
        wrong_shape["bodyInfo"]["bodyShape"] = json!("모래시계");
        let (status, body) = send(
            app(stub.clone(), Config::default()),
            json_request(COORDINATE_PATH, &wrong_shape, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let mut four_styles = scenario();
        four_styles["styleOptions"] = json!(["캐주얼", "미니멀", "스트리트", "빈티지"]);
        let (_, body) = send(
            app(stub.clone(), Config::default()),
            json_request(COORDINATE_PATH, &four_styles, None),
        )
        .await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_in_korean_by_default() {
        let stub = Arc::new(StubGateway::default());
        let mut partial = scenario();
        partial.as_object_mut().unwrap().remove("tpo");
        let (status, body) = send(
            app(stub.clone(), Config::default()),
            json_request(COORDINATE_PATH, &partial, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_FIELDS");
        assert_eq!(
            body["error"]["message"],
            "필수 입력 항목이 누락되었습니다: tpo"
        );
        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn multipart_requires_a_valid_image() {
        let stub = Arc::new(StubGateway::replying_text(ANALYSIS_REPLY));

        let (status, body) = send(
            app(stub.clone(), Config::default()),
            multipart_request(COORDINATE_PATH, &scenario(), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_FILE");

        let (_, body) = send(
            app(stub.clone(), Config::default()),
            multipart_request(COORDINATE_PATH, &scenario(), Some(("image/gif", &b"GIF89a\x01\x00"[..]))),
        )
        .await;
        assert_eq!(body["error"]["code"], "INVALID_FILE_TYPE");

        let small_limit = Config {
            max_file_size: 8,
            ..Config::default()
        };
        let (_, body) = send(
            app(stub.clone(), small_limit),
            multipart_request(COORDINATE_PATH, &scenario(), Some(("image/png", &PNG_HEADER[..]))),
        )
        .await;
        assert_eq!(body["error"]["code"], "FILE_TOO_LARGE");

        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn multipart_photo_is_forwarded_to_the_model() {
        let stub = Arc::new(StubGateway::replying_text(
            "{\"score\": 84, \"stylingTips\": [\"a\"], \"colorPalette\": [\"#112233\"]}",
        ));
        let (status, body) = send(
            app(stub.clone(), Config::default()),
            multipart_request(COORDINATE_PATH, &scenario(), Some(("image/png", &PNG_HEADER[..]))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["score"], 84);
        assert_eq!(body["data"]["colorPalette"], json!(["#112233"]));

        let calls = stub.text_calls.lock().unwrap();
        let photo = calls[0].image.as_ref().unwrap();
        assert_eq!(photo.bytes, PNG_HEADER.to_vec());
        assert_eq!(photo.mime_type, "image/png");
    }

    #[tokio::test]
    async fn parse_and_config_failures_are_server_errors() {
        let stub = Arc::new(StubGateway::replying_text("no json here"));
        let (status, body) = send(
            app(stub, Config::default()),
            json_request(COORDINATE_PATH, &scenario(), Some("ja")),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "AI_PARSE_ERROR");

        let gateway = crate::llm::GeminiGateway::new(&Config::default(), reqwest::Client::new());
        let state = AppState::new(Arc::new(Config::default()), Arc::new(gateway));
        let (status, body) = send(
            router(state),
            json_request(COORDINATE_PATH, &scenario(), None),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "AI_CONFIG_ERROR");
    }

    #[tokio::test]
    async fn outfit_image_endpoint_returns_a_data_url() {
        let stub = Arc::new(StubGateway::replying_image(InlineImage::new(
            vec![1, 2, 3],
            "image/png",
        )));
        let mut body = scenario();
        body["stylingTips"] = json!(["니트 카디건"]);
        body["colorPalette"] = json!(["#FFFFFF"]);
        body["includeFace"] = json!(true);

        let (status, response) = send(
            app(stub.clone(), Config::default()),
            json_request(GENERATE_IMAGE_PATH, &body, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["data"]["imageUrl"], "data:image/png;base64,AQID");

        let calls = stub.image_calls.lock().unwrap();
        assert!(calls[0].reference.is_none());
        assert!(calls[0].prompt.contains("니트 카디건"));
    }

    #[tokio::test]
    async fn outfit_image_requires_analysis_output() {
        let stub = Arc::new(StubGateway::default());
        let (status, body) = send(
            app(stub.clone(), Config::default()),
            json_request(GENERATE_IMAGE_PATH, &scenario(), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_FIELDS");
        assert_eq!(stub.total_calls(), 0);
    }
}
