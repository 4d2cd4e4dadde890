use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::error::QuizError;
use crate::quiz::ai_helper::{QuestionSource, QuizHelper};
use crate::quiz::QuestionRecord;

#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    topic: String,
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = match self {
            QuizError::MissingTopic | QuizError::EmptyTopic => StatusCode::BAD_REQUEST,
            QuizError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router<S: QuestionSource>(helper: Arc<QuizHelper<S>>) -> Router {
    Router::new()
        .route("/generate_quiz", post(generate_quiz::<S>))
        .with_state(helper)
}

pub async fn serve<S: QuestionSource>(
    listener: TcpListener,
    helper: Arc<QuizHelper<S>>,
) -> std::io::Result<()> {
    info!("HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(helper))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutting down HTTP server");
}

async fn generate_quiz<S: QuestionSource>(
    State(helper): State<Arc<QuizHelper<S>>>,
    payload: Result<Json<GenerateQuizRequest>, JsonRejection>,
) -> Result<Json<GenerateQuizResponse>, QuizError> {
    let topic = match payload {
        Ok(Json(GenerateQuizRequest { topic: Some(topic) })) => topic,
        Ok(_) => return Err(QuizError::MissingTopic),
        Err(rejection) => {
            warn!("Rejected quiz request: {}", rejection);
            return Err(QuizError::MissingTopic);
        }
    };

    let questions = helper.generate_quiz(&topic).await.map_err(|e| {
        if let QuizError::Upstream(message) = &e {
            error!("Quiz generation failed: {}", message);
        }
        e
    })?;

    Ok(Json(GenerateQuizResponse {
        topic: topic.trim().to_string(),
        questions,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::quiz::ai_helper::tests::{FakeSource, TWO_BLOCKS};

    fn app(source: FakeSource) -> Router {
        router(Arc::new(QuizHelper::new(source, 10, false)))
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/generate_quiz")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn returns_parsed_questions() {
        let (status, body) = post_json(
            app(FakeSource::replying(TWO_BLOCKS)),
            r#"{"topic": "  Arithmetic "}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topic"], "Arithmetic");
        assert_eq!(body["questions"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["questions"][0],
            json!({
                "question": "What is 2+2?",
                "options": {"A": "3", "B": "4", "C": "5", "D": "6"},
                "correct_answer": "B"
            })
        );
    }

    #[tokio::test]
    async fn unparseable_reply_is_an_empty_quiz() {
        let (status, body) = post_json(
            app(FakeSource::replying("Here are some thoughts about history.")),
            r#"{"topic": "History"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"topic": "History", "questions": []}));
    }

    #[tokio::test]
    async fn missing_topic_is_a_bad_request() {
        for payload in [r#"{}"#, r#"{"subject": "Math"}"#, "not json", r#"{"topic": 5}"#] {
            let (status, body) = post_json(app(FakeSource::replying(TWO_BLOCKS)), payload).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body["error"], "Invalid request. 'topic' is required.");
        }
    }

    #[tokio::test]
    async fn blank_topic_is_a_bad_request() {
        let (status, body) =
            post_json(app(FakeSource::replying(TWO_BLOCKS)), r#"{"topic": "   "}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Topic cannot be empty.");
    }

    #[tokio::test]
    async fn upstream_failure_is_a_server_error() {
        let (status, body) = post_json(
            app(FakeSource::failing("API key not valid")),
            r#"{"topic": "History"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "API key not valid"}));
    }
}
