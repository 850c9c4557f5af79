use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::io::store::Store;
use crate::io::watcher::StoreWatcher;
use crate::model::config::{AppConfig, Theme};
use crate::relay::fallback::{RelayError, run_fallback};
use crate::relay::history::{WireMessage, build_messages};
use crate::relay::upstream::{CompletionBackend, HttpBackend};

/// Shared state behind the relay routes, generic over the completion
/// backend so the routes can be driven by a scripted one in tests.
pub struct RelayState<B> {
    backend: B,
    models: Vec<String>,
    theme: RwLock<Theme>,
}

/// `POST /api/chat` request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub chat_history: Vec<WireMessage>,
}

/// `POST /api/chat` success body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub success: bool,
}

/// Error body for all non-200 responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RelayError {
    /// HTTP status for each failure class
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::EmptyMessage | RelayError::NoModelAvailable => StatusCode::BAD_REQUEST,
            RelayError::BadCredential(_) => StatusCode::UNAUTHORIZED,
            RelayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Raw upstream message, carried as `details` alongside the user-facing text
    fn details(&self) -> Option<String> {
        match self {
            RelayError::EmptyMessage | RelayError::NoModelAvailable => None,
            RelayError::BadCredential(m)
            | RelayError::RateLimited(m)
            | RelayError::Upstream(m) => Some(m.clone()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}

async fn chat_handler<B: CompletionBackend + Send + Sync>(
    State(state): State<Arc<RelayState<B>>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, RelayError> {
    if request.message.trim().is_empty() {
        return Err(RelayError::EmptyMessage);
    }

    let messages = build_messages(&request.message, &request.chat_history);
    let reply = run_fallback(&state.backend, &state.models, &messages).await?;
    tracing::info!(model = %reply.model, "chat completion served");

    Ok(Json(ChatResponse {
        message: reply.message,
        success: true,
    }))
}

async fn theme_handler<B>(State(state): State<Arc<RelayState<B>>>) -> Json<Theme> {
    Json(*state.theme.read().expect("theme lock"))
}

/// Build the router over the given shared state.
pub fn router<B: CompletionBackend + Send + Sync + 'static>(state: Arc<RelayState<B>>) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/theme", get(theme_handler))
        .with_state(state)
}

/// Run the relay server until interrupted.
///
/// A store watcher keeps the served theme in sync with edits made by other
/// processes (a `tp theme` invocation, or a hand-edited file).
pub async fn serve(store: Store, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backend = HttpBackend::from_config(&config.relay)
        .map_err(|e| format!("relay backend unavailable: {e}"))?;

    let state = Arc::new(RelayState {
        backend,
        models: config.relay.models.clone(),
        theme: RwLock::new(store.theme()),
    });

    spawn_theme_refresh(store, state.clone());

    let listener = tokio::net::TcpListener::bind(&config.relay.bind_addr).await?;
    tracing::info!(addr = %config.relay.bind_addr, "relay server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Watch the data directory and refresh the shared theme on change.
/// Falls back to doing nothing (serving the startup theme) when the
/// platform watcher cannot start.
fn spawn_theme_refresh<B: Send + Sync + 'static>(store: Store, state: Arc<RelayState<B>>) {
    let watcher = match StoreWatcher::start(store.dir()) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "store watcher unavailable, theme changes need a restart");
            return;
        }
    };

    std::thread::spawn(move || {
        loop {
            if !watcher.poll().is_empty() {
                let theme = store.theme();
                let mut current = state.theme.write().expect("theme lock");
                if *current != theme {
                    tracing::info!(theme = theme.as_str(), "theme updated");
                    *current = theme;
                }
            }
            std::thread::sleep(Duration::from_millis(250));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::upstream::UpstreamError;

    /// Backend that answers every completion with a fixed reply.
    struct Canned(&'static str);

    impl CompletionBackend for Canned {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[WireMessage],
        ) -> Result<String, UpstreamError> {
            Ok(self.0.to_string())
        }
    }

    fn state(backend: Canned) -> Arc<RelayState<Canned>> {
        Arc::new(RelayState {
            backend,
            models: vec!["m".to_string()],
            theme: RwLock::new(Theme::Light),
        })
    }

    #[tokio::test]
    async fn chat_handler_answers_with_the_success_envelope() {
        let request = ChatRequest {
            message: "help me plan".into(),
            chat_history: vec![WireMessage::user("earlier")],
        };
        let Json(response) = chat_handler(State(state(Canned("split it up"))), Json(request))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.message, "split it up");
    }

    #[tokio::test]
    async fn chat_handler_rejects_a_blank_message() {
        let request = ChatRequest {
            message: "   ".into(),
            chat_history: vec![],
        };
        let err = chat_handler(State(state(Canned("never"))), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn theme_handler_serves_the_shared_theme() {
        let state = state(Canned("x"));
        *state.theme.write().unwrap() = Theme::Dark;
        let Json(theme) = theme_handler(State(state)).await;
        assert_eq!(theme, Theme::Dark);
    }

    #[test]
    fn relay_errors_map_to_the_contract_status_codes() {
        assert_eq!(RelayError::EmptyMessage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::NoModelAvailable.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::BadCredential("k".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RelayError::RateLimited("r".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            RelayError::Upstream("u".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn chat_request_accepts_camel_case_history() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"message":"hi","chatHistory":[{"role":"user","content":"earlier"}]}"#,
        )
        .unwrap();
        assert_eq!(request.chat_history.len(), 1);

        // History is optional
        let request: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(request.chat_history.is_empty());
    }

    #[test]
    fn error_body_omits_absent_details() {
        let body = ErrorBody {
            error: "message cannot be empty".into(),
            details: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }
}
