pub mod fallback;
pub mod history;
pub mod server;
pub mod upstream;

use crate::io::store::Store;
use crate::model::chat::ChatMessage;
use crate::model::config::AppConfig;
use fallback::{RelayError, run_fallback};
use history::{WireMessage, build_messages};
use upstream::{CompletionBackend, HttpBackend};

/// One chat turn through the same pipeline the relay server uses, run
/// in-process against the configured HTTP backend.
pub async fn chat_once(
    store: &Store,
    config: &AppConfig,
    message: &str,
) -> Result<String, RelayError> {
    let backend =
        HttpBackend::from_config(&config.relay).map_err(|e| RelayError::BadCredential(e.to_string()))?;
    chat_with_backend(store, &backend, &config.relay.models, message).await
}

/// The chat turn itself, generic over the backend: load the persisted
/// history, forward the trimmed window upstream, and on success append one
/// user and one assistant entry. A failed turn leaves the history untouched.
pub async fn chat_with_backend(
    store: &Store,
    backend: &impl CompletionBackend,
    models: &[String],
    message: &str,
) -> Result<String, RelayError> {
    if message.trim().is_empty() {
        return Err(RelayError::EmptyMessage);
    }

    let mut history = store.load_chat_history();
    let wire: Vec<WireMessage> = history.iter().map(WireMessage::from).collect();
    let messages = build_messages(message, &wire);

    let reply = run_fallback(backend, models, &messages).await?;

    history.push(ChatMessage::user(message));
    history.push(ChatMessage::assistant(reply.message.clone()));
    store.save_chat_history(&history);

    Ok(reply.message)
}
