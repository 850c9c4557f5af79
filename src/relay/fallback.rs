use crate::relay::history::WireMessage;
use crate::relay::upstream::{CompletionBackend, UpstreamError};

/// Where the fallback loop is in its walk over the model candidates.
///
/// The policy: try each candidate in order, advance on "model not found",
/// abort on any other error class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackState {
    TryModel(usize),
    Success,
    Exhausted,
    FatalError,
}

impl FallbackState {
    /// Initial state for a candidate list of the given length.
    pub fn start(candidates: usize) -> FallbackState {
        if candidates == 0 {
            FallbackState::Exhausted
        } else {
            FallbackState::TryModel(0)
        }
    }

    /// Transition on the outcome of one attempt.
    /// Only meaningful from `TryModel`; terminal states return themselves.
    pub fn advance(self, outcome: &Result<(), UpstreamError>, candidates: usize) -> FallbackState {
        let FallbackState::TryModel(i) = self else {
            return self;
        };
        match outcome {
            Ok(()) => FallbackState::Success,
            Err(UpstreamError::ModelNotFound(_)) => {
                if i + 1 < candidates {
                    FallbackState::TryModel(i + 1)
                } else {
                    FallbackState::Exhausted
                }
            }
            Err(_) => FallbackState::FatalError,
        }
    }
}

/// Terminal failure of the whole relay pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("no chat model is currently available")]
    NoModelAvailable,
    #[error("invalid API credentials")]
    BadCredential(String),
    #[error("rate limit exceeded, try again shortly")]
    RateLimited(String),
    #[error("chat service error")]
    Upstream(String),
}

/// A successful completion, tagged with the model that produced it.
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: String,
    pub model: String,
}

/// Drive the fallback walk over the candidate list against a backend.
pub async fn run_fallback<B: CompletionBackend>(
    backend: &B,
    models: &[String],
    messages: &[WireMessage],
) -> Result<Reply, RelayError> {
    let mut state = FallbackState::start(models.len());

    loop {
        match state {
            FallbackState::TryModel(i) => {
                let model = &models[i];
                match backend.complete(model, messages).await {
                    Ok(reply) => {
                        return Ok(Reply {
                            message: reply,
                            model: model.clone(),
                        });
                    }
                    Err(e) => {
                        let outcome = Err(e.clone());
                        state = state.advance(&outcome, models.len());
                        if state == FallbackState::FatalError {
                            return Err(match e {
                                UpstreamError::BadCredential(m) => RelayError::BadCredential(m),
                                UpstreamError::RateLimited(m) => RelayError::RateLimited(m),
                                UpstreamError::Other(m) => RelayError::Upstream(m),
                                // ModelNotFound never reaches FatalError
                                UpstreamError::ModelNotFound(m) => RelayError::Upstream(m),
                            });
                        }
                        tracing::info!(model, "model unavailable, trying next candidate");
                    }
                }
            }
            FallbackState::Exhausted => return Err(RelayError::NoModelAvailable),
            // Success returns directly from the attempt above
            FallbackState::Success | FallbackState::FatalError => unreachable!(),
        }
    }
}
