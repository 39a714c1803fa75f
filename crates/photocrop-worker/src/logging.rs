//! Tracing setup and structured operation logging.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Install the global subscriber.
///
/// JSON output when `LOG_FORMAT=json`, colored text otherwise. `RUST_LOG`
/// directives are honoured on top of `photocrop=info`.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    // Target prefix match covers every photocrop_* crate.
    let mut env_filter = EnvFilter::from_default_env();
    if let Ok(directive) = "photocrop=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if use_json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()
    };

    if result.is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Logger tagging every event of one analysis run with its request id.
#[derive(Debug, Clone)]
pub struct OperationLogger {
    request_id: Uuid,
    operation: String,
}

impl OperationLogger {
    /// Create a logger with a fresh request id.
    pub fn new(operation: &str) -> Self {
        Self::with_id(Uuid::new_v4(), operation)
    }

    pub fn with_id(request_id: Uuid, operation: &str) -> Self {
        Self {
            request_id,
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Operation started: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Operation warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Operation error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            operation = %self.operation,
            "Operation completed: {}", message
        );
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the request id, for attaching to async work.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "analysis",
            request_id = %self.request_id,
            operation = %self.operation
        )
    }
}
