// src/infra/errors.rs — Error types for hotloop

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotloopError {
    // Resource errors (fatal at open time)
    #[error("Resource '{resource}' not found{}", did_you_mean(.suggestions))]
    ResourceNotFound {
        resource: String,
        suggestions: Vec<String>,
    },

    // Reload errors (previous good state is kept)
    #[error("Failed to compile '{resource}': {message}")]
    Compilation { resource: String, message: String },

    #[error("Failed to instantiate '{resource}': {message}")]
    Instantiation { resource: String, message: String },

    // Script errors
    #[error("Evaluation of '{resource}' failed: {message}")]
    Evaluation { resource: String, message: String },

    #[error("Call to '{method}' on '{resource}' failed: {message}")]
    Invocation {
        resource: String,
        method: String,
        message: String,
    },

    #[error("Setup failed: {0}")]
    Setup(String),

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HotloopError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        HotloopError::ResourceNotFound {
            resource: resource.into(),
            suggestions: Vec::new(),
        }
    }

    /// Errors a running loop or poller reports and then carries on from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HotloopError::Compilation { .. }
                | HotloopError::Instantiation { .. }
                | HotloopError::Evaluation { .. }
                | HotloopError::Invocation { .. }
        )
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
