/// Convenience result type used across demoline.
pub type DemolineResult<T> = Result<T, DemolineError>;

/// Top-level error taxonomy used by core APIs.
///
/// Scene faults (compile and runtime failures of user code) are not errors in this sense: they are
/// recorded on the scene and never abort a frame. Lookup misses are reported as `false`/`None`.
#[derive(thiserror::Error, Debug)]
pub enum DemolineError {
    /// Invalid user-provided data, or an update that would break a timeline invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failures configuring the scene scripting engine or its text support.
    #[error("script error: {0}")]
    Script(String),

    /// Errors while preparing surfaces or producing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Key-value store or document source failures.
    #[error("persistence error: {0}")]
    Persist(String),

    /// Errors when serializing or deserializing state.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DemolineError {
    /// Build a [`DemolineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DemolineError::Script`] value.
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    /// Build a [`DemolineError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`DemolineError::Persist`] value.
    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    /// Build a [`DemolineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for DemolineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
