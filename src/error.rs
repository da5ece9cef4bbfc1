//! Error handling for the metaball surface engine
//!
//! Every fallible operation returns `EngineResult`. Capability and shader
//! failures are configuration preconditions and are reported once at
//! initialization; per-frame work has no error path.

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unsupported grid resolution {requested} (supported: 16, 32, 64, 128)")]
    UnsupportedResolution { requested: u32 },

    #[error("Unsupported blob count {requested} (supported: 1, 10, 50, 100)")]
    UnsupportedBlobCount { requested: u32 },

    #[error("Invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error("GPU is missing a required capability: {capability}")]
    MissingCapability { capability: String },

    #[error("Shader compilation failed for {label}: {error}")]
    ShaderCompilation { label: String, error: String },

    #[error("No compatible GPU adapter found")]
    AdapterNotFound,

    #[error("Device request failed: {0}")]
    DeviceRequest(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("IO error for {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config {path}: {error}")]
    ConfigParse { path: String, error: String },
}

/// Type alias for engine results
pub type EngineResult<T> = Result<T, EngineError>;

/// Extension trait for attaching a location to IO failures
pub trait ErrorContext<T> {
    fn io_context(self, path: &str) -> EngineResult<T>;
}

impl<T> ErrorContext<T> for Result<T, std::io::Error> {
    fn io_context(self, path: &str) -> EngineResult<T> {
        self.map_err(|e| EngineError::Io {
            path: path.to_string(),
            error: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::UnsupportedResolution { requested: 48 };
        assert_eq!(
            err.to_string(),
            "Unsupported grid resolution 48 (supported: 16, 32, 64, 128)"
        );
    }

    #[test]
    fn test_io_context() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        match result.io_context("surface.toml") {
            Err(EngineError::Io { path, .. }) => assert_eq!(path, "surface.toml"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
