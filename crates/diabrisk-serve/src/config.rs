use std::path::{Path, PathBuf};

use diabrisk_io::schema::{MODEL_FILE, SCALER_FILE};

/// Where to listen and which artifacts to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    host: String,
    port: u16,
    model_path: PathBuf,
    scaler_path: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            model_path: PathBuf::from(MODEL_FILE),
            scaler_path: PathBuf::from(SCALER_FILE),
        }
    }
}

impl ServeConfig {
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Port 0 asks the OS for a free port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    #[must_use]
    pub fn with_scaler_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scaler_path = path.into();
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    #[must_use]
    pub fn scaler_path(&self) -> &Path {
        &self.scaler_path
    }

    /// `host:port`, for logs and bind errors.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_artifact_names() {
        let config = ServeConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:8000");
        assert_eq!(config.model_path(), Path::new("diabetes_random_forest_balanced.bin"));
        assert_eq!(config.scaler_path(), Path::new("scaler.bin"));
    }

    #[test]
    fn builder_overrides() {
        let config = ServeConfig::default()
            .with_host("0.0.0.0")
            .with_port(9000)
            .with_model_path("/models/rf.bin")
            .with_scaler_path("/models/scaler.bin");
        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), 9000);
        assert_eq!(config.model_path(), Path::new("/models/rf.bin"));
        assert_eq!(config.scaler_path(), Path::new("/models/scaler.bin"));
    }
}
