use anyhow::{Context, Result};
use delay_model::ModelPaths;
use serde::Deserialize;
use std::{fs, path::{Path, PathBuf}};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub encoder_path: PathBuf,
    pub model_path: PathBuf,
    /// Log a feature summary for every predict request.
    pub log_pred: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let paths = delay_model::default_paths("artifacts");
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            encoder_path: paths.encoder,
            model_path: paths.classifier,
            log_pred: false,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// `CONFIG_PATH` file (if set), then environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = match lookup("CONFIG_PATH") {
            Some(p) => Self::load(Path::new(&p))?,
            None => Self::default(),
        };

        if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().with_context(|| format!("invalid PORT '{}'", port))?;
            cfg.bind_addr = format!("0.0.0.0:{}", port);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            cfg.bind_addr = addr;
        }
        if let Some(p) = lookup("ENCODER_PATH") {
            cfg.encoder_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("MODEL_PATH") {
            cfg.model_path = PathBuf::from(p);
        }
        if let Some(v) = lookup("LOG_PRED") {
            cfg.log_pred = v == "1";
        }
        Ok(cfg)
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths {
            encoder: self.encoder_path.clone(),
            classifier: self.model_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = ServiceConfig::resolve(env(&[])).unwrap();
        assert_eq!(cfg, ServiceConfig::default());
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn environment_overrides() {
        let cfg = ServiceConfig::resolve(env(&[
            ("PORT", "9000"),
            ("MODEL_PATH", "/models/lr.bin"),
            ("LOG_PRED", "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert_eq!(cfg.model_paths().classifier, PathBuf::from("/models/lr.bin"));
        assert!(cfg.log_pred);
    }

    #[test]
    fn bind_addr_wins_over_port() {
        let cfg = ServiceConfig::resolve(env(&[("PORT", "9000"), ("BIND_ADDR", "127.0.0.1:7000")])).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:7000");
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(ServiceConfig::resolve(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn config_file_is_merged_under_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"bind_addr":"127.0.0.1:5000","encoder_path":"/m/enc.bin"}"#).unwrap();
        let cfg = ServiceConfig::resolve(env(&[
            ("CONFIG_PATH", path.to_str().unwrap()),
            ("LOG_PRED", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:5000");
        assert_eq!(cfg.encoder_path, PathBuf::from("/m/enc.bin"));
        assert_eq!(cfg.model_path, ServiceConfig::default().model_path);
        assert!(!cfg.log_pred);
    }
}
