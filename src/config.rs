use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_h_path: PathBuf,
    pub model_v_path: PathBuf,
    pub log_predictions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            model_h_path: PathBuf::from("model_h.json"),
            model_v_path: PathBuf::from("model_v.json"),
            log_predictions: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let port = match get("PORT") {
            Some(s) => s.parse().unwrap_or_else(|_| {
                tracing::warn!("PORT={:?} is not a valid port; using {}", s, d.port);
                d.port
            }),
            None => d.port,
        };
        Self {
            host: get("HOST").unwrap_or(d.host),
            port,
            model_h_path: get("MODEL_H_PATH").map(PathBuf::from).unwrap_or(d.model_h_path),
            model_v_path: get("MODEL_V_PATH").map(PathBuf::from).unwrap_or(d.model_v_path),
            log_predictions: get("LOG_PRED").as_deref() == Some("1"),
        }
    }

    /// Listener target; hostnames are resolved by the bind itself.
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k: &str| m.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.bind_target(), ("0.0.0.0", 8000));
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9100"),
            ("MODEL_H_PATH", "/models/h.json"),
            ("MODEL_V_PATH", "/models/v.json"),
            ("LOG_PRED", "1"),
        ]));
        assert_eq!(cfg.bind_target(), ("127.0.0.1", 9100));
        assert_eq!(cfg.model_h_path, PathBuf::from("/models/h.json"));
        assert_eq!(cfg.model_v_path, PathBuf::from("/models/v.json"));
        assert!(cfg.log_predictions);
    }

    #[test]
    fn bad_port_falls_back() {
        let cfg = AppConfig::from_lookup(lookup(&[("PORT", "eighty"), ("LOG_PRED", "yes")]));
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert!(!cfg.log_predictions);
    }

    #[tokio::test]
    async fn hostname_hosts_are_bindable() {
        let cfg = AppConfig::from_lookup(lookup(&[("HOST", "localhost"), ("PORT", "0")]));
        assert_eq!(cfg.bind_target(), ("localhost", 0));
        let listener = tokio::net::TcpListener::bind(cfg.bind_target()).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
