use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;

pub const PROXY_PREFIX: &str = "/api";

const DEFAULT_PRODUCTION_URL: &str = "https://postmanage.onrender.com/api";
const DEFAULT_DEVELOPMENT_URL: &str = "http://localhost:5203/api";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub environment: Environment,
    pub backend_override_url: Option<String>,
    pub backend_production_url: String,
    pub backend_development_url: String,
    pub api_url: String,
    pub use_api_proxy: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 =
            non_empty("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let environment =
            non_empty("APP_ENV").map(|v| Environment::parse(&v)).unwrap_or(Environment::Development);

        let backend_override_url = non_empty("BACKEND_API_URL");
        let backend_production_url = non_empty("BACKEND_PRODUCTION_URL")
            .unwrap_or_else(|| DEFAULT_PRODUCTION_URL.to_string());
        let backend_development_url = non_empty("BACKEND_DEVELOPMENT_URL")
            .unwrap_or_else(|| DEFAULT_DEVELOPMENT_URL.to_string());
        let api_url = non_empty("API_URL").unwrap_or_else(|| DEFAULT_DEVELOPMENT_URL.to_string());

        let use_api_proxy =
            non_empty("USE_API_PROXY").map(|v| v.trim() == "true").unwrap_or(false);

        let ip: IpAddr = host.parse().context("HOST")?;

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            environment,
            backend_override_url,
            backend_production_url,
            backend_development_url,
            api_url,
            use_api_proxy,
        })
    }

    // Explicit override first, then the environment default.
    pub fn backend_origin(&self) -> &str {
        if let Some(url) = &self.backend_override_url {
            return url;
        }
        match self.environment {
            Environment::Production => self.backend_production_url.as_str(),
            Environment::Development => self.backend_development_url.as_str(),
        }
    }

    pub fn client_base_url(&self) -> String {
        if !self.use_api_proxy {
            return self.api_url.clone();
        }
        let ip = if self.addr.ip().is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.addr.ip()
        };
        format!("http://{}{PROXY_PREFIX}", SocketAddr::new(ip, self.addr.port()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn defaults_to_development_direct_mode() {
        let config = load(&[]);
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.backend_origin(), DEFAULT_DEVELOPMENT_URL);
        assert!(!config.use_api_proxy);
        assert_eq!(config.client_base_url(), DEFAULT_DEVELOPMENT_URL);
    }

    #[test]
    fn production_selects_production_origin() {
        let config = load(&[("APP_ENV", "production")]);
        assert_eq!(config.backend_origin(), DEFAULT_PRODUCTION_URL);
    }

    #[test]
    fn override_beats_environment() {
        let config = load(&[
            ("APP_ENV", "production"),
            ("BACKEND_API_URL", "http://backend.internal/api"),
        ]);
        assert_eq!(config.backend_origin(), "http://backend.internal/api");
    }

    #[test]
    fn blank_override_is_ignored() {
        let config = load(&[("BACKEND_API_URL", "   ")]);
        assert_eq!(config.backend_origin(), DEFAULT_DEVELOPMENT_URL);
    }

    #[test]
    fn proxy_mode_points_client_at_loopback() {
        let config = load(&[("USE_API_PROXY", "true"), ("PORT", "8080")]);
        assert_eq!(config.client_base_url(), "http://127.0.0.1:8080/api");

        let config = load(&[("USE_API_PROXY", "true"), ("HOST", "10.0.0.5")]);
        assert_eq!(config.client_base_url(), "http://10.0.0.5:3000/api");
    }

    #[test]
    fn proxy_flag_requires_literal_true() {
        assert!(!load(&[("USE_API_PROXY", "yes")]).use_api_proxy);
        assert!(!load(&[("USE_API_PROXY", "1")]).use_api_proxy);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let result = Config::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }
}
