//! Endpoint configuration.
//!
//! # Design
//! `EndpointConfig` keeps `host`, `port` and `path` private so the derived
//! `full` string can only change through [`EndpointConfig::apply`], which
//! recomputes it. `EndpointOptions` is the partial form callers pass to
//! `RequestFormatter::init`: unset fields leave the current value alone.

use serde::Deserialize;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: &str = "8000";

/// Partial endpoint configuration. Every field is optional; `None` means
/// "keep what is already configured".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointOptions {
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
}

impl EndpointOptions {
    /// Read `KIOKU_HOST`, `KIOKU_PORT` and `KIOKU_PATH` from the environment.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("KIOKU_HOST").ok(),
            port: std::env::var("KIOKU_PORT").ok(),
            path: std::env::var("KIOKU_PATH").ok(),
        }
    }
}

/// Where the embedding transport should send requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    host: String,
    port: Option<String>,
    path: Option<String>,
    full: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        let mut endpoint = Self {
            host: DEFAULT_HOST.to_string(),
            port: Some(DEFAULT_PORT.to_string()),
            path: None,
            full: String::new(),
        };
        endpoint.full = endpoint.compose();
        endpoint
    }
}

impl EndpointConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// `host[:port]/[path/]`
    pub fn full(&self) -> &str {
        &self.full
    }

    /// Merge the set fields of `options` and recompute `full`.
    pub fn apply(&mut self, options: &EndpointOptions) -> &str {
        if let Some(host) = &options.host {
            self.host = host.clone();
        }
        if let Some(port) = &options.port {
            self.port = normalize_port(port);
        }
        if let Some(path) = &options.path {
            self.path = normalize_path(path);
        }
        self.full = self.compose();
        &self.full
    }

    fn compose(&self) -> String {
        let mut full = self.host.clone();
        if let Some(port) = &self.port {
            full.push(':');
            full.push_str(port);
        }
        full.push('/');
        if let Some(path) = &self.path {
            full.push_str(path);
            full.push('/');
        }
        full
    }
}

// A leading ':' is accepted so ":8000" and "8000" configure the same port.
fn normalize_port(port: &str) -> Option<String> {
    let port = port.strip_prefix(':').unwrap_or(port);
    (!port.is_empty()).then(|| port.to_string())
}

fn normalize_path(path: &str) -> Option<String> {
    let path = path.trim_matches('/');
    (!path.is_empty()).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(host: Option<&str>, port: Option<&str>, path: Option<&str>) -> EndpointOptions {
        EndpointOptions {
            host: host.map(str::to_string),
            port: port.map(str::to_string),
            path: path.map(str::to_string),
        }
    }

    #[test]
    fn defaults_render_localhost_8000() {
        assert_eq!(EndpointConfig::default().full(), "localhost:8000/");
    }

    #[test]
    fn colon_prefixed_port_is_not_doubled() {
        let mut endpoint = EndpointConfig::default();
        let full = endpoint.apply(&options(Some("localhost"), Some(":8000"), None));
        assert_eq!(full, "localhost:8000/");
    }

    #[test]
    fn empty_port_removes_it() {
        let mut endpoint = EndpointConfig::default();
        endpoint.apply(&options(Some("api.example.com"), Some(""), Some("v1")));
        assert_eq!(endpoint.full(), "api.example.com/v1/");
        assert_eq!(endpoint.port(), None);
    }

    #[test]
    fn unset_fields_keep_prior_values() {
        let mut endpoint = EndpointConfig::default();
        endpoint.apply(&options(Some("kioku.local"), Some("9000"), Some("api/v1")));
        endpoint.apply(&options(None, None, None));
        assert_eq!(endpoint.full(), "kioku.local:9000/api/v1/");

        endpoint.apply(&options(Some("other"), None, None));
        assert_eq!(endpoint.full(), "other:9000/api/v1/");
    }

    #[test]
    fn path_slashes_are_trimmed() {
        let mut endpoint = EndpointConfig::default();
        endpoint.apply(&options(None, None, Some("/api/v1/")));
        assert_eq!(endpoint.path(), Some("api/v1"));
        assert_eq!(endpoint.full(), "localhost:8000/api/v1/");

        endpoint.apply(&options(None, None, Some("/")));
        assert_eq!(endpoint.path(), None);
        assert_eq!(endpoint.full(), "localhost:8000/");
    }

    #[test]
    fn options_deserialize_with_missing_fields() {
        let parsed: EndpointOptions = serde_json::from_str(r#"{"host":"h"}"#).unwrap();
        assert_eq!(parsed, options(Some("h"), None, None));
    }
}
