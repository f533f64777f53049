//! Compile-time registry of upstream data services.
//!
//! Each provider is described by a TOML file under `services/`. The base
//! URL can be overridden at runtime through the environment variable named
//! in the file's `url_env` key.

use std::time::Duration;

use serde::Deserialize;

/// An upstream service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamService {
    /// Unique identifier (`"open_meteo"`, `"openaq"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Default endpoint URL.
    pub base_url: String,
    /// Environment variable that overrides [`Self::base_url`].
    pub url_env: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

impl UpstreamService {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns a copy with the base URL replaced by `override_url`, if it is
    /// set and non-empty.
    #[must_use]
    pub fn with_base_url(mut self, override_url: Option<String>) -> Self {
        if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    /// Applies the `url_env` override from the process environment.
    #[must_use]
    pub fn resolve_env(self) -> Self {
        let override_url = self
            .url_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok());
        self.with_base_url(override_url)
    }
}

/// Identifier of the Open-Meteo forecast service.
pub const OPEN_METEO: &str = "open_meteo";

/// Identifier of the `OpenAQ` latest-measurement service.
pub const OPENAQ: &str = "openaq";

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    (OPEN_METEO, include_str!("../services/open_meteo.toml")),
    (OPENAQ, include_str!("../services/openaq.toml")),
];

/// Returns all upstream service configurations, without env overrides.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed.
#[must_use]
pub fn all_services() -> Vec<UpstreamService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse upstream service '{name}': {e}"))
        })
        .collect()
}

/// Looks up a service by id and applies its environment override.
#[must_use]
pub fn service(id: &str) -> Option<UpstreamService> {
    all_services()
        .into_iter()
        .find(|s| s.id == id)
        .map(UpstreamService::resolve_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), SERVICE_TOMLS.len());
        for (id, _) in SERVICE_TOMLS {
            let svc = services.iter().find(|s| s.id == *id).unwrap();
            assert!(svc.base_url.starts_with("https://"), "{id}");
            assert_eq!(svc.timeout(), Duration::from_secs(10));
            assert!(svc.url_env.is_some());
        }
    }

    #[test]
    fn override_replaces_base_url() {
        let svc = all_services().remove(0);
        let original = svc.base_url.clone();

        let same = svc.clone().with_base_url(Some("   ".to_string()));
        assert_eq!(same.base_url, original);

        let moved = svc.with_base_url(Some("http://localhost:9000/forecast".to_string()));
        assert_eq!(moved.base_url, "http://localhost:9000/forecast");
    }
}
