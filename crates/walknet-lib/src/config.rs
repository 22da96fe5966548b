use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::nearest::ResolverKind;

/// Rows fetched per catalog page during a build.
pub const DEFAULT_PAGE_SIZE: usize = 5_000;

/// Loop tolerance used when the caller does not supply one.
pub const DEFAULT_TOLERANCE_PERCENT: f64 = 15.0;

pub const PAGE_SIZE_ENV: &str = "WALKNET_PAGE_SIZE";
pub const RESOLVER_ENV: &str = "WALKNET_RESOLVER";

/// Engine tunables shared by the CLI and the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub page_size: usize,
    pub resolver: ResolverKind,
    pub default_tolerance_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            resolver: ResolverKind::default(),
            default_tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `WALKNET_PAGE_SIZE` and `WALKNET_RESOLVER`.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(PAGE_SIZE_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => config.page_size = size,
                _ => warn!(value = %raw, "ignoring invalid {PAGE_SIZE_ENV}"),
            }
        }

        if let Some(raw) = lookup(RESOLVER_ENV) {
            match raw.parse::<ResolverKind>() {
                Ok(kind) => config.resolver = kind,
                Err(err) => warn!(error = %err, "ignoring invalid {RESOLVER_ENV}"),
            }
        }

        config
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverKind) -> Self {
        self.resolver = resolver;
        self
    }
}
