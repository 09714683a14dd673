use figment::providers::{Env, Format, Toml};
use figment::Figment;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::quota::QuotaConfig;

/// Process-wide quota configuration source. Readers take immutable
/// snapshots; `reload` publishes a fresh snapshot rather than mutating
/// fields in place, so in-flight requests never observe a half-updated
/// config.
pub struct QuotaProvider {
    current: RwLock<Arc<QuotaConfig>>,
}

impl QuotaProvider {
    /// Load from `docsift.toml` merged with `DOCSIFT_`-prefixed environment
    /// variables. Missing sources fall back to defaults.
    pub fn load() -> Result<Self> {
        Self::with_config(Self::fetch()?)
    }

    pub fn with_config(config: QuotaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(config)),
        })
    }

    fn fetch() -> Result<QuotaConfig> {
        Figment::new()
            .merge(Toml::file("docsift.toml"))
            .merge(Env::prefixed("DOCSIFT_"))
            .extract()
            .map_err(|e| AppError::Config(format!("Failed to load quota config: {}", e)))
    }

    pub fn snapshot(&self) -> Arc<QuotaConfig> {
        self.current
            .read()
            .expect("quota config lock poisoned")
            .clone()
    }

    /// Re-read the config sources and publish a new snapshot. An invalid
    /// config leaves the current snapshot in place.
    pub fn reload(&self) -> Result<()> {
        let fresh = Self::fetch()?;
        fresh.validate()?;
        info!("quota config reloaded");
        *self.current.write().expect("quota config lock poisoned") = Arc::new(fresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_snapshot_survives_provider_drop() {
        let provider = QuotaProvider::with_config(QuotaConfig::default()).unwrap();
        let held = provider.snapshot();
        assert_eq!(held.max_file_size_mb, 50.0);

        drop(provider);
        assert_eq!(held.max_extracted_chars, 1_000_000);
    }

    #[test]
    fn reload_publishes_new_snapshot() {
        figment::Jail::expect_with(|jail| {
            let provider = QuotaProvider::load().unwrap();
            let before = provider.snapshot();
            assert_eq!(before.max_file_size_mb, 50.0);

            jail.set_env("DOCSIFT_MAX_FILE_SIZE_MB", "75.0");
            provider.reload().unwrap();

            assert_eq!(provider.snapshot().max_file_size_mb, 75.0);
            // The snapshot taken before the reload is unchanged.
            assert_eq!(before.max_file_size_mb, 50.0);
            Ok(())
        });
    }

    #[test]
    fn invalid_reload_keeps_current_snapshot() {
        figment::Jail::expect_with(|jail| {
            let provider = QuotaProvider::load().unwrap();

            // warn > max violates validation; the published snapshot stays.
            jail.set_env("DOCSIFT_WARN_FILE_SIZE_MB", "500.0");
            assert!(provider.reload().is_err());
            assert_eq!(provider.snapshot().warn_file_size_mb, 25.0);
            Ok(())
        });
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = QuotaConfig {
            warn_file_size_mb: 100.0,
            ..QuotaConfig::default()
        };
        assert!(QuotaProvider::with_config(config).is_err());
    }
}
