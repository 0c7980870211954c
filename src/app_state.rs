// =============================================================================
// Central Application State
// =============================================================================
//
// Shared across all request handlers via `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free call accounting.
//   - parking_lot::RwLock around the runtime config; handlers clone a
//     snapshot and never hold the lock while computing.
//   - The fee table is immutable after construction and shared by `Arc`.
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::fees::FeeTable;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    /// Where config updates are persisted; `None` keeps them in memory only.
    config_path: Option<PathBuf>,

    // ── Reference data ──────────────────────────────────────────────────
    pub fee_table: Arc<FeeTable>,

    // ── Accounting ──────────────────────────────────────────────────────
    calls_served: AtomicU64,

    /// Instant when the server was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct the state.  The returned value is typically wrapped in
    /// `Arc` immediately.
    pub fn new(config: RuntimeConfig, config_path: Option<PathBuf>) -> Self {
        let fee_table = Arc::new(FeeTable::standard());
        info!(
            config_path = ?config_path,
            fee_tiers = fee_table.tiers().len(),
            "AppState initialised"
        );

        Self {
            runtime_config: Arc::new(RwLock::new(config)),
            config_path,
            fee_table,
            calls_served: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    /// Clone of the current configuration.
    pub fn config_snapshot(&self) -> RuntimeConfig {
        self.runtime_config.read().clone()
    }

    /// Count a completed tool call; returns the new total.
    pub fn record_call(&self) -> u64 {
        self.calls_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn calls_served(&self) -> u64 {
        self.calls_served.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Apply a partial update and persist it (best-effort).
    ///
    /// The merged config must deserialise and pass
    /// [`RuntimeConfig::validate`]; a rejected patch leaves the current
    /// config untouched.  The write lock is held through the save so the
    /// file always matches the last update applied in memory.
    pub fn update_config(&self, patch: &serde_json::Value) -> anyhow::Result<RuntimeConfig> {
        let mut config = self.runtime_config.write();
        let updated = config.merged(patch)?;
        *config = updated.clone();

        info!(patch = %patch, "Runtime config updated");

        if let Some(path) = &self.config_path {
            if let Err(e) = updated.save(path) {
                warn!(error = %e, "Failed to save runtime config to disk");
            }
        }
        drop(config);

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_counter() {
        let state = AppState::new(RuntimeConfig::default(), None);
        assert_eq!(state.calls_served(), 0);
        assert_eq!(state.record_call(), 1);
        assert_eq!(state.record_call(), 2);
        assert_eq!(state.calls_served(), 2);
    }

    #[test]
    fn config_update_is_visible_in_snapshot() {
        let state = AppState::new(RuntimeConfig::default(), None);
        let updated = state
            .update_config(&serde_json::json!({ "default_rsi_period": 9 }))
            .unwrap();
        assert_eq!(updated.default_rsi_period, 9);
        assert_eq!(state.config_snapshot().default_rsi_period, 9);
    }

    #[test]
    fn out_of_domain_update_is_rejected() {
        let state = AppState::new(RuntimeConfig::default(), None);
        let patch = serde_json::json!({
            "default_rsi_period": 0,
            "default_range_percent": -5.0,
            "screener": { "max_spread": -1.0, "limit": 0 }
        });
        assert!(state.update_config(&patch).is_err());
        assert_eq!(state.config_snapshot(), RuntimeConfig::default());
    }

    #[test]
    fn concurrent_updates_leave_disk_matching_memory() {
        let path = std::env::temp_dir().join(format!("kub_config_{}.json", uuid::Uuid::new_v4()));
        let state = Arc::new(AppState::new(RuntimeConfig::default(), Some(path.clone())));

        let handles: Vec<_> = (1..=8usize)
            .map(|period| {
                let state = state.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        state
                            .update_config(&serde_json::json!({ "default_rsi_period": period }))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let on_disk = RuntimeConfig::load(&path).unwrap();
        assert_eq!(on_disk, state.config_snapshot());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn bad_update_leaves_config_untouched() {
        let state = AppState::new(RuntimeConfig::default(), None);
        assert!(state
            .update_config(&serde_json::json!({ "screener": { "limit": -1 } }))
            .is_err());
        assert_eq!(state.config_snapshot(), RuntimeConfig::default());
    }
}
