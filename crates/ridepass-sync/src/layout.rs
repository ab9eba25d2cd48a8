//! # Print Layout Controller
//!
//! Holds the operator's margin and scale adjustments and persists the whole
//! settings object after every change. Preview and the physical print both
//! render through [`PrintLayoutController::layout`], so paper always matches
//! the last preview.

use std::sync::Arc;
use tracing::{debug, warn};

use ridepass_core::layout::{self, PrintSettings, TicketLayout};
use ridepass_core::TicketBundle;

use crate::error::SyncResult;
use crate::store::SettingsStore;

/// Settings key holding the layout.
pub const PRINT_SETTINGS_KEY: &str = "print_settings";

/// One drag adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutNudge {
    Top(f64),
    Bottom(f64),
    Shift(f64),
    Scale(f64),
}

pub struct PrintLayoutController {
    store: Arc<dyn SettingsStore>,
    settings: PrintSettings,
}

impl PrintLayoutController {
    /// Restores the last persisted settings, or the default when none were
    /// saved or the stored value does not decode.
    pub async fn load(store: Arc<dyn SettingsStore>) -> SyncResult<Self> {
        let settings = match store.get(PRINT_SETTINGS_KEY).await? {
            Some(raw) => match serde_json::from_str::<PrintSettings>(&raw) {
                Ok(s) => s.clamped(),
                Err(e) => {
                    warn!(error = %e, "Stored print settings unreadable, using defaults");
                    PrintSettings::default()
                }
            },
            None => PrintSettings::default(),
        };

        debug!(?settings, "Print layout loaded");
        Ok(PrintLayoutController { store, settings })
    }

    pub fn settings(&self) -> PrintSettings {
        self.settings
    }

    /// Applies `nudge` and persists the result.
    ///
    /// The in-memory value changes even if persisting fails.
    pub async fn adjust(&mut self, nudge: LayoutNudge) -> SyncResult<PrintSettings> {
        match nudge {
            LayoutNudge::Top(d) => self.settings.adjust_top(d),
            LayoutNudge::Bottom(d) => self.settings.adjust_bottom(d),
            LayoutNudge::Shift(d) => self.settings.adjust_shift(d),
            LayoutNudge::Scale(d) => self.settings.adjust_scale(d),
        }
        self.persist().await?;
        Ok(self.settings)
    }

    pub async fn adjust_top(&mut self, delta: f64) -> SyncResult<PrintSettings> {
        self.adjust(LayoutNudge::Top(delta)).await
    }

    pub async fn adjust_bottom(&mut self, delta: f64) -> SyncResult<PrintSettings> {
        self.adjust(LayoutNudge::Bottom(delta)).await
    }

    pub async fn adjust_shift(&mut self, delta: f64) -> SyncResult<PrintSettings> {
        self.adjust(LayoutNudge::Shift(delta)).await
    }

    pub async fn adjust_scale(&mut self, delta: f64) -> SyncResult<PrintSettings> {
        self.adjust(LayoutNudge::Scale(delta)).await
    }

    /// Restores the zeroed default and persists it.
    pub async fn reset(&mut self) -> SyncResult<PrintSettings> {
        self.settings = PrintSettings::default();
        self.persist().await?;
        Ok(self.settings)
    }

    /// Renders `bundle` with the current settings.
    pub fn layout(&self, bundle: &TicketBundle, is_preview: bool) -> TicketLayout {
        layout::render(bundle, &self.settings, is_preview)
    }

    async fn persist(&self) -> SyncResult<()> {
        let raw = serde_json::to_string(&self.settings)?;
        self.store.set(PRINT_SETTINGS_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySettingsStore;

    #[tokio::test]
    async fn test_adjustments_persist_and_reload() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        let mut controller = PrintLayoutController::load(store.clone()).await.unwrap();
        assert!(controller.settings().is_default());

        controller.adjust_top(12.0).await.unwrap();
        controller.adjust_bottom(4.0).await.unwrap();
        controller.adjust_shift(-8.0).await.unwrap();
        controller.adjust_scale(0.25).await.unwrap();
        let last = controller.settings();

        let reloaded = PrintLayoutController::load(store).await.unwrap();
        assert_eq!(reloaded.settings(), last);
        assert_eq!(last.top_offset, 12.0);
        assert_eq!(last.left_shift, -8.0);
        assert_eq!(last.scale, 1.25);
    }

    #[tokio::test]
    async fn test_clamps() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        let mut controller = PrintLayoutController::load(store).await.unwrap();

        let s = controller.adjust_top(-5.0).await.unwrap();
        assert_eq!(s.top_offset, 0.0);
        let s = controller.adjust_scale(3.0).await.unwrap();
        assert_eq!(s.scale, layout::MAX_SCALE);
        let s = controller.adjust_scale(-3.0).await.unwrap();
        assert_eq!(s.scale, layout::MIN_SCALE);
    }

    #[tokio::test]
    async fn test_reset_restores_default() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        let mut controller = PrintLayoutController::load(store.clone()).await.unwrap();
        controller.adjust_top(20.0).await.unwrap();
        controller.adjust_scale(-0.2).await.unwrap();

        let s = controller.reset().await.unwrap();
        assert_eq!(s, PrintSettings::default());

        let reloaded = PrintLayoutController::load(store).await.unwrap();
        assert!(reloaded.settings().is_default());
    }

    #[tokio::test]
    async fn test_unreadable_settings_fall_back_to_default() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        store.set(PRINT_SETTINGS_KEY, "not json").await.unwrap();
        let controller = PrintLayoutController::load(store).await.unwrap();
        assert!(controller.settings().is_default());
    }

    #[tokio::test]
    async fn test_out_of_range_stored_values_are_clamped() {
        let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::new());
        store
            .set(
                PRINT_SETTINGS_KEY,
                r#"{"topOffset":-3,"bottomOffset":2,"leftShift":5,"scale":9}"#,
            )
            .await
            .unwrap();
        let controller = PrintLayoutController::load(store).await.unwrap();
        let s = controller.settings();
        assert_eq!(s.top_offset, 0.0);
        assert_eq!(s.bottom_offset, 2.0);
        assert_eq!(s.scale, layout::MAX_SCALE);
    }
}
