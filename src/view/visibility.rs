//! Tracks whether a screen section is in view.
//!
//! The host reports the visible fraction of the section (0.0 to 1.0) through a
//! [`Viewport`]; a [`SectionObserver`] turns that stream into a visible flag.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fraction of a section that has to be on screen for it to count as visible.
pub const VISIBILITY_THRESHOLD: f64 = 0.1;

pub fn is_visible(ratio: f64, threshold: f64) -> bool {
    ratio > 0.0 && ratio >= threshold
}

#[derive(Debug)]
pub struct Viewport {
    ratio: watch::Sender<f64>,
}

impl Default for Viewport {
    fn default() -> Self {
        let (ratio, _) = watch::channel(0.0);
        Self { ratio }
    }
}

impl Viewport {
    pub fn report(&self, ratio: f64) {
        self.ratio.send_replace(ratio.clamp(0.0, 1.0));
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.ratio.subscribe()
    }
}

pub struct SectionObserver {
    visible: watch::Receiver<bool>,
    handle: JoinHandle<()>,
}

impl SectionObserver {
    pub fn observe(name: &'static str, mut ratios: watch::Receiver<f64>, threshold: f64) -> Self {
        let initial = is_visible(*ratios.borrow_and_update(), threshold);
        let (tx, visible) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            while ratios.changed().await.is_ok() {
                let now_visible = is_visible(*ratios.borrow_and_update(), threshold);
                let changed = tx.send_if_modified(|current| {
                    if *current == now_visible {
                        return false;
                    }
                    *current = now_visible;
                    true
                });
                if changed {
                    debug!(section = name, visible = now_visible, "Visibility changed");
                }
            }
        });

        Self { visible, handle }
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.clone()
    }

    /// Stops observing. The last known state stays readable.
    pub fn disconnect(&self) {
        self.handle.abort();
    }
}

impl Drop for SectionObserver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
