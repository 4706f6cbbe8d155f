//! The cat picture panel.
//!
//! Entirely independent of the list: it only reads and writes its own two
//! flags in local state and builds an image URL for the cat service.
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use crate::storage::{get_flag, keys, set_flag, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatWidget {
    opted_in: bool,
    animated: bool,
    selector: u64,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().rotate_left(20) ^ u64::from(d.subsec_nanos()))
        .unwrap_or(0)
}

impl CatWidget {
    /// Read preferences, recording the opt-in default on first run.
    ///
    /// Storage failures fall back to defaults (opted in, still pictures).
    pub async fn load<S: KeyValueStore>(store: &S) -> Self {
        let opted_in = match get_flag(store, keys::CAT_OPTED_IN).await {
            Ok(Some(v)) => v,
            Ok(None) => {
                if let Err(e) = set_flag(store, keys::CAT_OPTED_IN, true).await {
                    tracing::warn!(error = %e, "Failed to record cat opt-in default");
                }
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cat opt-in, assuming yes");
                true
            }
        };

        let animated = match get_flag(store, keys::CAT_ANIMATED).await {
            Ok(v) => v.unwrap_or(false),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read cat animation preference");
                false
            }
        };

        Self::with_state(opted_in, animated, clock_seed())
    }

    pub fn with_state(opted_in: bool, animated: bool, selector: u64) -> Self {
        Self {
            opted_in,
            animated,
            selector,
        }
    }

    pub fn opted_in(&self) -> bool {
        self.opted_in
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    pub fn selector(&self) -> u64 {
        self.selector
    }

    /// A different cat.
    pub fn reroll(&mut self) {
        self.selector = self.selector.wrapping_add(1);
    }

    /// Switch between pictures and gifs. Always shows a new cat.
    pub async fn toggle_animated<S: KeyValueStore>(&mut self, store: &S) -> Result<()> {
        self.animated = !self.animated;
        self.reroll();
        set_flag(store, keys::CAT_ANIMATED, self.animated).await
    }

    pub async fn opt_out<S: KeyValueStore>(&mut self, store: &S) -> Result<()> {
        self.opted_in = false;
        set_flag(store, keys::CAT_OPTED_IN, false).await
    }

    pub async fn opt_in<S: KeyValueStore>(&mut self, store: &S) -> Result<()> {
        self.opted_in = true;
        set_flag(store, keys::CAT_OPTED_IN, true).await
    }

    /// `<base>/cat?catIndex=N`, or `<base>/cat/gif?catIndex=N` when animated.
    pub fn image_url(&self, base: &str) -> String {
        format!(
            "{}/cat{}?catIndex={}",
            base.trim_end_matches('/'),
            if self.animated { "/gif" } else { "" },
            self.selector
        )
    }

    pub fn heading(&self) -> &'static str {
        if self.opted_in {
            "A picture of a cat"
        } else {
            "You have opted out of seeing cats"
        }
    }

    /// Label for the animation toggle.
    pub fn toggle_label(&self) -> &'static str {
        if self.animated {
            "I'd rather see cat pictures instead"
        } else {
            "I'd rather see cat gifs instead"
        }
    }
}
