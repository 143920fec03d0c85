//! Preference store
//!
//! Single source of truth for the accessibility settings. Every setter updates
//! the in-memory snapshot, writes through to durable storage and re-applies the
//! document root styling. When storage fails the store keeps working from
//! memory for the rest of the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::model::{parse_flag, FontScale, Preferences, Theme};
use super::root::{apply_preferences, DocumentRoot};
use super::storage::{PreferenceStorage, FONT_SIZE_KEY, REDUCED_MOTION_KEY, THEME_KEY};
use crate::{Error, Result};

struct Inner {
    storage: Arc<dyn PreferenceStorage>,
    root: Arc<dyn DocumentRoot>,
    state: watch::Sender<Preferences>,
    persistent: AtomicBool,
}

#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<Inner>,
}

impl PreferenceStore {
    /// Read persisted values, falling back to defaults, and style the root
    pub async fn load(storage: Arc<dyn PreferenceStorage>, root: Arc<dyn DocumentRoot>) -> Self {
        let (state, _) = watch::channel(Preferences::default());
        let store = Self {
            inner: Arc::new(Inner {
                storage,
                root,
                state,
                persistent: AtomicBool::new(true),
            }),
        };

        let theme = store
            .read(THEME_KEY)
            .await
            .and_then(|raw| parse_or_default(THEME_KEY, raw.parse::<Theme>()));
        let font_size = store
            .read(FONT_SIZE_KEY)
            .await
            .and_then(|raw| parse_or_default(FONT_SIZE_KEY, raw.parse::<FontScale>()));
        let reduced_motion = store
            .read(REDUCED_MOTION_KEY)
            .await
            .and_then(|raw| parse_or_default(REDUCED_MOTION_KEY, parse_flag("reducedMotion", &raw)));

        let prefs = Preferences {
            theme: theme.unwrap_or_default(),
            font_size: font_size.unwrap_or_default(),
            reduced_motion: reduced_motion.unwrap_or_default(),
        };
        store.inner.state.send_replace(prefs);
        apply_preferences(store.inner.root.as_ref(), &prefs);
        debug!("Loaded preferences: {:?}", prefs);
        store
    }

    /// Current snapshot
    pub fn get(&self) -> Preferences {
        *self.inner.state.borrow()
    }

    /// Receive every changed snapshot
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.inner.state.subscribe()
    }

    /// Whether writes still reach durable storage
    pub fn is_persistent(&self) -> bool {
        self.inner.persistent.load(Ordering::Acquire)
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.update(|p| p.theme = theme);
        self.write(THEME_KEY, theme.as_str()).await;
    }

    pub async fn set_font_size(&self, font_size: FontScale) {
        self.update(|p| p.font_size = font_size);
        self.write(FONT_SIZE_KEY, font_size.as_str()).await;
    }

    pub async fn set_reduced_motion(&self, reduced_motion: bool) {
        self.update(|p| p.reduced_motion = reduced_motion);
        self.write(REDUCED_MOTION_KEY, if reduced_motion { "true" } else { "false" })
            .await;
    }

    /// Set one preference from its wire name (`theme`, `fontSize`,
    /// `reducedMotion`). Invalid values leave the state untouched.
    pub async fn set_from_str(&self, key: &str, value: &str) -> Result<()> {
        match key {
            "theme" => self.set_theme(value.parse()?).await,
            "fontSize" => self.set_font_size(value.parse()?).await,
            "reducedMotion" => {
                self.set_reduced_motion(parse_flag("reducedMotion", value)?)
                    .await
            }
            other => {
                return Err(Error::validation(
                    "preference",
                    format!("unknown preference '{}'", other),
                ))
            }
        }
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Preferences)) {
        let changed = self.inner.state.send_if_modified(|prefs| {
            let before = *prefs;
            apply(prefs);
            *prefs != before
        });
        apply_preferences(self.inner.root.as_ref(), &self.get());
        if changed {
            debug!("Preferences changed: {:?}", self.get());
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        if !self.is_persistent() {
            return None;
        }
        match self.inner.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                self.degrade(&e);
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if !self.is_persistent() {
            return;
        }
        if let Err(e) = self.inner.storage.set(key, value).await {
            self.degrade(&e);
        }
    }

    fn degrade(&self, error: &Error) {
        if self.inner.persistent.swap(false, Ordering::AcqRel) {
            warn!("Preference storage unavailable, keeping settings in memory: {}", error);
        }
    }
}

fn parse_or_default<T>(key: &str, parsed: Result<T>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring stored {}: {}", key, e);
            None
        }
    }
}
