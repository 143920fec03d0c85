//! Global styling hooks on the document root

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::model::Preferences;

pub const THEME_ATTRIBUTE: &str = "data-theme";
pub const FONT_SIZE_ATTRIBUTE: &str = "data-font-size";
pub const REDUCE_MOTION_CLASS: &str = "reduce-motion";

/// The element global styles hang off. Both operations must be idempotent.
pub trait DocumentRoot: Send + Sync {
    fn set_attribute(&self, name: &str, value: &str);
    fn set_class(&self, class: &str, enabled: bool);
}

/// Write every preference onto `root`
pub fn apply_preferences(root: &dyn DocumentRoot, prefs: &Preferences) {
    root.set_attribute(THEME_ATTRIBUTE, prefs.theme.as_str());
    root.set_attribute(FONT_SIZE_ATTRIBUTE, prefs.font_size.as_str());
    root.set_class(REDUCE_MOTION_CLASS, prefs.reduced_motion);
}

/// Attributes and classes as last applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RootSnapshot {
    pub attributes: BTreeMap<String, String>,
    pub classes: BTreeSet<String>,
}

/// Headless document root that records what was applied
#[derive(Default)]
pub struct RootStyle {
    snapshot: Mutex<RootSnapshot>,
}

impl RootStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RootSnapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentRoot for RootStyle {
    fn set_attribute(&self, name: &str, value: &str) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        snapshot
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_class(&self, class: &str, enabled: bool) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        if enabled {
            snapshot.classes.insert(class.to_string());
        } else {
            snapshot.classes.remove(class);
        }
    }
}
