//! Engine configuration.
//!
//! Reserved prop names and the re-render bound. Held per thread, like the
//! rest of the engine state; set it before the first render.
//!
//! # Example
//!
//! ```ignore
//! let config = Config::from_json(r#"{ "max_rerender_passes": 8 }"#)?;
//! set_config(config);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::Result;

/// Reconciler settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prop names treated as the class list.
    pub class_keys: Vec<String>,
    /// Prop name holding inline style (string or map).
    pub style_key: String,
    /// Prop name holding raw inner markup (string or `{ "__html": ... }`).
    pub raw_markup_key: String,
    /// Prefix marking event-handler props. The event name is the lower-cased rest.
    pub event_prefix: String,
    /// Upper bound on state-driven re-render rounds flushed after one pass.
    pub max_rerender_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            class_keys: vec!["class".to_string(), "className".to_string()],
            style_key: "style".to_string(),
            raw_markup_key: "dangerouslySetInnerHTML".to_string(),
            event_prefix: "on".to_string(),
            max_rerender_passes: 64,
        }
    }
}

impl Config {
    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_class_key(&self, key: &str) -> bool {
        self.class_keys.iter().any(|k| k == key)
    }

    /// Event name for an event-handler prop key, e.g. `onClick` → `click`.
    ///
    /// `None` when the key lacks the prefix or has nothing after it.
    pub fn event_name(&self, key: &str) -> Option<String> {
        let rest = key.strip_prefix(self.event_prefix.as_str())?;
        if rest.is_empty() || self.event_prefix.is_empty() {
            return None;
        }
        Some(rest.to_lowercase())
    }
}

thread_local! {
    static CONFIG: RefCell<Rc<Config>> = RefCell::new(Rc::new(Config::default()));
}

/// Current configuration.
pub fn config() -> Rc<Config> {
    CONFIG.with(|c| c.borrow().clone())
}

/// Replace the configuration for this thread.
pub fn set_config(config: Config) {
    tracing::debug!(?config, "config replaced");
    CONFIG.with(|c| *c.borrow_mut() = Rc::new(config));
}

/// Restore defaults (for testing).
pub fn reset_config() {
    CONFIG.with(|c| *c.borrow_mut() = Rc::new(Config::default()));
}
