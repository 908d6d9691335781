//! Shared contract types between the desktop window-manager runtime and managed apps.
//!
//! This crate is the dependency floor of the workspace: app keys, per-app launch
//! rules, the content-backend selector, and the fixed capability interface a
//! loaded app module must implement to run inside a managed window.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier for a runtime-managed window instance.
pub type WindowRuntimeId = u64;

/// Stable identifier for an installable app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppKey(String);

impl AppKey {
    /// Returns an app key when `raw` conforms to the key policy.
    ///
    /// Keys are short ASCII slugs: lowercase letters, digits, and interior
    /// dashes, starting with a letter.
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_app_key(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!("invalid app key `{raw}`; expected a lowercase slug"))
        }
    }

    /// Creates a key without validation for compile-time trusted constants.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the string form of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_app_key(raw: &str) -> bool {
    if raw.is_empty() || raw.len() > 64 {
        return false;
    }
    let bytes = raw.as_bytes();
    if !bytes[0].is_ascii_lowercase() {
        return false;
    }
    if raw.ends_with('-') {
        return false;
    }
    bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Selects the content-loading strategy for an app's windows.
pub enum ContentBackend {
    /// Window body is fetched markup plus an optional app module.
    #[default]
    Web,
    /// Window body is a stream surface negotiated with the native-process host.
    Native,
}

/// Sentinel for [`AppRules::max_instances`] meaning "no bound".
pub const UNBOUNDED_INSTANCES: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Per-app launch rules resolved before any window of the app may be created.
///
/// Every field defaults, so a partial `app.properties.json` manifest merges
/// over the built-in defaults during deserialization.
pub struct AppRules {
    /// Maximum simultaneous windows; [`UNBOUNDED_INSTANCES`] lifts the bound.
    pub max_instances: i32,
    /// Group all instances under one launcher with a hover stack menu, instead
    /// of one taskbar icon per instance.
    pub stack: bool,
    /// Window exposes resize handles.
    pub resizable: bool,
    /// Window exposes a minimize control.
    pub minimizable: bool,
    /// Window exposes a maximize control.
    pub maximizable: bool,
    /// Launcher is pinned into the start surface.
    pub start_pin: bool,
    /// Launcher is pinned onto the taskbar.
    #[serde(rename = "addedTaskBar")]
    pub added_taskbar: bool,
    /// Capture and restore app-supplied session state across snapshots.
    pub session_state: bool,
    /// Content-loading strategy for this app.
    pub backend: ContentBackend,
    /// Icon identifier shown on launchers and taskbar icons.
    pub icon: String,
    /// Window title; falls back to the app key when empty.
    pub title: String,
}

impl Default for AppRules {
    fn default() -> Self {
        Self {
            max_instances: 1,
            stack: false,
            resizable: true,
            minimizable: true,
            maximizable: true,
            start_pin: false,
            added_taskbar: false,
            session_state: false,
            backend: ContentBackend::Web,
            icon: String::new(),
            title: String::new(),
        }
    }
}

impl AppRules {
    /// Returns whether the instance count is unbounded.
    pub fn unbounded_instances(&self) -> bool {
        self.max_instances == UNBOUNDED_INSTANCES
    }

    /// Returns whether another instance may open given `live` current windows.
    pub fn allows_another(&self, live: usize) -> bool {
        self.unbounded_instances() || live < self.max_instances.max(0) as usize
    }

    /// Returns the window title, defaulting to `app_key` when unset.
    pub fn title_for(&self, app_key: &AppKey) -> String {
        if self.title.is_empty() {
            app_key.as_str().to_string()
        } else {
            self.title.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Environment handed to an app module when one of its windows mounts.
pub struct WindowEnv<'a> {
    /// Runtime id of the hosting window.
    pub window_id: WindowRuntimeId,
    /// Key of the owning app.
    pub app_key: &'a AppKey,
}

/// Optional per-window hook letting an embedded app contribute and receive
/// opaque session state (form fields, scroll offsets) across snapshot/restore.
pub trait SessionStateHook {
    /// Captures the window's current session state, or `None` when there is
    /// nothing worth persisting.
    fn capture(&self) -> Option<Value>;

    /// Reapplies previously captured session state.
    fn restore(&self, state: &Value);
}

/// Teardown callback released when a window instance closes.
pub type AppTeardown = Box<dyn FnOnce()>;

/// Live bindings returned by [`AppModule::initialize`] for one window.
pub struct AppInstance {
    /// Runs when the hosting window closes.
    pub teardown: Option<AppTeardown>,
    /// Session-state bridge, honored only when the app's rules enable it.
    pub session: Option<Rc<dyn SessionStateHook>>,
}

impl AppInstance {
    /// An instance with no teardown and no session hook.
    pub fn empty() -> Self {
        Self {
            teardown: None,
            session: None,
        }
    }
}

/// Fixed capability interface for loaded app modules.
///
/// The runtime contract-checks this single well-known entry point at load time
/// instead of probing arbitrary exports; a module that cannot provide it fails
/// the load closed.
pub trait AppModule {
    /// Binds the module to a freshly mounted window.
    ///
    /// # Errors
    ///
    /// Returns a message when the module cannot initialize; the runtime
    /// surfaces it inside the affected window only.
    fn initialize(&self, env: WindowEnv<'_>) -> Result<AppInstance, String>;
}
