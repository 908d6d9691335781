//! Desktop snapshot wire format and build/apply helpers.
//!
//! Snapshots round-trip the multiset of open apps, their geometry, their
//! minimized/maximized flags, and relative z-order. Instance ids do not
//! survive a restore; they are regenerated while relative stacking order is
//! preserved by re-opening entries in ascending z order.

use desktop_app_contract::AppKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{DesktopState, WindowRect};

/// Schema version for the persisted desktop snapshot payload.
pub const DESKTOP_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Persistable fields of one window.
pub struct WindowSnapshotEntry {
    /// Owning app.
    pub app_key: AppKey,
    /// Instance id at save time; informational only.
    pub instance_id: String,
    /// Top edge as a CSS pixel string.
    pub top: String,
    /// Left edge as a CSS pixel string.
    pub left: String,
    /// Width as a CSS pixel string.
    pub width: String,
    /// Height as a CSS pixel string.
    pub height: String,
    /// Minimized flag.
    pub minimized: bool,
    /// Maximized flag.
    pub maximized: bool,
    /// Stacking position at save time.
    pub z_index: u64,
    /// Cached preview, persisted only for minimized windows.
    #[serde(default)]
    pub preview: Option<String>,
    /// App-supplied session state; opaque to the snapshotter.
    #[serde(default)]
    pub session_state: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Persisted desktop layout.
pub struct DesktopSnapshot {
    /// One entry per live window.
    pub windows: Vec<WindowSnapshotEntry>,
    /// Global z counter at save time.
    pub z_index_counter: u64,
}

/// Formats a logical pixel value as a CSS pixel string.
pub fn format_px(value: i32) -> String {
    format!("{value}px")
}

/// Parses a CSS pixel string, tolerating a missing `px` suffix.
pub fn parse_px(raw: &str) -> Option<i32> {
    raw.trim().trim_end_matches("px").trim().parse().ok()
}

/// Gathers every live window's persistable fields into a snapshot.
pub fn build_snapshot(state: &DesktopState) -> DesktopSnapshot {
    let windows = state
        .store
        .iter()
        .map(|window| WindowSnapshotEntry {
            app_key: window.app_key.clone(),
            instance_id: window.id.to_string(),
            top: format_px(window.rect.y),
            left: format_px(window.rect.x),
            width: format_px(window.rect.w),
            height: format_px(window.rect.h),
            minimized: window.minimized,
            maximized: window.maximized,
            z_index: window.z_index,
            preview: window
                .minimized
                .then(|| window.stored_preview.clone())
                .flatten(),
            session_state: (window.rules.session_state && !window.session_state.is_null())
                .then(|| window.session_state.clone()),
        })
        .collect();

    DesktopSnapshot {
        windows,
        z_index_counter: state.z_index_counter,
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One window to re-open during restore, in stacking order.
pub struct RestorePlanEntry {
    /// App to open.
    pub app_key: AppKey,
    /// Persisted geometry.
    pub rect: WindowRect,
    /// Minimized flag.
    pub minimized: bool,
    /// Maximized flag.
    pub maximized: bool,
    /// Cached preview to seed.
    pub preview: Option<String>,
    /// Session state to reapply after content load.
    pub session_state: Option<Value>,
}

/// Orders snapshot entries by ascending z so re-opening them reproduces the
/// original relative stacking.
pub fn restore_plan(snapshot: DesktopSnapshot) -> Vec<RestorePlanEntry> {
    let mut windows = snapshot.windows;
    windows.sort_by_key(|entry| entry.z_index);
    windows
        .into_iter()
        .map(|entry| {
            let default = WindowRect::default();
            RestorePlanEntry {
                app_key: entry.app_key,
                rect: WindowRect {
                    x: parse_px(&entry.left).unwrap_or(default.x),
                    y: parse_px(&entry.top).unwrap_or(default.y),
                    w: parse_px(&entry.width).unwrap_or(default.w),
                    h: parse_px(&entry.height).unwrap_or(default.h),
                },
                minimized: entry.minimized,
                maximized: entry.maximized,
                preview: entry.preview,
                session_state: entry.session_state,
            }
        })
        .collect()
}
