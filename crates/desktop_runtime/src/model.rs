//! Core data model for the desktop window manager.

use std::collections::BTreeMap;

use desktop_app_contract::{AppKey, AppRules};
use platform_host::PreviewImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{stack_menu::StackMenuState, store::WindowInstanceStore, timers::ClickArbiter};

/// Default width for freshly opened windows.
pub const DEFAULT_WINDOW_WIDTH: i32 = 420;
/// Default height for freshly opened windows.
pub const DEFAULT_WINDOW_HEIGHT: i32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Unique identifier for one open window, stable for its lifetime.
///
/// Ids are generated from a session-scoped serial and are regenerated across
/// snapshot restore.
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Window geometry in logical desktop pixels.
pub struct WindowRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl WindowRect {
    /// Returns the rect translated by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Returns the rect with width/height floored at the given minimums.
    pub fn clamped_min(self, min_w: i32, min_h: i32) -> Self {
        Self {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..self
        }
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        // Fixed offset position for every new window; deliberately not
        // cascaded.
        Self {
            x: 70,
            y: 70,
            w: DEFAULT_WINDOW_WIDTH,
            h: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Load state of a window's body content.
pub enum ContentStatus {
    /// Content fetch or native negotiation is in flight.
    Loading,
    /// Web content is mounted.
    Ready {
        /// Markup for the window body.
        html: String,
    },
    /// Native stream surface is mounted.
    Streaming {
        /// Stream descriptor URL.
        stream_url: String,
    },
    /// The launch is deferred pending elevated-trust approval.
    AwaitingApproval,
    /// Loading failed; the window shows this diagnostic inline and stays
    /// fully operational otherwise.
    Failed {
        /// Diagnostic message shown in the window body.
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Weak back-reference from a window to its taskbar icon.
///
/// Stored as an id pair rather than a live reference; the icon element itself
/// belongs to the taskbar and is looked up on demand.
pub struct TaskbarIconRef {
    /// Stable DOM/render id of the icon.
    pub icon_id: String,
    /// Owning app.
    pub app_key: AppKey,
    /// Window the icon is bound to.
    pub window_id: WindowId,
}

#[derive(Debug, Clone, PartialEq)]
/// One open window and everything the manager tracks about it.
pub struct WindowRecord {
    /// Unique instance id.
    pub id: WindowId,
    /// Owning app.
    pub app_key: AppKey,
    /// Title shown in the window header.
    pub title: String,
    /// Icon identifier for launchers and taskbar icons.
    pub icon: String,
    /// Resolved launch rules; always present before the window exists.
    pub rules: AppRules,
    /// Current geometry.
    pub rect: WindowRect,
    /// Stacking position from the global monotonic counter.
    pub z_index: u64,
    /// Whether the window is minimized (hidden).
    pub minimized: bool,
    /// Whether the window fills the desktop area; orthogonal to focus.
    pub maximized: bool,
    /// When the window was last minimized, for click-to-restore ordering.
    pub minimized_at: Option<u64>,
    /// Cached preview bitmap, set on minimize or on demand.
    pub stored_preview: Option<PreviewImage>,
    /// Whether the window is currently shown as a temp-unminimize phantom.
    pub temp_preview: bool,
    /// Body content state.
    pub content: ContentStatus,
    /// Opaque app-supplied session state; `Null` when absent.
    pub session_state: Value,
    /// Taskbar icon binding for non-stacking apps.
    pub taskbar_icon: Option<TaskbarIconRef>,
}

impl WindowRecord {
    /// Returns whether the window occupies screen space right now.
    pub fn is_visible(&self) -> bool {
        !self.minimized
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Authoritative desktop session state.
pub struct DesktopState {
    /// All live windows, grouped per app in creation order.
    pub store: WindowInstanceStore,
    /// Global z counter; strictly increasing, so z ties are impossible.
    pub z_index_counter: u64,
    /// Serial for window-id generation.
    pub next_window_serial: u64,
    /// Whether the start menu is open.
    pub start_menu_open: bool,
    /// The single system-wide stack menu, when open.
    pub stack_menu: Option<StackMenuState>,
}

impl DesktopState {
    /// Allocates the next window id.
    pub fn next_window_id(&mut self) -> WindowId {
        self.next_window_serial = self.next_window_serial.saturating_add(1);
        WindowId(self.next_window_serial)
    }

    /// Bumps and returns the global z counter.
    pub fn next_z_index(&mut self) -> u64 {
        self.z_index_counter = self.z_index_counter.saturating_add(1);
        self.z_index_counter
    }

    /// Returns the visible window with the highest z, if any.
    pub fn top_window_id(&self) -> Option<WindowId> {
        self.store
            .iter()
            .filter(|w| w.is_visible())
            .max_by_key(|w| w.z_index)
            .map(|w| w.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Pointer position in logical desktop pixels.
pub struct PointerPosition {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Edge or corner grabbed during a resize.
pub enum ResizeEdge {
    /// Top edge.
    North,
    /// Bottom edge.
    South,
    /// Right edge.
    East,
    /// Left edge.
    West,
    /// Top-right corner.
    NorthEast,
    /// Top-left corner.
    NorthWest,
    /// Bottom-right corner.
    SouthEast,
    /// Bottom-left corner.
    SouthWest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An in-progress window drag.
pub struct DragSession {
    /// Window being dragged.
    pub window_id: WindowId,
    /// Pointer position at drag start.
    pub pointer_start: PointerPosition,
    /// Window rect at drag start.
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An in-progress window resize.
pub struct ResizeSession {
    /// Window being resized.
    pub window_id: WindowId,
    /// Edge or corner being dragged.
    pub edge: ResizeEdge,
    /// Pointer position at resize start.
    pub pointer_start: PointerPosition,
    /// Window rect at resize start.
    pub rect_start: WindowRect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Armed hover intent over a stackable launcher, pending menu open.
pub struct LauncherHover {
    /// Hovered app.
    pub app_key: AppKey,
    /// Launcher anchor rect for menu placement.
    pub anchor: WindowRect,
    /// Desktop viewport at hover time.
    pub viewport: WindowRect,
    /// When the menu should open.
    pub deadline: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Transient pointer/drag/resize/timer interaction state.
pub struct InteractionState {
    /// Active drag session.
    pub dragging: Option<DragSession>,
    /// Active resize session.
    pub resizing: Option<ResizeSession>,
    /// Per-launcher single/double click arbiters.
    pub launcher_clicks: BTreeMap<AppKey, ClickArbiter>,
    /// Armed launcher hover intent.
    pub launcher_hover: Option<LauncherHover>,
}
