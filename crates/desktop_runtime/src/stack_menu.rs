//! Stack-menu state and placement: the transient hover/click UI listing all
//! instances of one app.

use desktop_app_contract::AppKey;

use crate::model::{PointerPosition, WindowId, WindowRect};

/// Hover time over a stackable launcher before its menu opens.
pub const STACK_MENU_HOVER_OPEN_MS: u64 = 400;
/// Hover time over a menu item before the temp-unminimize phantom appears.
pub const TEMP_PREVIEW_HOVER_MS: u64 = 500;
/// Grace period after the pointer leaves both anchor and menu before the menu
/// dismisses, so the pointer can travel between them.
pub const STACK_MENU_DISMISS_GRACE_MS: u64 = 200;

/// Menu width in logical pixels.
pub const MENU_WIDTH: i32 = 256;
/// Height of one menu item (preview thumbnail plus chrome).
pub const MENU_ITEM_HEIGHT: i32 = 156;
/// Gap between the menu and its anchor.
pub const MENU_ANCHOR_GAP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Armed hover over one menu item, pending temp-unminimize.
pub struct ItemHover {
    /// Hovered window.
    pub window_id: WindowId,
    /// When the phantom preview activates.
    pub deadline: u64,
}

#[derive(Debug, Clone, PartialEq)]
/// The single system-wide stack menu.
///
/// Items are not stored here; the menu always reflects the instance store's
/// current order for its app.
pub struct StackMenuState {
    /// App whose instances are listed.
    pub app_key: AppKey,
    /// Anchor (launcher) rect the menu is positioned against.
    pub anchor: WindowRect,
    /// Computed top-left position of the menu.
    pub position: PointerPosition,
    /// Whether the pointer is over the anchor.
    pub over_anchor: bool,
    /// Whether the pointer is over the menu.
    pub over_menu: bool,
    /// Armed item hover, pending temp-unminimize.
    pub hover: Option<ItemHover>,
    /// Window currently shown as a temp-unminimize phantom, if any.
    pub temp_preview: Option<WindowId>,
    /// When the menu auto-dismisses; armed while the pointer is outside both
    /// anchor and menu.
    pub dismiss_deadline: Option<u64>,
}

impl StackMenuState {
    /// Creates a freshly opened menu for `app_key` with `item_count` entries.
    pub fn open(
        app_key: AppKey,
        anchor: WindowRect,
        viewport: WindowRect,
        item_count: usize,
    ) -> Self {
        Self {
            app_key,
            anchor,
            position: place_menu(anchor, item_count, viewport),
            over_anchor: true,
            over_menu: false,
            hover: None,
            temp_preview: None,
            dismiss_deadline: None,
        }
    }

    /// Returns whether the pointer is outside both the anchor and the menu.
    pub fn pointer_outside(&self) -> bool {
        !self.over_anchor && !self.over_menu
    }
}

/// Positions a menu of `item_count` entries relative to its anchor.
///
/// Prefers above the anchor, flips below when there is no headroom, and
/// clamps horizontally so the menu stays on-screen.
pub fn place_menu(anchor: WindowRect, item_count: usize, viewport: WindowRect) -> PointerPosition {
    let height = MENU_ITEM_HEIGHT * item_count.max(1) as i32;

    let above = anchor.y - height - MENU_ANCHOR_GAP;
    let y = if above >= viewport.y {
        above
    } else {
        anchor.y + anchor.h + MENU_ANCHOR_GAP
    };

    let max_x = (viewport.x + viewport.w - MENU_WIDTH).max(viewport.x);
    let x = anchor.x.clamp(viewport.x, max_x);

    PointerPosition { x, y }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VIEWPORT: WindowRect = WindowRect {
        x: 0,
        y: 0,
        w: 1280,
        h: 720,
    };

    fn anchor_at(x: i32, y: i32) -> WindowRect {
        WindowRect { x, y, w: 48, h: 40 }
    }

    #[test]
    fn menu_prefers_space_above_the_anchor() {
        let position = place_menu(anchor_at(300, 680), 2, VIEWPORT);
        assert_eq!(position.x, 300);
        assert_eq!(position.y, 680 - 2 * MENU_ITEM_HEIGHT - MENU_ANCHOR_GAP);
    }

    #[test]
    fn menu_flips_below_when_no_headroom() {
        let position = place_menu(anchor_at(300, 40), 3, VIEWPORT);
        assert_eq!(position.y, 40 + 40 + MENU_ANCHOR_GAP);
    }

    #[test]
    fn menu_clamps_to_the_right_viewport_edge() {
        let position = place_menu(anchor_at(1250, 680), 1, VIEWPORT);
        assert_eq!(position.x, VIEWPORT.w - MENU_WIDTH);
    }

    #[test]
    fn menu_clamps_to_the_left_viewport_edge() {
        let viewport = WindowRect {
            x: 100,
            ..VIEWPORT
        };
        let position = place_menu(anchor_at(20, 680), 1, viewport);
        assert_eq!(position.x, 100);
    }
}
