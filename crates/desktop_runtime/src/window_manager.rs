//! Shared window-manager transition helpers used by the desktop reducer.

use desktop_app_contract::AppKey;

use crate::model::{DesktopState, ResizeEdge, WindowId, WindowRect};
use crate::store::WindowInstanceStore;

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 200;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 100;

/// Focuses and raises `window_id`: unminimizes it, clears any temp-preview
/// styling, and assigns the next value of the global z counter.
///
/// Focus never changes the maximized flag. Returns `false` when the window is
/// gone.
pub fn raise_window(state: &mut DesktopState, window_id: WindowId) -> bool {
    let z = state.next_z_index();
    let Some(window) = state.store.find_mut(window_id) else {
        // The counter advanced for a missing window; harmless, it only has to
        // stay strictly increasing.
        return false;
    };
    window.minimized = false;
    window.minimized_at = None;
    window.temp_preview = false;
    window.z_index = z;
    true
}

/// Returns the rect for a fresh (or un-maximized) window.
///
/// Leaving maximized does not restore the pre-maximize geometry; windows
/// return to this fixed default.
pub fn default_rect() -> WindowRect {
    WindowRect::default()
}

/// Applies resize deltas for a given edge/corner drag.
pub fn resize_rect(start: WindowRect, edge: ResizeEdge, dx: i32, dy: i32) -> WindowRect {
    match edge {
        ResizeEdge::East => WindowRect {
            w: start.w + dx,
            ..start
        },
        ResizeEdge::West => WindowRect {
            x: start.x + dx,
            w: start.w - dx,
            ..start
        },
        ResizeEdge::South => WindowRect {
            h: start.h + dy,
            ..start
        },
        ResizeEdge::North => WindowRect {
            y: start.y + dy,
            h: start.h - dy,
            ..start
        },
        ResizeEdge::NorthEast => WindowRect {
            y: start.y + dy,
            h: start.h - dy,
            w: start.w + dx,
            ..start
        },
        ResizeEdge::NorthWest => WindowRect {
            x: start.x + dx,
            y: start.y + dy,
            w: start.w - dx,
            h: start.h - dy,
        },
        ResizeEdge::SouthEast => WindowRect {
            w: start.w + dx,
            h: start.h + dy,
            ..start
        },
        ResizeEdge::SouthWest => WindowRect {
            x: start.x + dx,
            w: start.w - dx,
            h: start.h + dy,
            ..start
        },
    }
}

/// Returns the oldest (first-created) live instance of an app.
///
/// This is the instance focused when the app is at its instance cap.
pub fn oldest_instance(store: &WindowInstanceStore, app_key: &AppKey) -> Option<WindowId> {
    store.instances_of(app_key).first().map(|w| w.id)
}

/// Returns the first visible instance of an app in creation order.
pub fn first_visible_instance(store: &WindowInstanceStore, app_key: &AppKey) -> Option<WindowId> {
    store
        .instances_of(app_key)
        .iter()
        .find(|w| w.is_visible())
        .map(|w| w.id)
}

/// Returns the most recently minimized instance of an app, by `minimized_at`
/// descending.
pub fn most_recently_minimized(store: &WindowInstanceStore, app_key: &AppKey) -> Option<WindowId> {
    store
        .instances_of(app_key)
        .iter()
        .filter(|w| w.minimized)
        .max_by_key(|w| w.minimized_at.unwrap_or(0))
        .map(|w| w.id)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resize_rect_moves_opposite_edges_correctly() {
        let start = WindowRect {
            x: 100,
            y: 100,
            w: 400,
            h: 300,
        };

        let east = resize_rect(start, ResizeEdge::East, 20, 0);
        assert_eq!((east.x, east.w), (100, 420));

        let west = resize_rect(start, ResizeEdge::West, 20, 0);
        assert_eq!((west.x, west.w), (120, 380));

        let north_west = resize_rect(start, ResizeEdge::NorthWest, -10, -15);
        assert_eq!(
            (north_west.x, north_west.y, north_west.w, north_west.h),
            (90, 85, 410, 315)
        );

        let south_east = resize_rect(start, ResizeEdge::SouthEast, 30, 40);
        assert_eq!((south_east.w, south_east.h), (430, 340));
    }
}
