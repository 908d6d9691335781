//! Taskbar icon and launcher-indicator bookkeeping.

use desktop_app_contract::AppKey;

use crate::model::{DesktopState, TaskbarIconRef, WindowId};
use crate::store::WindowInstanceStore;
use crate::window_manager::{first_visible_instance, oldest_instance};

/// Builds the stable render id for a per-instance taskbar icon.
pub fn taskbar_icon_id(app_key: &AppKey, serial: u64) -> String {
    format!("taskbar-icon-{app_key}-{serial}")
}

/// Returns every live per-instance taskbar icon, grouped per app in creation
/// order.
pub fn taskbar_icons(state: &DesktopState) -> Vec<&TaskbarIconRef> {
    state
        .store
        .iter()
        .filter_map(|w| w.taskbar_icon.as_ref())
        .collect()
}

/// Returns whether an app's shared launcher indicator should be lit.
pub fn launcher_indicator_visible(store: &WindowInstanceStore, app_key: &AppKey) -> bool {
    store
        .instances_of(app_key)
        .first()
        .map(|w| w.rules.stack)
        .unwrap_or(false)
        && store.count(app_key) > 0
}

/// Picks the window a taskbar icon press should focus: the first visible
/// instance, falling back to the first instance.
pub fn icon_press_target(store: &WindowInstanceStore, app_key: &AppKey) -> Option<WindowId> {
    first_visible_instance(store, app_key).or_else(|| oldest_instance(store, app_key))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn icon_ids_are_unique_per_instance() {
        let key = AppKey::trusted("os");
        assert_eq!(taskbar_icon_id(&key, 1), "taskbar-icon-os-1");
        assert_ne!(taskbar_icon_id(&key, 1), taskbar_icon_id(&key, 2));
    }
}
