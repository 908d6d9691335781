//! In-memory window-instance store: the single source of truth for what is
//! open.

use std::collections::BTreeMap;

use desktop_app_contract::AppKey;

use crate::model::{WindowId, WindowRecord};

#[derive(Debug, Clone, Default, PartialEq)]
/// Mapping from app key to its live windows in creation order.
///
/// Creation order is not z-order; stacking is tracked separately through the
/// global z counter. A window appears in exactly one app's list.
pub struct WindowInstanceStore {
    by_app: BTreeMap<AppKey, Vec<WindowRecord>>,
}

impl WindowInstanceStore {
    /// Registers a freshly created window under its app.
    pub fn add(&mut self, record: WindowRecord) {
        debug_assert!(self.find(record.id).is_none(), "duplicate window id");
        self.by_app.entry(record.app_key.clone()).or_default().push(record);
    }

    /// Removes a window, returning its record.
    ///
    /// Removing an absent window is a no-op, not an error, so close is
    /// idempotent.
    pub fn remove(&mut self, window_id: WindowId) -> Option<WindowRecord> {
        let mut removed = None;
        self.by_app.retain(|_, instances| {
            if removed.is_none() {
                if let Some(index) = instances.iter().position(|w| w.id == window_id) {
                    removed = Some(instances.remove(index));
                }
            }
            !instances.is_empty()
        });
        removed
    }

    /// Returns the live windows of one app in creation order.
    pub fn instances_of(&self, app_key: &AppKey) -> &[WindowRecord] {
        self.by_app.get(app_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of live windows for one app.
    pub fn count(&self, app_key: &AppKey) -> usize {
        self.instances_of(app_key).len()
    }

    /// Looks up a window by id.
    pub fn find(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.iter().find(|w| w.id == window_id)
    }

    /// Looks up a window by id, mutably.
    pub fn find_mut(&mut self, window_id: WindowId) -> Option<&mut WindowRecord> {
        self.iter_mut().find(|w| w.id == window_id)
    }

    /// Iterates every live window, grouped per app in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &WindowRecord> {
        self.by_app.values().flatten()
    }

    /// Iterates every live window mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut WindowRecord> {
        self.by_app.values_mut().flatten()
    }

    /// Returns the ids of all live windows.
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.iter().map(|w| w.id).collect()
    }

    /// Returns the total number of live windows.
    pub fn len(&self) -> usize {
        self.by_app.values().map(Vec::len).sum()
    }

    /// Returns whether no windows are open.
    pub fn is_empty(&self) -> bool {
        self.by_app.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::AppRules;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::*;
    use crate::model::{ContentStatus, WindowRect};

    fn record(app: &str, id: u64) -> WindowRecord {
        WindowRecord {
            id: WindowId(id),
            app_key: AppKey::trusted(app),
            title: app.to_string(),
            icon: String::new(),
            rules: AppRules::default(),
            rect: WindowRect::default(),
            z_index: id,
            minimized: false,
            maximized: false,
            minimized_at: None,
            stored_preview: None,
            temp_preview: false,
            content: ContentStatus::Loading,
            session_state: Value::Null,
            taskbar_icon: None,
        }
    }

    #[test]
    fn instances_keep_creation_order_per_app() {
        let mut store = WindowInstanceStore::default();
        store.add(record("notes", 1));
        store.add(record("clock", 2));
        store.add(record("notes", 3));

        let notes = AppKey::trusted("notes");
        let ids: Vec<u64> = store.instances_of(&notes).iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.count(&notes), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = WindowInstanceStore::default();
        store.add(record("notes", 1));

        assert!(store.remove(WindowId(1)).is_some());
        assert!(store.remove(WindowId(1)).is_none());
        assert_eq!(store.count(&AppKey::trusted("notes")), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn empty_app_yields_empty_slice() {
        let store = WindowInstanceStore::default();
        assert!(store.instances_of(&AppKey::trusted("ghost")).is_empty());
    }
}
