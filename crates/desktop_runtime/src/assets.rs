//! Per-app loaded-module bookkeeping.
//!
//! Loaded code is shared per app key, not per instance, and is
//! reference-counted by live instance count: it is released only when the
//! last window of the app closes. Per-instance bindings (teardown callback,
//! session hook) are released on every close.

use std::collections::HashMap;
use std::rc::Rc;

use desktop_app_contract::{AppInstance, AppKey, AppModule, SessionStateHook, WindowRuntimeId};

#[derive(Default)]
struct ModuleSlot {
    live: usize,
    module: Option<Rc<dyn AppModule>>,
}

struct WindowAssets {
    instance: AppInstance,
}

#[derive(Default)]
/// Ledger of shared app modules and per-window instance bindings.
pub struct AppAssetLedger {
    modules: HashMap<AppKey, ModuleSlot>,
    windows: HashMap<WindowRuntimeId, WindowAssets>,
}

impl AppAssetLedger {
    /// Records one more live window for `app_key`.
    pub fn register_window(&mut self, app_key: &AppKey) {
        self.modules.entry(app_key.clone()).or_default().live += 1;
    }

    /// Stores the app's shared module on first load and returns the shared
    /// handle.
    pub fn attach_module(&mut self, app_key: &AppKey, module: Rc<dyn AppModule>) -> Rc<dyn AppModule> {
        let slot = self.modules.entry(app_key.clone()).or_default();
        slot.module.get_or_insert(module).clone()
    }

    /// Returns the app's shared module, if loaded.
    pub fn module_for(&self, app_key: &AppKey) -> Option<Rc<dyn AppModule>> {
        self.modules.get(app_key).and_then(|slot| slot.module.clone())
    }

    /// Binds a window's instance handles (teardown, session hook).
    pub fn bind_instance(&mut self, window_id: WindowRuntimeId, instance: AppInstance) {
        self.windows.insert(window_id, WindowAssets { instance });
    }

    /// Returns the session-state hook bound to a window, if any.
    pub fn session_for(&self, window_id: WindowRuntimeId) -> Option<Rc<dyn SessionStateHook>> {
        self.windows
            .get(&window_id)
            .and_then(|assets| assets.instance.session.clone())
    }

    /// Releases a closed window: runs its teardown and decrements the app's
    /// live count, dropping the shared module only when no instance remains.
    ///
    /// Returns whether the app's shared module was released.
    pub fn release_window(&mut self, app_key: &AppKey, window_id: WindowRuntimeId) -> bool {
        if let Some(assets) = self.windows.remove(&window_id) {
            if let Some(teardown) = assets.instance.teardown {
                teardown();
            }
        }

        let Some(slot) = self.modules.get_mut(app_key) else {
            return false;
        };
        slot.live = slot.live.saturating_sub(1);
        if slot.live == 0 {
            self.modules.remove(app_key);
            true
        } else {
            false
        }
    }

    /// Returns the live-window count tracked for an app.
    pub fn live_count(&self, app_key: &AppKey) -> usize {
        self.modules.get(app_key).map(|slot| slot.live).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use desktop_app_contract::WindowEnv;
    use pretty_assertions::assert_eq;

    use super::*;

    struct TestModule;

    impl AppModule for TestModule {
        fn initialize(&self, _env: WindowEnv<'_>) -> Result<AppInstance, String> {
            Ok(AppInstance::empty())
        }
    }

    #[test]
    fn module_survives_until_the_last_instance_closes() {
        let mut ledger = AppAssetLedger::default();
        let key = AppKey::trusted("software");

        ledger.register_window(&key);
        ledger.register_window(&key);
        ledger.attach_module(&key, Rc::new(TestModule));
        assert_eq!(ledger.live_count(&key), 2);

        assert!(!ledger.release_window(&key, 1));
        assert!(ledger.module_for(&key).is_some(), "one instance remains");

        assert!(ledger.release_window(&key, 2));
        assert!(ledger.module_for(&key).is_none());
        assert_eq!(ledger.live_count(&key), 0);
    }

    #[test]
    fn release_runs_the_instance_teardown() {
        let mut ledger = AppAssetLedger::default();
        let key = AppKey::trusted("software");
        let torn_down = Rc::new(Cell::new(false));

        ledger.register_window(&key);
        let flag = torn_down.clone();
        ledger.bind_instance(
            3,
            AppInstance {
                teardown: Some(Box::new(move || flag.set(true))),
                session: None,
            },
        );

        ledger.release_window(&key, 3);
        assert!(torn_down.get());
    }

    #[test]
    fn releasing_an_unknown_window_is_harmless() {
        let mut ledger = AppAssetLedger::default();
        let key = AppKey::trusted("ghost");
        assert!(!ledger.release_window(&key, 42));
    }
}
