//! Long-lived desktop session: owns state, executes reducer effects against
//! host services, and serializes snapshot save/restore.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use desktop_app_contract::{AppKey, AppModule, ContentBackend, SessionStateHook, WindowEnv};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use platform_host::{
    build_state_envelope, decode_envelope_payload, Clock, ContentError, ContentLoader,
    HostServices, LoadedContent, NativeEvent, NativeLaunch, NativeProcessService,
    PreviewCaptureService, StateStore, DESKTOP_STATE_NAMESPACE,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::assets::AppAssetLedger;
use crate::model::{DesktopState, InteractionState, WindowId};
use crate::persistence::{
    build_snapshot, restore_plan, DesktopSnapshot, DESKTOP_SNAPSHOT_SCHEMA_VERSION,
};
use crate::reducer::{
    reduce_desktop, ContentOutcome, DesktopAction, LifecycleError, OpenWindowRequest,
    RuntimeEffect,
};
use crate::registry::AppRegistry;

/// Minimum interval between snapshot saves; higher-frequency triggers set a
/// dirty flag flushed on the next tick.
pub const SNAPSHOT_DEBOUNCE_MS: u64 = 500;
/// Interval for unconditional periodic saves.
pub const PERIODIC_SAVE_INTERVAL_MS: u64 = 30_000;

#[derive(Default)]
struct SnapshotGate {
    restoring: bool,
    dirty: bool,
    last_save_ms: u64,
    in_flight_restore: Option<Shared<LocalBoxFuture<'static, ()>>>,
}

struct RuntimeInner {
    host: HostServices,
    registry: AppRegistry,
    state: RefCell<DesktopState>,
    interaction: RefCell<InteractionState>,
    effects: RefCell<VecDeque<RuntimeEffect>>,
    draining: Cell<bool>,
    assets: RefCell<AppAssetLedger>,
    gate: RefCell<SnapshotGate>,
}

#[derive(Clone)]
/// The desktop session context: one per shell lifetime, cheap to clone.
///
/// All mutation happens on the owning single-threaded interaction loop;
/// suspension points are the host-service futures awaited while executing
/// effects.
pub struct DesktopRuntime {
    inner: Rc<RuntimeInner>,
}

impl DesktopRuntime {
    /// Creates a session over the given host service bundle.
    pub fn new(host: HostServices) -> Self {
        let registry = AppRegistry::new(host.manifest.clone());
        Self {
            inner: Rc::new(RuntimeInner {
                host,
                registry,
                state: RefCell::new(DesktopState::default()),
                interaction: RefCell::new(InteractionState::default()),
                effects: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
                assets: RefCell::new(AppAssetLedger::default()),
                gate: RefCell::new(SnapshotGate::default()),
            }),
        }
    }

    /// Returns the session's app registry.
    pub fn registry(&self) -> &AppRegistry {
        &self.inner.registry
    }

    /// Reads the desktop state.
    pub fn with_state<R>(&self, read: impl FnOnce(&DesktopState) -> R) -> R {
        read(&self.inner.state.borrow())
    }

    /// Reads the interaction state.
    pub fn with_interaction<R>(&self, read: impl FnOnce(&InteractionState) -> R) -> R {
        read(&self.inner.interaction.borrow())
    }

    /// Boots the session: populates the launcher registry, then restores the
    /// persisted desktop layout.
    pub async fn boot(&self) {
        let _ = self.inner.registry.list_installed().await;
        self.restore().await;
    }

    /// Resolves rules for `app_key` and opens a window of it.
    pub async fn open_app(&self, app_key: &AppKey) -> Result<(), LifecycleError> {
        let rules = self.inner.registry.resolve(app_key).await;
        self.dispatch(DesktopAction::OpenWindow(OpenWindowRequest::new(
            app_key.clone(),
            rules,
        )))
        .await
    }

    /// Applies an action and executes all resulting effects.
    pub async fn dispatch(&self, action: DesktopAction) -> Result<(), LifecycleError> {
        self.apply(action)?;
        self.process().await;
        Ok(())
    }

    /// Advances timers to the host clock and flushes due snapshot saves.
    pub async fn tick(&self) {
        let now = self.inner.host.clock.now_unix_ms();
        let _ = self.dispatch(DesktopAction::Tick { now }).await;

        let (dirty, last_save_ms) = {
            let gate = self.inner.gate.borrow();
            if gate.restoring {
                return;
            }
            (gate.dirty, gate.last_save_ms)
        };
        let elapsed = now.saturating_sub(last_save_ms);
        if dirty && elapsed >= SNAPSHOT_DEBOUNCE_MS {
            self.save_now("debounce-flush", now).await;
        } else if elapsed >= PERIODIC_SAVE_INTERVAL_MS {
            self.save_now("periodic", now).await;
        }
    }

    /// Saves immediately, skipping the debounce window.
    ///
    /// This is the page-unload/blur path, where waiting for the next tick
    /// would lose the save.
    pub async fn flush(&self, reason: &'static str) {
        if self.inner.gate.borrow().restoring {
            return;
        }
        let now = self.inner.host.clock.now_unix_ms();
        self.save_now(reason, now).await;
    }

    /// Routes an out-of-band native event to its window.
    ///
    /// Events carry the instance id they were produced for; an event for a
    /// window that has since closed is discarded by the reducer.
    pub async fn handle_native_event(&self, event: NativeEvent) {
        let (window_id, outcome) = match event {
            NativeEvent::Stream {
                instance,
                stream_url,
            } => (WindowId(instance), ContentOutcome::Stream { stream_url }),
            NativeEvent::Error { instance, message } => {
                (WindowId(instance), ContentOutcome::Failed { message })
            }
        };
        let _ = self
            .dispatch(DesktopAction::ContentResolved { window_id, outcome })
            .await;
    }

    /// Restores the persisted desktop layout.
    ///
    /// Concurrent calls share one in-flight restore instead of restoring
    /// twice; saves are suppressed for the duration, and the restoring flag
    /// is cleared even when the restore fails partway.
    pub async fn restore(&self) {
        let shared = {
            let mut gate = self.inner.gate.borrow_mut();
            if let Some(in_flight) = gate.in_flight_restore.clone() {
                in_flight
            } else {
                gate.restoring = true;
                let this = self.clone();
                let restore: LocalBoxFuture<'static, ()> = Box::pin(async move {
                    if let Err(err) = this.run_restore().await {
                        warn!(%err, "desktop restore failed; continuing with live state");
                    }
                    let mut gate = this.inner.gate.borrow_mut();
                    gate.restoring = false;
                    gate.in_flight_restore = None;
                });
                let shared = restore.shared();
                gate.in_flight_restore = Some(shared.clone());
                shared
            }
        };
        shared.await;
    }

    fn apply(&self, action: DesktopAction) -> Result<(), LifecycleError> {
        let effects = {
            let mut state = self.inner.state.borrow_mut();
            let mut interaction = self.inner.interaction.borrow_mut();
            reduce_desktop(&mut state, &mut interaction, action)?
        };
        self.inner.effects.borrow_mut().extend(effects);
        Ok(())
    }

    async fn process(&self) {
        if self.inner.draining.get() {
            return;
        }
        self.inner.draining.set(true);
        loop {
            let Some(effect) = self.inner.effects.borrow_mut().pop_front() else {
                break;
            };
            self.execute(effect).await;
        }
        self.inner.draining.set(false);
    }

    async fn execute(&self, effect: RuntimeEffect) {
        match effect {
            RuntimeEffect::PersistLayout { reason } => self.save(reason).await,
            RuntimeEffect::OpenApp { app_key } => {
                let rules = self.inner.registry.resolve(&app_key).await;
                let _ = self.apply(DesktopAction::OpenWindow(OpenWindowRequest::new(
                    app_key, rules,
                )));
            }
            RuntimeEffect::LoadContent {
                window_id,
                app_key,
                backend,
            } => {
                self.inner.assets.borrow_mut().register_window(&app_key);
                let outcome = self.load_content(&app_key, window_id, backend).await;
                let _ = self.apply(DesktopAction::ContentResolved { window_id, outcome });
            }
            RuntimeEffect::CapturePreview { window_id } => {
                let image = self.inner.host.preview.capture(window_id.0).await;
                let _ = self.apply(DesktopAction::PreviewCaptured { window_id, image });
            }
            RuntimeEffect::NativeKill { window_id } => {
                if let Err(err) = self.inner.host.native.kill(window_id.0).await {
                    warn!(window = %window_id, %err, "native kill notification failed");
                }
            }
            RuntimeEffect::ReleaseWindowAssets { window_id, app_key } => {
                self.inner
                    .assets
                    .borrow_mut()
                    .release_window(&app_key, window_id.0);
            }
            RuntimeEffect::ApplySessionState { window_id } => {
                let hook = self.inner.assets.borrow().session_for(window_id.0);
                let payload =
                    self.with_state(|s| s.store.find(window_id).map(|w| w.session_state.clone()));
                if let (Some(hook), Some(payload)) = (hook, payload) {
                    if !payload.is_null() {
                        hook.restore(&payload);
                    }
                }
            }
        }
    }

    async fn load_content(
        &self,
        app_key: &AppKey,
        window_id: WindowId,
        backend: ContentBackend,
    ) -> ContentOutcome {
        match backend {
            ContentBackend::Web => {
                match self.inner.host.content.load(app_key, window_id.0, backend).await {
                    Ok(LoadedContent::Web { html, module }) => {
                        let Some(module) = module else {
                            return ContentOutcome::Ready { html };
                        };
                        let module = self.inner.assets.borrow_mut().attach_module(app_key, module);
                        let env = WindowEnv {
                            window_id: window_id.0,
                            app_key,
                        };
                        match module.initialize(env) {
                            Ok(instance) => {
                                self.inner
                                    .assets
                                    .borrow_mut()
                                    .bind_instance(window_id.0, instance);
                                ContentOutcome::Ready { html }
                            }
                            Err(message) => ContentOutcome::Failed { message },
                        }
                    }
                    Ok(LoadedContent::NativeStream { stream_url }) => {
                        ContentOutcome::Stream { stream_url }
                    }
                    Err(ContentError::PendingApproval) => ContentOutcome::AwaitingApproval,
                    Err(err) => ContentOutcome::Failed {
                        message: err.to_string(),
                    },
                }
            }
            ContentBackend::Native => {
                match self.inner.host.native.launch(app_key, window_id.0).await {
                    Ok(NativeLaunch::Ready { stream_url }) => ContentOutcome::Stream { stream_url },
                    Ok(NativeLaunch::PendingApproval) => ContentOutcome::AwaitingApproval,
                    Ok(NativeLaunch::Failed { message, hint }) => ContentOutcome::Failed {
                        message: match hint {
                            Some(hint) => format!("{message} ({hint})"),
                            None => message,
                        },
                    },
                    Err(message) => ContentOutcome::Failed { message },
                }
            }
        }
    }

    /// Debounced save; a no-op while a restore is in progress.
    async fn save(&self, reason: &'static str) {
        let now = self.inner.host.clock.now_unix_ms();
        {
            let mut gate = self.inner.gate.borrow_mut();
            if gate.restoring {
                return;
            }
            if now.saturating_sub(gate.last_save_ms) < SNAPSHOT_DEBOUNCE_MS {
                gate.dirty = true;
                return;
            }
        }
        self.save_now(reason, now).await;
    }

    async fn save_now(&self, reason: &'static str, now: u64) {
        self.capture_session_state();
        let snapshot = self.with_state(build_snapshot);
        let envelope = match build_state_envelope(
            DESKTOP_STATE_NAMESPACE,
            DESKTOP_SNAPSHOT_SCHEMA_VERSION,
            &snapshot,
        ) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, reason, "snapshot serialization failed");
                return;
            }
        };

        match self.inner.host.state.save_envelope(&envelope).await {
            Ok(()) => {
                let mut gate = self.inner.gate.borrow_mut();
                gate.last_save_ms = now;
                gate.dirty = false;
                debug!(reason, windows = snapshot.windows.len(), "desktop snapshot saved");
            }
            Err(err) => {
                // The desktop keeps operating from in-memory state; the next
                // periodic tick retries.
                let mut gate = self.inner.gate.borrow_mut();
                gate.dirty = true;
                warn!(%err, reason, "snapshot save failed");
            }
        }
    }

    /// Pulls fresh session state from every opted-in window's hook.
    fn capture_session_state(&self) {
        let window_ids: Vec<WindowId> = self.with_state(|s| {
            s.store
                .iter()
                .filter(|w| w.rules.session_state)
                .map(|w| w.id)
                .collect()
        });

        for window_id in window_ids {
            let Some(hook) = self.inner.assets.borrow().session_for(window_id.0) else {
                continue;
            };
            if let Some(captured) = hook.capture() {
                let mut state = self.inner.state.borrow_mut();
                if let Some(window) = state.store.find_mut(window_id) {
                    window.session_state = captured;
                }
            }
        }
    }

    async fn run_restore(&self) -> Result<(), String> {
        let envelope = self
            .inner
            .host
            .state
            .load_envelope(DESKTOP_STATE_NAMESPACE)
            .await?;
        let Some(envelope) = envelope else {
            return Ok(());
        };
        let snapshot: DesktopSnapshot = decode_envelope_payload(&envelope)?;
        if snapshot.windows.is_empty() {
            return Ok(());
        }

        // Clear whatever is live, running teardowns and native kills.
        let window_ids = self.with_state(|s| s.store.window_ids());
        for window_id in window_ids {
            let _ = self.apply(DesktopAction::CloseWindow { window_id });
        }
        self.process().await;

        {
            let mut state = self.inner.state.borrow_mut();
            state.z_index_counter = state.z_index_counter.max(snapshot.z_index_counter);
        }

        for entry in restore_plan(snapshot) {
            let rules = self.inner.registry.resolve(&entry.app_key).await;
            let mut request = OpenWindowRequest::new(entry.app_key, rules);
            request.restoring = true;
            request.rect = Some(entry.rect);
            request.minimized = entry.minimized;
            request.maximized = entry.maximized;
            request.stored_preview = entry.preview;
            request.session_state = entry.session_state.unwrap_or(Value::Null);
            let _ = self.apply(DesktopAction::OpenWindow(request));
        }
        self.process().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use desktop_app_contract::{
        AppInstance, AppModule, AppRules, SessionStateHook, WindowEnv,
    };
    use futures::executor::block_on;
    use platform_host::{
        FixedPreviewCapture, ManualClock, MemoryContentLoader, MemoryNativeProcessService,
        MemoryStateStore, StaticManifestSource,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::ContentStatus;

    struct Harness {
        manifest: StaticManifestSource,
        content: MemoryContentLoader,
        native: MemoryNativeProcessService,
        preview: FixedPreviewCapture,
        store: MemoryStateStore,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                manifest: StaticManifestSource::default(),
                content: MemoryContentLoader::default(),
                native: MemoryNativeProcessService::default(),
                preview: FixedPreviewCapture::returning("data:image/png;base64,cap"),
                store: MemoryStateStore::default(),
                clock: ManualClock::starting_at(60_000),
            }
        }

        fn runtime(&self) -> DesktopRuntime {
            DesktopRuntime::new(HostServices {
                manifest: Rc::new(self.manifest.clone()),
                content: Rc::new(self.content.clone()),
                native: Rc::new(self.native.clone()),
                preview: Rc::new(self.preview.clone()),
                state: Rc::new(self.store.clone()),
                clock: Rc::new(self.clock.clone()),
            })
        }

        fn install(&self, app: &str, rules: AppRules) -> AppKey {
            let key = AppKey::trusted(app);
            self.manifest.insert(key.clone(), rules);
            self.content.script_html(key.clone(), format!("<p>{app}</p>"));
            key
        }
    }

    fn unbounded() -> AppRules {
        AppRules {
            max_instances: -1,
            ..AppRules::default()
        }
    }

    #[test]
    fn open_app_loads_web_content() {
        let harness = Harness::new();
        let key = harness.install("notes", unbounded());
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");

        runtime.with_state(|state| {
            let window = state.store.instances_of(&key).first().expect("window");
            assert_eq!(
                window.content,
                ContentStatus::Ready {
                    html: "<p>notes</p>".to_string()
                }
            );
        });
    }

    #[test]
    fn content_failure_keeps_the_window_open() {
        let harness = Harness::new();
        let key = AppKey::trusted("broken");
        harness.manifest.insert(key.clone(), unbounded());
        // No scripted content: the load fails.
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");

        runtime.with_state(|state| {
            let window = state.store.instances_of(&key).first().expect("window");
            assert!(matches!(window.content, ContentStatus::Failed { .. }));
        });
    }

    #[test]
    fn minimize_captures_and_caches_a_preview() {
        let harness = Harness::new();
        let key = harness.install("notes", unbounded());
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");
        let window_id = runtime.with_state(|s| s.store.window_ids()[0]);
        block_on(runtime.dispatch(DesktopAction::MinimizeWindow {
            window_id,
            now: harness.clock.now_unix_ms(),
        }))
        .expect("minimize");

        runtime.with_state(|state| {
            let window = state.store.find(window_id).expect("window");
            assert!(window.minimized);
            assert_eq!(
                window.stored_preview.as_deref(),
                Some("data:image/png;base64,cap")
            );
        });
        assert_eq!(harness.preview.captured(), vec![window_id.0]);
    }

    #[test]
    fn native_backend_streams_and_kills_on_close() {
        let harness = Harness::new();
        let key = AppKey::trusted("frutiger-os");
        let mut rules = unbounded();
        rules.backend = ContentBackend::Native;
        harness.manifest.insert(key.clone(), rules);
        harness.native.script_launch(
            key.clone(),
            NativeLaunch::Ready {
                stream_url: "stream://desktop/1".to_string(),
            },
        );
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");
        let window_id = runtime.with_state(|s| s.store.window_ids()[0]);
        runtime.with_state(|state| {
            assert_eq!(
                state.store.find(window_id).unwrap().content,
                ContentStatus::Streaming {
                    stream_url: "stream://desktop/1".to_string()
                }
            );
        });

        block_on(runtime.dispatch(DesktopAction::CloseWindow { window_id })).expect("close");
        assert_eq!(harness.native.killed(), vec![window_id.0]);
    }

    #[test]
    fn pending_approval_is_neither_success_nor_failure() {
        let harness = Harness::new();
        let key = AppKey::trusted("frutiger-os");
        let mut rules = unbounded();
        rules.backend = ContentBackend::Native;
        harness.manifest.insert(key.clone(), rules);
        harness
            .native
            .script_launch(key.clone(), NativeLaunch::PendingApproval);
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");
        runtime.with_state(|state| {
            let window = state.store.instances_of(&key).first().expect("window");
            assert_eq!(window.content, ContentStatus::AwaitingApproval);
        });
    }

    #[test]
    fn stale_native_events_are_discarded() {
        let harness = Harness::new();
        let key = harness.install("notes", unbounded());
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");
        let window_id = runtime.with_state(|s| s.store.window_ids()[0]);
        block_on(runtime.dispatch(DesktopAction::CloseWindow { window_id })).expect("close");

        block_on(runtime.handle_native_event(NativeEvent::Stream {
            instance: window_id.0,
            stream_url: "stream://late".to_string(),
        }));
        runtime.with_state(|state| assert!(state.store.is_empty()));
    }

    #[test]
    fn snapshot_round_trip_restores_flags_and_relative_z_order() {
        let harness = Harness::new();
        let editor = harness.install("editor", unbounded());
        let notes = harness.install("notes", unbounded());
        let runtime = harness.runtime();

        block_on(runtime.open_app(&editor)).expect("open editor");
        block_on(runtime.open_app(&notes)).expect("open notes");
        let (editor_id, notes_id) = runtime.with_state(|s| {
            (
                s.store.instances_of(&editor)[0].id,
                s.store.instances_of(&notes)[0].id,
            )
        });
        block_on(runtime.dispatch(DesktopAction::ToggleMaximize {
            window_id: editor_id,
            viewport: crate::model::WindowRect {
                x: 0,
                y: 0,
                w: 1280,
                h: 666,
            },
        }))
        .expect("maximize editor");
        block_on(runtime.dispatch(DesktopAction::MinimizeWindow {
            window_id: notes_id,
            now: harness.clock.now_unix_ms(),
        }))
        .expect("minimize notes");
        // Editor was maximized last, so it is on top.
        let saved_order =
            runtime.with_state(|s| order_by_z(s).iter().map(|w| w.0.clone()).collect::<Vec<_>>());
        block_on(runtime.flush("unload"));

        let restored = harness.runtime();
        block_on(restored.restore());

        restored.with_state(|state| {
            assert_eq!(state.store.len(), 2);
            let editor_window = &state.store.instances_of(&editor)[0];
            assert!(editor_window.maximized);
            assert!(!editor_window.minimized);
            let notes_window = &state.store.instances_of(&notes)[0];
            assert!(notes_window.minimized);
            assert!(!notes_window.is_visible());

            let restored_order: Vec<AppKey> =
                order_by_z(state).iter().map(|w| w.0.clone()).collect();
            assert_eq!(restored_order, saved_order);
        });
    }

    fn order_by_z(state: &DesktopState) -> Vec<(AppKey, u64)> {
        let mut order: Vec<(AppKey, u64)> = state
            .store
            .iter()
            .map(|w| (w.app_key.clone(), w.z_index))
            .collect();
        order.sort_by_key(|(_, z)| *z);
        order
    }

    #[test]
    fn concurrent_restores_share_one_in_flight_run() {
        let harness = Harness::new();
        let key = harness.install("notes", unbounded());
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("open");
        block_on(runtime.flush("unload"));

        let restored = harness.runtime();
        block_on(async {
            futures::join!(restored.restore(), restored.restore());
        });
        restored.with_state(|state| {
            assert_eq!(state.store.count(&key), 1, "not restored twice");
        });
    }

    #[test]
    fn saves_are_debounced_and_flushed_by_tick() {
        let harness = Harness::new();
        let key = harness.install("notes", unbounded());
        let runtime = harness.runtime();

        block_on(runtime.open_app(&key)).expect("first open saves");
        let saved_windows = |store: &MemoryStateStore| -> usize {
            block_on(store.load_envelope(DESKTOP_STATE_NAMESPACE))
                .expect("load")
                .map(|envelope| {
                    decode_envelope_payload::<DesktopSnapshot>(&envelope)
                        .expect("snapshot")
                        .windows
                        .len()
                })
                .unwrap_or(0)
        };
        assert_eq!(saved_windows(&harness.store), 1);

        // A second open inside the debounce window marks the state dirty
        // without writing.
        harness.clock.advance(100);
        block_on(runtime.open_app(&key)).expect("second open");
        assert_eq!(saved_windows(&harness.store), 1);

        harness.clock.advance(SNAPSHOT_DEBOUNCE_MS);
        block_on(runtime.tick());
        assert_eq!(saved_windows(&harness.store), 2);
    }

    struct RecordingHook {
        captured: RefCell<Option<serde_json::Value>>,
        restored: Rc<RefCell<Option<serde_json::Value>>>,
    }

    impl SessionStateHook for RecordingHook {
        fn capture(&self) -> Option<serde_json::Value> {
            self.captured.borrow().clone()
        }

        fn restore(&self, state: &serde_json::Value) {
            *self.restored.borrow_mut() = Some(state.clone());
        }
    }

    struct HookModule {
        restored: Rc<RefCell<Option<serde_json::Value>>>,
    }

    impl AppModule for HookModule {
        fn initialize(&self, _env: WindowEnv<'_>) -> Result<AppInstance, String> {
            Ok(AppInstance {
                teardown: None,
                session: Some(Rc::new(RecordingHook {
                    captured: RefCell::new(Some(json!({
                        "searchQuery": "aero",
                        "scrollPosition": 120,
                    }))),
                    restored: self.restored.clone(),
                })),
            })
        }
    }

    #[test]
    fn session_state_survives_save_and_reapplies_after_restore() {
        let harness = Harness::new();
        let key = AppKey::trusted("software");
        let mut rules = unbounded();
        rules.session_state = true;
        harness.manifest.insert(key.clone(), rules);

        let restored_payload = Rc::new(RefCell::new(None));
        harness.content.script(
            key.clone(),
            Ok(LoadedContent::Web {
                html: "<div id=\"softwareGrid\"></div>".to_string(),
                module: Some(Rc::new(HookModule {
                    restored: restored_payload.clone(),
                })),
            }),
        );

        let runtime = harness.runtime();
        block_on(runtime.open_app(&key)).expect("open");
        block_on(runtime.flush("unload"));

        let reborn = harness.runtime();
        block_on(reborn.restore());

        assert_eq!(
            restored_payload.borrow().clone(),
            Some(json!({ "searchQuery": "aero", "scrollPosition": 120 }))
        );
    }
}
