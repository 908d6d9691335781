//! Reducer actions, side-effect intents, and transition logic for the desktop
//! window manager.
//!
//! [`reduce_desktop`] is the authoritative state machine: it mutates
//! [`DesktopState`] synchronously and emits [`RuntimeEffect`] intents for the
//! session runtime to execute against host services. Everything time-driven is
//! expressed as stored deadlines fired by [`DesktopAction::Tick`].

use desktop_app_contract::{AppKey, AppRules, ContentBackend};
use platform_host::PreviewImage;
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    ContentStatus, DesktopState, DragSession, InteractionState, LauncherHover, PointerPosition,
    ResizeEdge, ResizeSession, TaskbarIconRef, WindowId, WindowRecord, WindowRect,
};
use crate::stack_menu::{
    ItemHover, StackMenuState, STACK_MENU_DISMISS_GRACE_MS, STACK_MENU_HOVER_OPEN_MS,
    TEMP_PREVIEW_HOVER_MS,
};
use crate::taskbar::{icon_press_target, taskbar_icon_id};
use crate::timers::PressOutcome;
use crate::window_manager::{
    default_rect, most_recently_minimized, oldest_instance, raise_window, resize_rect,
    MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
};

#[derive(Debug, Clone, PartialEq)]
/// Request to open one window with rules already resolved.
pub struct OpenWindowRequest {
    /// App to open.
    pub app_key: AppKey,
    /// Resolved launch rules; every app key resolves to a usable value before
    /// a window may be created.
    pub rules: AppRules,
    /// Initial geometry; defaults to the fixed offset position.
    pub rect: Option<WindowRect>,
    /// Snapshot-restore mode: bypasses the instance cap.
    pub restoring: bool,
    /// Start minimized (restore only).
    pub minimized: bool,
    /// Start maximized (restore only).
    pub maximized: bool,
    /// Previously captured preview to seed the cache (restore only).
    pub stored_preview: Option<PreviewImage>,
    /// App-supplied session state to reapply after content load.
    pub session_state: Value,
}

impl OpenWindowRequest {
    /// Creates a plain foreground open request.
    pub fn new(app_key: AppKey, rules: AppRules) -> Self {
        Self {
            app_key,
            rules,
            rect: None,
            restoring: false,
            minimized: false,
            maximized: false,
            stored_preview: None,
            session_state: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved outcome of a window's content load, fed back into the reducer.
pub enum ContentOutcome {
    /// Web content is ready.
    Ready {
        /// Markup for the window body.
        html: String,
    },
    /// Native stream surface is ready.
    Stream {
        /// Stream descriptor URL.
        stream_url: String,
    },
    /// The launch is deferred pending elevated-trust approval.
    AwaitingApproval,
    /// Loading failed; shown inline in the affected window only.
    Failed {
        /// Diagnostic message.
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open a new window using the supplied request.
    OpenWindow(OpenWindowRequest),
    /// Close a window by id; closing an absent window is a no-op.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Focus (and raise) a window by id.
    FocusWindow {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Minimize a window, capturing a best-effort preview.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
        /// Current time, recorded as `minimized_at`.
        now: u64,
    },
    /// Toggle the maximized flag against the given desktop viewport.
    ToggleMaximize {
        /// Window to toggle.
        window_id: WindowId,
        /// Desktop area below the taskbar.
        viewport: WindowRect,
    },
    /// Taskbar icon press for a non-stacking app.
    TaskbarIconPress {
        /// App whose icon was pressed.
        app_key: AppKey,
    },
    /// Toggle the start menu open/closed.
    ToggleStartMenu,
    /// Close the start menu if open.
    CloseStartMenu,
    /// Begin dragging a window.
    BeginMove {
        /// Window being dragged.
        window_id: WindowId,
        /// Pointer position at drag start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window drag.
    UpdateMove {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window drag; layout persists here, not per frame.
    EndMove,
    /// Begin resizing a window.
    BeginResize {
        /// Window being resized.
        window_id: WindowId,
        /// Edge or corner being dragged.
        edge: ResizeEdge,
        /// Pointer position at resize start.
        pointer: PointerPosition,
    },
    /// Update an in-progress window resize.
    UpdateResize {
        /// Current pointer position.
        pointer: PointerPosition,
    },
    /// End the active window resize; layout persists here, not per frame.
    EndResize,
    /// Launcher press; the click arbiter decides single vs. double.
    LauncherPress {
        /// Pressed app.
        app_key: AppKey,
        /// Current time.
        now: u64,
    },
    /// Pointer entered a launcher.
    LauncherPointerEnter {
        /// Hovered app.
        app_key: AppKey,
        /// Launcher rect for menu placement.
        anchor: WindowRect,
        /// Desktop viewport for menu placement.
        viewport: WindowRect,
        /// Current time.
        now: u64,
    },
    /// Pointer left a launcher.
    LauncherPointerLeave {
        /// Left app.
        app_key: AppKey,
        /// Current time.
        now: u64,
    },
    /// Open the stack menu for an app immediately.
    StackMenuOpen {
        /// App whose instances are listed.
        app_key: AppKey,
        /// Anchor rect.
        anchor: WindowRect,
        /// Desktop viewport.
        viewport: WindowRect,
    },
    /// Close any open stack menu.
    StackMenuClose,
    /// Pointer entered the open stack menu.
    StackMenuPointerEnter,
    /// Pointer left the open stack menu.
    StackMenuPointerLeave {
        /// Current time.
        now: u64,
    },
    /// Pointer is hovering one stack-menu item.
    StackMenuItemHover {
        /// Hovered window.
        window_id: WindowId,
        /// Current time.
        now: u64,
    },
    /// Pointer left the hovered stack-menu item.
    StackMenuItemLeave,
    /// Focus action on a stack-menu item.
    StackMenuActivate {
        /// Window to focus.
        window_id: WindowId,
    },
    /// Close action on a stack-menu item.
    StackMenuCloseItem {
        /// Window to close.
        window_id: WindowId,
    },
    /// Content load finished for a window; stale results are discarded.
    ContentResolved {
        /// Target window.
        window_id: WindowId,
        /// Load outcome.
        outcome: ContentOutcome,
    },
    /// Best-effort preview capture finished.
    PreviewCaptured {
        /// Target window.
        window_id: WindowId,
        /// Captured payload; `None` degrades to "no thumbnail".
        image: Option<PreviewImage>,
    },
    /// Advance every timer state machine to `now`.
    Tick {
        /// Current time.
        now: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the session runtime
/// to execute.
pub enum RuntimeEffect {
    /// Persist the desktop layout snapshot (debounced by the runtime).
    PersistLayout {
        /// Trigger description for diagnostics.
        reason: &'static str,
    },
    /// Resolve rules for an app and open a window of it.
    OpenApp {
        /// App to open.
        app_key: AppKey,
    },
    /// Load the body content of a freshly opened window.
    LoadContent {
        /// Target window.
        window_id: WindowId,
        /// Owning app.
        app_key: AppKey,
        /// Content-loading strategy.
        backend: ContentBackend,
    },
    /// Capture a best-effort preview of a window.
    CapturePreview {
        /// Target window.
        window_id: WindowId,
    },
    /// Notify the native host that a window's process should stop.
    NativeKill {
        /// Closed window.
        window_id: WindowId,
    },
    /// Release the closed window's instance-scoped assets.
    ReleaseWindowAssets {
        /// Closed window.
        window_id: WindowId,
        /// Owning app.
        app_key: AppKey,
    },
    /// Reapply persisted session state to a window whose content is ready.
    ApplySessionState {
        /// Target window.
        window_id: WindowId,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for invalid actions.
pub enum LifecycleError {
    /// The target window id was not found in the current state.
    #[error("window not found")]
    WindowNotFound,
}

/// Applies a [`DesktopAction`] to the desktop state and collects resulting
/// side effects.
///
/// # Errors
///
/// Returns [`LifecycleError::WindowNotFound`] when an action requires a window
/// that is not present. Close and the async completion actions are exempt:
/// they tolerate missing windows so idempotent close and stale async results
/// stay harmless.
pub fn reduce_desktop(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, LifecycleError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow(req) => {
            let live = state.store.count(&req.app_key);
            if !req.restoring && !req.rules.allows_another(live) {
                // At capacity: focus the oldest instance instead of opening.
                if let Some(oldest) = oldest_instance(&state.store, &req.app_key) {
                    raise_window(state, oldest);
                }
                state.start_menu_open = false;
            } else {
                let window_id = state.next_window_id();
                let z_index = state.next_z_index();
                let rect = req
                    .rect
                    .unwrap_or_default()
                    .clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
                let taskbar_icon = (!req.rules.stack).then(|| TaskbarIconRef {
                    icon_id: taskbar_icon_id(&req.app_key, window_id.0),
                    app_key: req.app_key.clone(),
                    window_id,
                });
                let backend = req.rules.backend;
                state.store.add(WindowRecord {
                    id: window_id,
                    app_key: req.app_key.clone(),
                    title: req.rules.title_for(&req.app_key),
                    icon: req.rules.icon.clone(),
                    rules: req.rules,
                    rect,
                    z_index,
                    minimized: req.minimized,
                    maximized: req.maximized,
                    minimized_at: None,
                    stored_preview: req.stored_preview,
                    temp_preview: false,
                    content: ContentStatus::Loading,
                    session_state: req.session_state,
                    taskbar_icon,
                });
                state.start_menu_open = false;
                effects.push(RuntimeEffect::LoadContent {
                    window_id,
                    app_key: req.app_key,
                    backend,
                });
                effects.push(RuntimeEffect::PersistLayout { reason: "open" });
            }
        }
        DesktopAction::CloseWindow { window_id } => {
            effects.extend(handle_close(state, window_id));
        }
        DesktopAction::FocusWindow { window_id } => {
            if !raise_window(state, window_id) {
                return Err(LifecycleError::WindowNotFound);
            }
            state.start_menu_open = false;
        }
        DesktopAction::MinimizeWindow { window_id, now } => {
            let window = find_window_mut(state, window_id)?;
            if window.rules.minimizable && !window.minimized {
                window.minimized = true;
                window.minimized_at = Some(now);
                window.temp_preview = false;
                effects.push(RuntimeEffect::CapturePreview { window_id });
                effects.push(RuntimeEffect::PersistLayout { reason: "minimize" });
            }
        }
        DesktopAction::ToggleMaximize {
            window_id,
            viewport,
        } => {
            let window = find_window_mut(state, window_id)?;
            if window.rules.maximizable {
                if window.maximized {
                    window.maximized = false;
                    // Leaving maximized reverts to the fixed default rect;
                    // pre-maximize geometry is not restored.
                    window.rect = default_rect();
                } else {
                    window.maximized = true;
                    window.rect = viewport.clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
                }
                raise_window(state, window_id);
                effects.push(RuntimeEffect::PersistLayout { reason: "maximize" });
            }
        }
        DesktopAction::TaskbarIconPress { app_key } => {
            if let Some(target) = icon_press_target(&state.store, &app_key) {
                raise_window(state, target);
            }
        }
        DesktopAction::ToggleStartMenu => {
            state.start_menu_open = !state.start_menu_open;
        }
        DesktopAction::CloseStartMenu => {
            state.start_menu_open = false;
        }
        DesktopAction::BeginMove { window_id, pointer } => {
            let rect_start = find_window_mut(state, window_id)?.rect;
            raise_window(state, window_id);
            interaction.dragging = Some(DragSession {
                window_id,
                pointer_start: pointer,
                rect_start,
            });
        }
        DesktopAction::UpdateMove { pointer } => {
            if let Some(session) = interaction.dragging.as_ref() {
                let dx = pointer.x - session.pointer_start.x;
                let dy = pointer.y - session.pointer_start.y;
                let window = find_window_mut(state, session.window_id)?;
                if !window.maximized {
                    window.rect = session.rect_start.offset(dx, dy);
                }
            }
        }
        DesktopAction::EndMove => {
            if interaction.dragging.take().is_some() {
                effects.push(RuntimeEffect::PersistLayout { reason: "move" });
            }
        }
        DesktopAction::BeginResize {
            window_id,
            edge,
            pointer,
        } => {
            let rect_start = find_window_mut(state, window_id)?.rect;
            raise_window(state, window_id);
            interaction.resizing = Some(ResizeSession {
                window_id,
                edge,
                pointer_start: pointer,
                rect_start,
            });
        }
        DesktopAction::UpdateResize { pointer } => {
            if let Some(session) = interaction.resizing.as_ref() {
                let dx = pointer.x - session.pointer_start.x;
                let dy = pointer.y - session.pointer_start.y;
                let window = find_window_mut(state, session.window_id)?;
                if !window.maximized && window.rules.resizable {
                    window.rect = resize_rect(session.rect_start, session.edge, dx, dy)
                        .clamped_min(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT);
                }
            }
        }
        DesktopAction::EndResize => {
            if interaction.resizing.take().is_some() {
                effects.push(RuntimeEffect::PersistLayout { reason: "resize" });
            }
        }
        DesktopAction::LauncherPress { app_key, now } => {
            let arbiter = interaction.launcher_clicks.entry(app_key.clone()).or_default();
            if arbiter.press(now) == PressOutcome::Double {
                interaction.launcher_hover = None;
                effects.push(RuntimeEffect::OpenApp { app_key });
            }
        }
        DesktopAction::LauncherPointerEnter {
            app_key,
            anchor,
            viewport,
            now,
        } => {
            let menu_open_for_app = match state.stack_menu.as_mut() {
                Some(menu) if menu.app_key == app_key => {
                    menu.over_anchor = true;
                    menu.dismiss_deadline = None;
                    true
                }
                _ => false,
            };
            let stackable = state
                .store
                .instances_of(&app_key)
                .first()
                .map(|w| w.rules.stack)
                .unwrap_or(false);
            if stackable && !menu_open_for_app {
                interaction.launcher_hover = Some(LauncherHover {
                    app_key,
                    anchor,
                    viewport,
                    deadline: now + STACK_MENU_HOVER_OPEN_MS,
                });
            }
        }
        DesktopAction::LauncherPointerLeave { app_key, now } => {
            if interaction
                .launcher_hover
                .as_ref()
                .map_or(false, |h| h.app_key == app_key)
            {
                interaction.launcher_hover = None;
            }
            if let Some(menu) = state.stack_menu.as_mut() {
                if menu.app_key == app_key {
                    menu.over_anchor = false;
                    if menu.pointer_outside() {
                        menu.dismiss_deadline = Some(now + STACK_MENU_DISMISS_GRACE_MS);
                    }
                }
            }
        }
        DesktopAction::StackMenuOpen {
            app_key,
            anchor,
            viewport,
        } => {
            effects.extend(open_stack_menu(state, app_key, anchor, viewport));
        }
        DesktopAction::StackMenuClose => {
            close_stack_menu(state);
        }
        DesktopAction::StackMenuPointerEnter => {
            if let Some(menu) = state.stack_menu.as_mut() {
                menu.over_menu = true;
                menu.dismiss_deadline = None;
            }
        }
        DesktopAction::StackMenuPointerLeave { now } => {
            if let Some(menu) = state.stack_menu.as_mut() {
                menu.over_menu = false;
                menu.hover = None;
                if menu.pointer_outside() {
                    menu.dismiss_deadline = Some(now + STACK_MENU_DISMISS_GRACE_MS);
                }
            }
            revert_temp_preview(state);
        }
        DesktopAction::StackMenuItemHover { window_id, now } => {
            let phantom_elsewhere = state
                .stack_menu
                .as_ref()
                .and_then(|m| m.temp_preview)
                .map_or(false, |id| id != window_id);
            if phantom_elsewhere {
                revert_temp_preview(state);
            }
            if let Some(menu) = state.stack_menu.as_mut() {
                menu.hover = Some(ItemHover {
                    window_id,
                    deadline: now + TEMP_PREVIEW_HOVER_MS,
                });
            }
        }
        DesktopAction::StackMenuItemLeave => {
            if let Some(menu) = state.stack_menu.as_mut() {
                menu.hover = None;
            }
            revert_temp_preview(state);
        }
        DesktopAction::StackMenuActivate { window_id } => {
            close_stack_menu(state);
            raise_window(state, window_id);
        }
        DesktopAction::StackMenuCloseItem { window_id } => {
            effects.extend(handle_close(state, window_id));
        }
        DesktopAction::ContentResolved { window_id, outcome } => {
            // The window may have closed while the load was in flight; the
            // stale result is simply discarded.
            if let Some(window) = state.store.find_mut(window_id) {
                window.content = match outcome {
                    ContentOutcome::Ready { html } => ContentStatus::Ready { html },
                    ContentOutcome::Stream { stream_url } => ContentStatus::Streaming { stream_url },
                    ContentOutcome::AwaitingApproval => ContentStatus::AwaitingApproval,
                    ContentOutcome::Failed { message } => ContentStatus::Failed { message },
                };
                let ready = matches!(
                    window.content,
                    ContentStatus::Ready { .. } | ContentStatus::Streaming { .. }
                );
                if ready && window.rules.session_state && !window.session_state.is_null() {
                    effects.push(RuntimeEffect::ApplySessionState { window_id });
                }
            }
        }
        DesktopAction::PreviewCaptured { window_id, image } => {
            // Capture failure leaves any previously cached preview in place.
            if let Some(image) = image {
                if let Some(window) = state.store.find_mut(window_id) {
                    window.stored_preview = Some(image);
                }
            }
        }
        DesktopAction::Tick { now } => {
            effects.extend(advance_timers(state, interaction, now));
        }
    }

    Ok(effects)
}

/// Advances every deadline-driven machine to `now`.
fn advance_timers(
    state: &mut DesktopState,
    interaction: &mut InteractionState,
    now: u64,
) -> Vec<RuntimeEffect> {
    let mut effects = Vec::new();

    // Pending single clicks.
    let fired: Vec<AppKey> = interaction
        .launcher_clicks
        .iter_mut()
        .filter_map(|(app_key, arbiter)| arbiter.fire(now).then(|| app_key.clone()))
        .collect();
    interaction
        .launcher_clicks
        .retain(|_, arbiter| !arbiter.is_idle());
    for app_key in fired {
        focus_launcher_target(state, &app_key);
    }

    // Launcher hover intent.
    if let Some(hover) = interaction.launcher_hover.clone() {
        if now >= hover.deadline {
            interaction.launcher_hover = None;
            effects.extend(open_stack_menu(
                state,
                hover.app_key,
                hover.anchor,
                hover.viewport,
            ));
        }
    }

    // Stack-menu dismissal and temp-unminimize activation.
    let mut dismiss = false;
    let mut activate = None;
    if let Some(menu) = state.stack_menu.as_ref() {
        if menu.dismiss_deadline.map_or(false, |d| now >= d) {
            dismiss = true;
        } else if let Some(hover) = menu.hover {
            if now >= hover.deadline && menu.temp_preview != Some(hover.window_id) {
                activate = Some(hover.window_id);
            }
        }
    }
    if dismiss {
        close_stack_menu(state);
    } else if let Some(window_id) = activate {
        activate_temp_preview(state, window_id);
    }

    effects
}

/// Single-click launcher behavior: restore the most recently minimized
/// instance, else focus the first visible one.
fn focus_launcher_target(state: &mut DesktopState, app_key: &AppKey) {
    let target = most_recently_minimized(&state.store, app_key)
        .or_else(|| crate::window_manager::first_visible_instance(&state.store, app_key));
    if let Some(window_id) = target {
        raise_window(state, window_id);
    }
}

/// Opens the stack menu for `app_key`, replacing any other open menu.
///
/// Emits fresh capture requests for the app's visible instances; minimized
/// instances reuse their cached previews.
fn open_stack_menu(
    state: &mut DesktopState,
    app_key: AppKey,
    anchor: WindowRect,
    viewport: WindowRect,
) -> Vec<RuntimeEffect> {
    let instances = state.store.instances_of(&app_key);
    let stackable = instances.first().map(|w| w.rules.stack).unwrap_or(false);
    if !stackable {
        return Vec::new();
    }
    let count = instances.len();
    let captures: Vec<RuntimeEffect> = instances
        .iter()
        .filter(|w| w.is_visible())
        .map(|w| RuntimeEffect::CapturePreview { window_id: w.id })
        .collect();

    close_stack_menu(state);
    state.stack_menu = Some(StackMenuState::open(app_key, anchor, viewport, count));
    captures
}

/// Shows the temp-unminimize phantom for a minimized window; at most one
/// window is phantom-previewed at a time.
fn activate_temp_preview(state: &mut DesktopState, window_id: WindowId) {
    let minimized = state
        .store
        .find(window_id)
        .map(|w| w.minimized)
        .unwrap_or(false);
    if !minimized {
        if let Some(menu) = state.stack_menu.as_mut() {
            menu.hover = None;
        }
        return;
    }

    revert_temp_preview(state);
    if let Some(window) = state.store.find_mut(window_id) {
        window.temp_preview = true;
    }
    if let Some(menu) = state.stack_menu.as_mut() {
        menu.temp_preview = Some(window_id);
        menu.hover = None;
    }
}

/// Reverts any active temp-unminimize phantom; the window's minimized state
/// never changed, only its phantom styling.
fn revert_temp_preview(state: &mut DesktopState) {
    let Some(window_id) = state.stack_menu.as_mut().and_then(|m| m.temp_preview.take()) else {
        return;
    };
    if let Some(window) = state.store.find_mut(window_id) {
        window.temp_preview = false;
    }
}

/// Closes the stack menu, reverting any phantom preview.
fn close_stack_menu(state: &mut DesktopState) {
    revert_temp_preview(state);
    state.stack_menu = None;
}

/// Removes a window, releasing its taskbar icon and instance-scoped assets in
/// the same transition.
fn handle_close(state: &mut DesktopState, window_id: WindowId) -> Vec<RuntimeEffect> {
    let Some(record) = state.store.remove(window_id) else {
        return Vec::new();
    };

    if let Some(menu) = state.stack_menu.as_mut() {
        if menu.temp_preview == Some(window_id) {
            menu.temp_preview = None;
        }
        if menu.hover.map_or(false, |h| h.window_id == window_id) {
            menu.hover = None;
        }
    }
    let menu_empty = state
        .stack_menu
        .as_ref()
        .map_or(false, |m| m.app_key == record.app_key && state.store.count(&record.app_key) == 0);
    if menu_empty {
        close_stack_menu(state);
    }

    let mut effects = vec![RuntimeEffect::ReleaseWindowAssets {
        window_id,
        app_key: record.app_key.clone(),
    }];
    if record.rules.backend == ContentBackend::Native {
        effects.push(RuntimeEffect::NativeKill { window_id });
    }
    effects.push(RuntimeEffect::PersistLayout { reason: "close" });
    effects
}

fn find_window_mut(
    state: &mut DesktopState,
    window_id: WindowId,
) -> Result<&mut WindowRecord, LifecycleError> {
    state
        .store
        .find_mut(window_id)
        .ok_or(LifecycleError::WindowNotFound)
}
