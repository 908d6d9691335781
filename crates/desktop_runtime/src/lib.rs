//! Window/instance lifecycle core for the web-desktop shell.
//!
//! State transitions live in [`reducer`] as a pure function over
//! [`model::DesktopState`] emitting side-effect intents; [`runtime`] owns the
//! long-lived session, executes effects against [`platform_host`] services,
//! and serializes snapshot save/restore.

pub mod assets;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod registry;
pub mod runtime;
pub mod stack_menu;
pub mod store;
pub mod taskbar;
pub mod timers;
pub mod window_manager;

pub use model::*;
pub use persistence::{build_snapshot, restore_plan, DesktopSnapshot, WindowSnapshotEntry};
pub use reducer::{
    reduce_desktop, ContentOutcome, DesktopAction, LifecycleError, OpenWindowRequest,
    RuntimeEffect,
};
pub use registry::AppRegistry;
pub use runtime::DesktopRuntime;
pub use store::WindowInstanceStore;
