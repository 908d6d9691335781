//! Host service bundle injected into the desktop runtime.

use std::rc::Rc;

use crate::{
    content::{ContentLoader, NoopContentLoader},
    manifest::{AppManifestSource, NoopManifestSource},
    native::{NativeProcessService, NoopNativeProcessService},
    preview::{NoopPreviewCapture, PreviewCaptureService},
    storage::{NoopStateStore, StateStore},
    time::{Clock, SystemClock},
};

#[derive(Clone)]
/// Bundle of host collaborators consumed by the desktop runtime.
///
/// Constructed once by the entry layer and passed by reference everywhere;
/// tests swap individual services for `Memory*` adapters.
pub struct HostServices {
    /// App-manifest source.
    pub manifest: Rc<dyn AppManifestSource>,
    /// Window-content loader.
    pub content: Rc<dyn ContentLoader>,
    /// Native-process launch/kill control.
    pub native: Rc<dyn NativeProcessService>,
    /// Best-effort preview capture.
    pub preview: Rc<dyn PreviewCaptureService>,
    /// Snapshot persistence store.
    pub state: Rc<dyn StateStore>,
    /// Injectable time source.
    pub clock: Rc<dyn Clock>,
}

impl HostServices {
    /// A bundle of no-op services; every feature degrades gracefully.
    pub fn noop() -> Self {
        Self {
            manifest: Rc::new(NoopManifestSource),
            content: Rc::new(NoopContentLoader),
            native: Rc::new(NoopNativeProcessService),
            preview: Rc::new(NoopPreviewCapture),
            state: Rc::new(NoopStateStore),
            clock: Rc::new(SystemClock),
        }
    }
}
