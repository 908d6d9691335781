//! Typed host-domain contracts consumed by the desktop runtime.
//!
//! This crate is the API-first boundary between the window-manager core and
//! its external collaborators: manifest source, content loader, native process
//! control, preview capture, and snapshot persistence. Each service is an
//! object-safe trait with boxed local futures, paired with `Noop*` adapters
//! for unsupported targets and `Memory*` adapters for tests. Concrete browser
//! or server transports live outside this crate.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod content;
pub mod manifest;
pub mod native;
pub mod preview;
pub mod services;
pub mod storage;
pub mod time;

pub use content::{ContentError, ContentFuture, ContentLoader, LoadedContent, MemoryContentLoader, NoopContentLoader};
pub use manifest::{
    AppManifestSource, ManifestError, ManifestFuture, NoopManifestSource, StaticManifestSource,
};
pub use native::{
    MemoryNativeProcessService, NativeEvent, NativeFuture, NativeLaunch, NativeProcessService,
    NoopNativeProcessService,
};
pub use preview::{
    FixedPreviewCapture, NoopPreviewCapture, PreviewCaptureService, PreviewFuture, PreviewImage,
};
pub use services::HostServices;
pub use storage::{
    build_state_envelope, decode_envelope_payload, MemoryStateStore, NoopStateStore, StateEnvelope,
    StateStore, StateStoreFuture, DESKTOP_STATE_NAMESPACE, STATE_ENVELOPE_VERSION,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
