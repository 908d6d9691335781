//! Window preview-capture contracts and adapters.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use desktop_app_contract::WindowRuntimeId;

/// Encoded bitmap payload (data-URL form) for stack-menu thumbnails and
/// minimized-window restoration.
pub type PreviewImage = String;

/// Object-safe boxed future used by [`PreviewCaptureService`] async methods.
pub type PreviewFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Best-effort snapshot of a window's current visual state.
///
/// Capture never retries and never errors: `None` means "no thumbnail" and
/// callers fall back to a placeholder glyph.
pub trait PreviewCaptureService {
    /// Captures the window's current visual state, if possible.
    fn capture<'a>(&'a self, instance: WindowRuntimeId) -> PreviewFuture<'a, Option<PreviewImage>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Capture service that never produces a thumbnail.
pub struct NoopPreviewCapture;

impl PreviewCaptureService for NoopPreviewCapture {
    fn capture<'a>(
        &'a self,
        _instance: WindowRuntimeId,
    ) -> PreviewFuture<'a, Option<PreviewImage>> {
        Box::pin(async { None })
    }
}

#[derive(Debug, Clone, Default)]
/// Capture service returning a fixed payload and counting capture requests.
pub struct FixedPreviewCapture {
    image: Rc<RefCell<Option<PreviewImage>>>,
    captures: Rc<RefCell<Vec<WindowRuntimeId>>>,
}

impl FixedPreviewCapture {
    /// Creates a service that always returns `image`.
    pub fn returning(image: impl Into<PreviewImage>) -> Self {
        Self {
            image: Rc::new(RefCell::new(Some(image.into()))),
            captures: Rc::default(),
        }
    }

    /// Returns the instances captured so far, in request order.
    pub fn captured(&self) -> Vec<WindowRuntimeId> {
        self.captures.borrow().clone()
    }
}

impl PreviewCaptureService for FixedPreviewCapture {
    fn capture<'a>(&'a self, instance: WindowRuntimeId) -> PreviewFuture<'a, Option<PreviewImage>> {
        Box::pin(async move {
            self.captures.borrow_mut().push(instance);
            self.image.borrow().clone()
        })
    }
}
