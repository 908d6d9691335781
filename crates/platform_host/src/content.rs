//! Window-content loading contracts and adapters.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use desktop_app_contract::{AppKey, AppModule, ContentBackend, WindowRuntimeId};
use thiserror::Error;

/// Object-safe boxed future used by [`ContentLoader`] async methods.
pub type ContentFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Content produced by a successful load.
#[derive(Clone)]
pub enum LoadedContent {
    /// Fetched markup plus an optional app module implementing the fixed
    /// entry-point contract.
    Web {
        /// Markup inserted into the window body.
        html: String,
        /// App module, shared by every instance of the same app.
        module: Option<Rc<dyn AppModule>>,
    },
    /// Stream surface negotiated with the native-process host.
    NativeStream {
        /// Stream descriptor URL to embed.
        stream_url: String,
    },
}

impl std::fmt::Debug for LoadedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Web { html, module } => f
                .debug_struct("Web")
                .field("html_len", &html.len())
                .field("has_module", &module.is_some())
                .finish(),
            Self::NativeStream { stream_url } => f
                .debug_struct("NativeStream")
                .field("stream_url", stream_url)
                .finish(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures raised while loading window content.
///
/// Every variant degrades the affected window only: the body shows an inline
/// diagnostic while the window stays open, closable, and draggable.
pub enum ContentError {
    /// The content transport failed or returned malformed data.
    #[error("content load failed: {0}")]
    LoadFailed(String),
    /// The app ships a module that does not expose the `initialize` entry point.
    #[error("app module is missing the `initialize` entry point")]
    MissingEntryPoint,
    /// The native-process host rejected the launch.
    #[error("native launch failed: {message}")]
    NativeLaunchFailed {
        /// Failure description shown in the window diagnostic.
        message: String,
        /// Optional remediation hint appended to the diagnostic.
        hint: Option<String>,
    },
    /// The launch is deferred pending elevated-trust approval.
    #[error("native launch awaiting user approval")]
    PendingApproval,
}

/// Loads window content for an app, keyed by its configured backend.
pub trait ContentLoader {
    /// Loads the content for one window instance.
    fn load<'a>(
        &'a self,
        app_key: &'a AppKey,
        instance: WindowRuntimeId,
        backend: ContentBackend,
    ) -> ContentFuture<'a, Result<LoadedContent, ContentError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Loader that fails every request; baseline for degraded environments.
pub struct NoopContentLoader;

impl ContentLoader for NoopContentLoader {
    fn load<'a>(
        &'a self,
        app_key: &'a AppKey,
        _instance: WindowRuntimeId,
        _backend: ContentBackend,
    ) -> ContentFuture<'a, Result<LoadedContent, ContentError>> {
        Box::pin(async move {
            Err(ContentError::LoadFailed(format!(
                "no content transport configured for `{app_key}`"
            )))
        })
    }
}

#[derive(Clone, Default)]
/// In-memory loader serving scripted responses per app key.
pub struct MemoryContentLoader {
    responses: Rc<RefCell<BTreeMap<AppKey, Result<LoadedContent, ContentError>>>>,
    load_count: Rc<RefCell<BTreeMap<AppKey, usize>>>,
}

impl MemoryContentLoader {
    /// Scripts the response returned for `app_key`.
    pub fn script(&self, app_key: AppKey, response: Result<LoadedContent, ContentError>) {
        self.responses.borrow_mut().insert(app_key, response);
    }

    /// Scripts a plain markup response with no module.
    pub fn script_html(&self, app_key: AppKey, html: impl Into<String>) {
        self.script(
            app_key,
            Ok(LoadedContent::Web {
                html: html.into(),
                module: None,
            }),
        );
    }

    /// Returns how many loads were requested for `app_key`.
    pub fn loads_for(&self, app_key: &AppKey) -> usize {
        self.load_count.borrow().get(app_key).copied().unwrap_or(0)
    }
}

impl ContentLoader for MemoryContentLoader {
    fn load<'a>(
        &'a self,
        app_key: &'a AppKey,
        _instance: WindowRuntimeId,
        _backend: ContentBackend,
    ) -> ContentFuture<'a, Result<LoadedContent, ContentError>> {
        Box::pin(async move {
            *self
                .load_count
                .borrow_mut()
                .entry(app_key.clone())
                .or_insert(0) += 1;
            self.responses
                .borrow()
                .get(app_key)
                .cloned()
                .unwrap_or_else(|| {
                    Err(ContentError::LoadFailed(format!(
                        "no scripted content for `{app_key}`"
                    )))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_loader_serves_scripted_html_and_counts_loads() {
        let loader = MemoryContentLoader::default();
        let key = AppKey::trusted("about");
        loader.script_html(key.clone(), "<p>About</p>");

        let first = block_on(loader.load(&key, 1, ContentBackend::Web)).expect("content");
        match first {
            LoadedContent::Web { html, module } => {
                assert_eq!(html, "<p>About</p>");
                assert!(module.is_none());
            }
            other => panic!("unexpected content: {other:?}"),
        }
        assert_eq!(loader.loads_for(&key), 1);
    }

    #[test]
    fn unscripted_app_fails_with_load_error() {
        let loader = MemoryContentLoader::default();
        let key = AppKey::trusted("ghost");
        let err = block_on(loader.load(&key, 7, ContentBackend::Web)).expect_err("failure");
        assert!(matches!(err, ContentError::LoadFailed(_)));
    }
}
