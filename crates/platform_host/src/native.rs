//! Native-process launch/kill contracts for stream-backed windows.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use desktop_app_contract::{AppKey, WindowRuntimeId};

/// Object-safe boxed future used by [`NativeProcessService`] async methods.
pub type NativeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a native launch negotiation.
pub enum NativeLaunch {
    /// The process is up; embed the stream at `stream_url`.
    Ready {
        /// Stream descriptor URL.
        stream_url: String,
    },
    /// The launch requires elevated-trust approval and is deferred; neither
    /// success nor hard failure.
    PendingApproval,
    /// The launch failed.
    Failed {
        /// Failure description.
        message: String,
        /// Optional remediation hint.
        hint: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Out-of-band event from the native host, tagged with the target instance.
///
/// Receivers must match `instance` against a live window and drop stale
/// events for instances that have since closed.
pub enum NativeEvent {
    /// A stream became available after launch.
    Stream {
        /// Target window instance.
        instance: WindowRuntimeId,
        /// Stream descriptor URL.
        stream_url: String,
    },
    /// The process reported an error.
    Error {
        /// Target window instance.
        instance: WindowRuntimeId,
        /// Failure description.
        message: String,
    },
}

/// Launch/kill control surface for native-backend apps, keyed by instance.
pub trait NativeProcessService {
    /// Starts the native process for one window instance.
    fn launch<'a>(
        &'a self,
        app_key: &'a AppKey,
        instance: WindowRuntimeId,
    ) -> NativeFuture<'a, Result<NativeLaunch, String>>;

    /// Stops the native process for one window instance.
    fn kill<'a>(&'a self, instance: WindowRuntimeId) -> NativeFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Native host that rejects every launch; baseline for web-only deployments.
pub struct NoopNativeProcessService;

impl NativeProcessService for NoopNativeProcessService {
    fn launch<'a>(
        &'a self,
        app_key: &'a AppKey,
        _instance: WindowRuntimeId,
    ) -> NativeFuture<'a, Result<NativeLaunch, String>> {
        Box::pin(async move {
            Ok(NativeLaunch::Failed {
                message: format!("no native host configured for `{app_key}`"),
                hint: Some("install a streaming host and relaunch".to_string()),
            })
        })
    }

    fn kill<'a>(&'a self, _instance: WindowRuntimeId) -> NativeFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory native host with scripted launches and recorded kills.
pub struct MemoryNativeProcessService {
    launches: Rc<RefCell<BTreeMap<AppKey, NativeLaunch>>>,
    kills: Rc<RefCell<Vec<WindowRuntimeId>>>,
}

impl MemoryNativeProcessService {
    /// Scripts the launch outcome for `app_key`.
    pub fn script_launch(&self, app_key: AppKey, outcome: NativeLaunch) {
        self.launches.borrow_mut().insert(app_key, outcome);
    }

    /// Returns the instances killed so far, in order.
    pub fn killed(&self) -> Vec<WindowRuntimeId> {
        self.kills.borrow().clone()
    }
}

impl NativeProcessService for MemoryNativeProcessService {
    fn launch<'a>(
        &'a self,
        app_key: &'a AppKey,
        _instance: WindowRuntimeId,
    ) -> NativeFuture<'a, Result<NativeLaunch, String>> {
        Box::pin(async move {
            Ok(self
                .launches
                .borrow()
                .get(app_key)
                .cloned()
                .unwrap_or(NativeLaunch::Failed {
                    message: format!("no scripted launch for `{app_key}`"),
                    hint: None,
                }))
        })
    }

    fn kill<'a>(&'a self, instance: WindowRuntimeId) -> NativeFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.kills.borrow_mut().push(instance);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_service_scripts_launch_and_records_kills() {
        let service = MemoryNativeProcessService::default();
        let key = AppKey::trusted("frutiger-os");
        service.script_launch(
            key.clone(),
            NativeLaunch::Ready {
                stream_url: "stream://7".to_string(),
            },
        );

        let launched = block_on(service.launch(&key, 7)).expect("launch");
        assert_eq!(
            launched,
            NativeLaunch::Ready {
                stream_url: "stream://7".to_string()
            }
        );

        block_on(service.kill(7)).expect("kill");
        block_on(service.kill(7)).expect("second kill is accepted");
        assert_eq!(service.killed(), vec![7, 7]);
    }
}
