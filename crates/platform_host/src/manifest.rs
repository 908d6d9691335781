//! App-manifest source contracts and adapters.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use desktop_app_contract::{AppKey, AppRules};
use thiserror::Error;

/// Object-safe boxed future used by [`AppManifestSource`] async methods.
pub type ManifestFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures raised by a manifest source.
///
/// Callers mask every variant behind the built-in default rules; a manifest
/// failure must never block window creation.
pub enum ManifestError {
    /// The manifest backend could not be reached or returned malformed data.
    #[error("manifest unavailable: {0}")]
    Unavailable(String),
    /// The app key is not present in the manifest.
    #[error("unknown app `{0}`")]
    UnknownApp(String),
}

/// Source of per-app launch rules and the installed-apps listing.
pub trait AppManifestSource {
    /// Fetches the launch rules for one app.
    fn rules_for<'a>(
        &'a self,
        app_key: &'a AppKey,
    ) -> ManifestFuture<'a, Result<AppRules, ManifestError>>;

    /// Lists every installed app with its rules.
    fn installed_apps<'a>(
        &'a self,
    ) -> ManifestFuture<'a, Result<Vec<(AppKey, AppRules)>, ManifestError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Manifest source that knows no apps; every lookup fails.
pub struct NoopManifestSource;

impl AppManifestSource for NoopManifestSource {
    fn rules_for<'a>(
        &'a self,
        app_key: &'a AppKey,
    ) -> ManifestFuture<'a, Result<AppRules, ManifestError>> {
        Box::pin(async move { Err(ManifestError::UnknownApp(app_key.as_str().to_string())) })
    }

    fn installed_apps<'a>(
        &'a self,
    ) -> ManifestFuture<'a, Result<Vec<(AppKey, AppRules)>, ManifestError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory manifest source backed by a fixed rules table.
pub struct StaticManifestSource {
    apps: Rc<RefCell<BTreeMap<AppKey, AppRules>>>,
}

impl StaticManifestSource {
    /// Creates a source from `(key, rules)` pairs.
    pub fn with_apps(apps: impl IntoIterator<Item = (AppKey, AppRules)>) -> Self {
        Self {
            apps: Rc::new(RefCell::new(apps.into_iter().collect())),
        }
    }

    /// Inserts or replaces the rules for one app.
    pub fn insert(&self, app_key: AppKey, rules: AppRules) {
        self.apps.borrow_mut().insert(app_key, rules);
    }
}

impl AppManifestSource for StaticManifestSource {
    fn rules_for<'a>(
        &'a self,
        app_key: &'a AppKey,
    ) -> ManifestFuture<'a, Result<AppRules, ManifestError>> {
        Box::pin(async move {
            self.apps
                .borrow()
                .get(app_key)
                .cloned()
                .ok_or_else(|| ManifestError::UnknownApp(app_key.as_str().to_string()))
        })
    }

    fn installed_apps<'a>(
        &'a self,
    ) -> ManifestFuture<'a, Result<Vec<(AppKey, AppRules)>, ManifestError>> {
        Box::pin(async move {
            Ok(self
                .apps
                .borrow()
                .iter()
                .map(|(key, rules)| (key.clone(), rules.clone()))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn static_source_serves_inserted_rules() {
        let source = StaticManifestSource::default();
        let key = AppKey::trusted("software");
        let mut rules = AppRules::default();
        rules.stack = true;
        source.insert(key.clone(), rules.clone());

        let fetched = block_on(source.rules_for(&key)).expect("rules");
        assert_eq!(fetched, rules);

        let listed = block_on(source.installed_apps()).expect("list");
        assert_eq!(listed, vec![(key, rules)]);
    }

    #[test]
    fn unknown_app_is_a_distinct_error() {
        let source = StaticManifestSource::default();
        let missing = AppKey::trusted("absent");
        let err = block_on(source.rules_for(&missing)).expect_err("missing app");
        assert_eq!(err, ManifestError::UnknownApp("absent".to_string()));
    }
}
