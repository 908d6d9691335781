//! App-rules registry: cached, infallible resolution over the manifest source.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use desktop_app_contract::{AppKey, AppRules};
use platform_host::AppManifestSource;
use tracing::warn;

/// Resolves app keys to launch rules, caching results for the session.
///
/// Resolution never fails: a manifest fetch error is logged and masked by the
/// built-in default rules, which are cached so the fetch is not retried per
/// open.
pub struct AppRegistry {
    source: Rc<dyn AppManifestSource>,
    cache: RefCell<HashMap<AppKey, AppRules>>,
}

impl AppRegistry {
    /// Creates a registry over a manifest source.
    pub fn new(source: Rc<dyn AppManifestSource>) -> Self {
        Self {
            source,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the rules for `app_key`, fetching and caching on first use.
    pub async fn resolve(&self, app_key: &AppKey) -> AppRules {
        if let Some(rules) = self.cache.borrow().get(app_key) {
            return rules.clone();
        }

        let rules = match self.source.rules_for(app_key).await {
            Ok(rules) => rules,
            Err(err) => {
                warn!(app = %app_key, %err, "manifest fetch failed; using default rules");
                AppRules::default()
            }
        };
        self.cache
            .borrow_mut()
            .insert(app_key.clone(), rules.clone());
        rules
    }

    /// Lists installed apps, populating the cache for all returned entries.
    ///
    /// A listing failure is logged and yields an empty launcher set.
    pub async fn list_installed(&self) -> Vec<(AppKey, AppRules)> {
        match self.source.installed_apps().await {
            Ok(apps) => {
                let mut cache = self.cache.borrow_mut();
                for (app_key, rules) in &apps {
                    cache.insert(app_key.clone(), rules.clone());
                }
                apps
            }
            Err(err) => {
                warn!(%err, "installed-apps listing failed");
                Vec::new()
            }
        }
    }

    /// Returns the cached rules for `app_key`, if already resolved.
    pub fn cached(&self, app_key: &AppKey) -> Option<AppRules> {
        self.cache.borrow().get(app_key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::{ManifestError, ManifestFuture, NoopManifestSource, StaticManifestSource};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    use super::*;

    struct CountingFailSource {
        calls: Cell<usize>,
    }

    impl AppManifestSource for CountingFailSource {
        fn rules_for<'a>(
            &'a self,
            _app_key: &'a AppKey,
        ) -> ManifestFuture<'a, Result<AppRules, ManifestError>> {
            Box::pin(async move {
                self.calls.set(self.calls.get() + 1);
                Err(ManifestError::Unavailable("connection refused".to_string()))
            })
        }

        fn installed_apps<'a>(
            &'a self,
        ) -> ManifestFuture<'a, Result<Vec<(AppKey, AppRules)>, ManifestError>> {
            Box::pin(async { Err(ManifestError::Unavailable("connection refused".to_string())) })
        }
    }

    #[test]
    fn resolve_caches_manifest_rules() {
        let source = StaticManifestSource::default();
        let key = AppKey::trusted("software");
        let mut rules = AppRules::default();
        rules.max_instances = -1;
        source.insert(key.clone(), rules.clone());

        let registry = AppRegistry::new(Rc::new(source));
        assert_eq!(block_on(registry.resolve(&key)), rules);
        assert_eq!(registry.cached(&key), Some(rules));
    }

    #[test]
    fn fetch_failure_is_masked_by_cached_defaults() {
        let source = Rc::new(CountingFailSource {
            calls: Cell::new(0),
        });
        let registry = AppRegistry::new(source.clone());
        let key = AppKey::trusted("flaky");

        assert_eq!(block_on(registry.resolve(&key)), AppRules::default());
        assert_eq!(block_on(registry.resolve(&key)), AppRules::default());
        // The default is cached, so the failing source is hit exactly once.
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn listing_populates_the_cache() {
        let source = StaticManifestSource::default();
        let key = AppKey::trusted("about");
        source.insert(key.clone(), AppRules::default());

        let registry = AppRegistry::new(Rc::new(source));
        let listed = block_on(registry.list_installed());
        assert_eq!(listed.len(), 1);
        assert!(registry.cached(&key).is_some());
    }

    #[test]
    fn empty_source_lists_nothing() {
        let registry = AppRegistry::new(Rc::new(NoopManifestSource));
        assert!(block_on(registry.list_installed()).is_empty());
    }
}
