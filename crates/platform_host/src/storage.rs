//! Snapshot persistence contracts, envelope types, and helpers.
//!
//! The persistence collaborator is independently consistent with
//! last-write-wins semantics; callers never merge concurrent saves.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Version for [`StateEnvelope`] metadata serialization.
pub const STATE_ENVELOPE_VERSION: u32 = 1;
/// Namespace used by the desktop layout snapshot.
pub const DESKTOP_STATE_NAMESPACE: &str = "system.desktop";

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// Versioned envelope for persisted state payloads.
pub struct StateEnvelope {
    /// Envelope schema version.
    pub envelope_version: u32,
    /// Namespace identifying the owning domain.
    pub namespace: String,
    /// Domain-defined schema version for the payload.
    pub schema_version: u32,
    /// Last update time in unix milliseconds.
    pub updated_at_unix_ms: u64,
    /// Serialized payload.
    pub payload: Value,
}

impl StateEnvelope {
    /// Creates a new envelope stamped with a monotonic timestamp.
    pub fn new(namespace: impl Into<String>, schema_version: u32, payload: Value) -> Self {
        Self {
            envelope_version: STATE_ENVELOPE_VERSION,
            namespace: namespace.into(),
            schema_version,
            updated_at_unix_ms: crate::time::next_monotonic_timestamp_ms(),
            payload,
        }
    }
}

/// Object-safe boxed future used by [`StateStore`] async methods.
pub type StateStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Storage service for loading and saving state envelopes by namespace.
pub trait StateStore {
    /// Loads a persisted envelope by namespace.
    fn load_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> StateStoreFuture<'a, Result<Option<StateEnvelope>, String>>;

    /// Saves a full envelope, replacing any previous value for its namespace.
    fn save_envelope<'a>(
        &'a self,
        envelope: &'a StateEnvelope,
    ) -> StateStoreFuture<'a, Result<(), String>>;

    /// Deletes persisted state for a namespace.
    fn delete<'a>(&'a self, namespace: &'a str) -> StateStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op state store for unsupported targets and baseline tests.
pub struct NoopStateStore;

impl StateStore for NoopStateStore {
    fn load_envelope<'a>(
        &'a self,
        _namespace: &'a str,
    ) -> StateStoreFuture<'a, Result<Option<StateEnvelope>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_envelope<'a>(
        &'a self,
        _envelope: &'a StateEnvelope,
    ) -> StateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn delete<'a>(&'a self, _namespace: &'a str) -> StateStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory state store keyed by namespace.
pub struct MemoryStateStore {
    inner: Rc<RefCell<HashMap<String, StateEnvelope>>>,
}

impl MemoryStateStore {
    /// Returns the number of stored namespaces.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns whether the store holds no envelopes.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn load_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> StateStoreFuture<'a, Result<Option<StateEnvelope>, String>> {
        Box::pin(async move { Ok(self.inner.borrow().get(namespace).cloned()) })
    }

    fn save_envelope<'a>(
        &'a self,
        envelope: &'a StateEnvelope,
    ) -> StateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(envelope.namespace.clone(), envelope.clone());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, namespace: &'a str) -> StateStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(namespace);
            Ok(())
        })
    }
}

/// Builds a versioned [`StateEnvelope`] from a serializable payload.
///
/// # Errors
///
/// Returns an error when `payload` cannot be converted to JSON.
pub fn build_state_envelope<T: Serialize>(
    namespace: &str,
    schema_version: u32,
    payload: &T,
) -> Result<StateEnvelope, String> {
    let payload = serde_json::to_value(payload).map_err(|e| e.to_string())?;
    Ok(StateEnvelope::new(
        namespace.to_string(),
        schema_version,
        payload,
    ))
}

/// Deserializes an envelope payload into a target type.
///
/// # Errors
///
/// Returns an error when deserialization fails.
pub fn decode_envelope_payload<T: DeserializeOwned>(envelope: &StateEnvelope) -> Result<T, String> {
    serde_json::from_value(envelope.payload.clone()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn envelope_serialization_shape_is_stable() {
        let envelope = StateEnvelope {
            envelope_version: STATE_ENVELOPE_VERSION,
            namespace: DESKTOP_STATE_NAMESPACE.to_string(),
            schema_version: 3,
            updated_at_unix_ms: 99,
            payload: json!({"ok": true}),
        };

        let value = serde_json::to_value(&envelope).expect("serialize envelope");
        let object = value.as_object().expect("object");
        assert_eq!(object.get("envelope_version"), Some(&json!(1)));
        assert_eq!(object.get("namespace"), Some(&json!("system.desktop")));
        assert_eq!(object.get("schema_version"), Some(&json!(3)));
        assert_eq!(object.get("payload"), Some(&json!({"ok": true})));
    }

    #[test]
    fn envelope_new_uses_monotonic_timestamp() {
        let first = StateEnvelope::new("system.desktop", 1, json!({"n": 1}));
        let second = StateEnvelope::new("system.desktop", 1, json!({"n": 2}));
        assert!(second.updated_at_unix_ms > first.updated_at_unix_ms);
    }

    #[test]
    fn memory_state_store_round_trip_overwrite_and_delete() {
        let store = MemoryStateStore::default();
        let store_obj: &dyn StateStore = &store;

        let envelope = StateEnvelope::new(DESKTOP_STATE_NAMESPACE, 1, json!({"v": 1}));
        let updated = StateEnvelope {
            payload: json!({"v": 2}),
            ..envelope.clone()
        };

        block_on(store_obj.save_envelope(&envelope)).expect("save");
        block_on(store_obj.save_envelope(&updated)).expect("overwrite");

        let loaded = block_on(store_obj.load_envelope(DESKTOP_STATE_NAMESPACE))
            .expect("load")
            .expect("present");
        assert_eq!(loaded.payload, json!({"v": 2}));

        block_on(store_obj.delete(DESKTOP_STATE_NAMESPACE)).expect("delete");
        assert_eq!(
            block_on(store_obj.load_envelope(DESKTOP_STATE_NAMESPACE)).expect("load"),
            None
        );
    }

    #[test]
    fn noop_state_store_is_empty_and_successful() {
        let store_obj: &dyn StateStore = &NoopStateStore;
        let envelope = StateEnvelope::new("noop", 1, json!({}));

        assert_eq!(block_on(store_obj.load_envelope("noop")).expect("load"), None);
        block_on(store_obj.save_envelope(&envelope)).expect("save");
        block_on(store_obj.delete("noop")).expect("delete");
    }

    #[test]
    fn decode_envelope_payload_errors_on_type_mismatch() {
        let envelope = StateEnvelope::new("system.desktop", 1, json!({"count": "bad"}));

        #[derive(Debug, serde::Deserialize)]
        struct Typed {
            #[allow(dead_code)]
            count: u32,
        }

        assert!(decode_envelope_payload::<Typed>(&envelope).is_err());
    }
}
