//! Per-request option bag.
//!
//! Options are keyed by a stable string identifier chosen by the option type.
//! The bag travels from the request description to the native request so
//! transport middleware can read the options it understands; payloads under a
//! key a reader does not know are ignored.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A typed option that can be carried in [`RequestOptions`].
pub trait RequestOption: Any + Send + Sync {
    /// Stable identifier of this option kind.
    const KEY: &'static str;
}

/// Mapping from option key to an opaque payload.
#[derive(Clone, Default)]
pub struct RequestOptions {
    entries: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `option` under its key, replacing any previous payload.
    pub fn add<O: RequestOption>(&mut self, option: O) {
        self.entries.insert(O::KEY, Arc::new(option));
    }

    /// Returns the option of type `O`, if present under `O::KEY` with that type.
    pub fn get<O: RequestOption>(&self) -> Option<&O> {
        self.entries
            .get(O::KEY)
            .and_then(|payload| payload.downcast_ref::<O>())
    }

    /// Copies every entry of `other` that is not already present in `self`.
    pub fn merge_missing(&mut self, other: &RequestOptions) {
        for (key, payload) in &other.entries {
            self.entries
                .entry(*key)
                .or_insert_with(|| Arc::clone(payload));
        }
    }
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("RequestOptions").field("keys", &keys).finish()
    }
}
