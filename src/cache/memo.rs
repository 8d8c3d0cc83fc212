// Per-instance memoization of derived values.
// Values are keyed by property name, computed on first read and never invalidated.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;

use serde_json::Value;

use crate::error::Result;

/// Cache of computed values owned by a single client instance.
///
/// Reads go through `&mut self`, so one owner drives it at a time. It is not
/// meant to be shared across tasks.
#[derive(Debug, Default)]
pub struct Memo {
    values: HashMap<&'static str, Value>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value cached under `key`, computing it with `init` on first use.
    ///
    /// If `init` fails the error is returned and nothing is stored, so the next
    /// read runs `init` again.
    pub async fn get_or_try_init<F, Fut>(&mut self, key: &'static str, init: F) -> Result<&Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        match self.values.entry(key) {
            Entry::Occupied(entry) => {
                log::trace!("memo hit for {key}");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                log::debug!("memo miss for {key}, computing");
                let value = init().await?;
                Ok(entry.insert(value))
            }
        }
    }

    /// Cached value for `key`, if it has been computed.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
