//! Credential source.
//!
//! [`Environment`] is a flat string map standing in for the process
//! environment. It is read for provider keys and written when an
//! OpenAI-compatible vendor is remapped onto the generic slots.
//! [`CredentialStore`] is the single shared instance, guarded by a mutex so
//! at most one provider's credentials are active at a time.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Generic OpenAI-protocol credential slot
pub const GENERIC_API_KEY: &str = "OPENAI_API_KEY";

/// Generic OpenAI-protocol base URL override
pub const GENERIC_API_BASE: &str = "OPENAI_API_BASE";

/// Active provider selection
pub const MODEL_PROVIDER: &str = "MODEL_PROVIDER";

/// One generic slot under a remap: what the caller had there, and what the
/// remap wrote over it.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RemappedSlot {
    original: Option<String>,
    written: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct GenericSlots {
    api_key: RemappedSlot,
    api_base: RemappedSlot,
}

#[derive(Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
    saved: Option<GenericSlots>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            saved: None,
        }
    }

    /// Snapshot the OS environment, then fill in anything missing from a
    /// `.env` file. Process variables win over the file.
    pub fn from_process() -> Self {
        let mut env = Self::from_vars(std::env::vars());

        match dotenvy::dotenv_iter() {
            Ok(iter) => {
                for (key, value) in iter.flatten() {
                    env.vars.entry(key).or_insert(value);
                }
            }
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env file"),
        }

        env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Whether a compatibility remap is currently in effect
    pub fn is_remapped(&self) -> bool {
        self.saved.is_some()
    }

    /// Point the generic slots at another vendor.
    ///
    /// A slot still holding the previous remap's value keeps its saved
    /// original; a slot the caller has written since becomes the new
    /// original.
    pub(crate) fn remap_generic(&mut self, api_key: &str, api_base: &str) {
        let previous = self.saved.take();
        let api_key = self.remap_slot(GENERIC_API_KEY, previous.as_ref().map(|p| &p.api_key), api_key);
        let api_base = self.remap_slot(GENERIC_API_BASE, previous.as_ref().map(|p| &p.api_base), api_base);
        self.saved = Some(GenericSlots { api_key, api_base });
    }

    fn remap_slot(&mut self, key: &str, previous: Option<&RemappedSlot>, value: &str) -> RemappedSlot {
        let current = self.vars.get(key).cloned();
        let original = match previous {
            Some(slot) if current.as_deref() == Some(slot.written.as_str()) => slot.original.clone(),
            _ => current,
        };
        self.set(key, value);
        RemappedSlot {
            original,
            written: value.to_string(),
        }
    }

    /// Undo any active remap. No-op when nothing is remapped.
    ///
    /// Only slots that still hold what the remap wrote are put back; a
    /// value the caller set in the meantime is left alone.
    pub(crate) fn restore_generic(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };
        for (key, slot) in [(GENERIC_API_KEY, saved.api_key), (GENERIC_API_BASE, saved.api_base)] {
            if self.get(key) != Some(slot.written.as_str()) {
                continue;
            }
            match slot.original {
                Some(v) => self.set(key, v),
                None => {
                    self.vars.remove(key);
                }
            }
        }
    }
}

// Values are credentials; only keys are printed.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Environment")
            .field("keys", &keys)
            .field("remapped", &self.is_remapped())
            .finish()
    }
}

/// The process-wide credential environment
#[derive(Debug, Default)]
pub struct CredentialStore {
    inner: Mutex<Environment>,
}

impl CredentialStore {
    pub fn new(env: Environment) -> Self {
        Self { inner: Mutex::new(env) }
    }

    pub fn from_process() -> Self {
        Self::new(Environment::from_process())
    }

    /// Exclusive access for one resolve-and-build section.
    ///
    /// A panic while the lock was held leaves the map itself intact, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, Environment> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).map(str::to_string)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().set(key, value);
    }

    pub fn snapshot(&self) -> Environment {
        self.lock().clone()
    }
}
