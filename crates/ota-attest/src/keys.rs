//! KeyHolder: the process-wide signing key behind an atomic swap.
//!
//! Readers take a cheap `Arc` snapshot of the current key. Rotation replaces
//! the `Arc` in one step; a registration already holding the old snapshot
//! finishes with the old key, and every later registration sees the new one.

use std::sync::{Arc, PoisonError, RwLock};

use ota_attest_core::{PublicKey, SigningKey};

/// Holds the active signing key.
pub struct KeyHolder {
    current: RwLock<Arc<SigningKey>>,
}

impl KeyHolder {
    pub fn new(key: SigningKey) -> Self {
        Self {
            current: RwLock::new(Arc::new(key)),
        }
    }

    /// Snapshot of the active key.
    pub fn current(&self) -> Arc<SigningKey> {
        // The guarded value is a single Arc, so a poisoned lock still holds
        // a complete key.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Public half of the active key.
    pub fn public_key(&self) -> PublicKey {
        self.current().public_key().clone()
    }

    /// Swap in a new key, returning the previous one.
    pub fn replace(&self, key: SigningKey) -> Arc<SigningKey> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(key))
    }
}

impl std::fmt::Debug for KeyHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyHolder({:?})", self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_attest_testkit::keys;

    #[test]
    fn test_replace_swaps_key() {
        let holder = KeyHolder::new(keys::primary());
        let before = holder.current();

        let old = holder.replace(keys::unrelated());
        assert_eq!(old.public_key(), before.public_key());
        assert_eq!(&holder.public_key(), keys::unrelated().public_key());
        assert_ne!(holder.public_key(), *before.public_key());
    }

    #[test]
    fn test_snapshot_survives_rotation() {
        let holder = KeyHolder::new(keys::primary());
        let snapshot = holder.current();
        holder.replace(keys::unrelated());

        let sig = snapshot.sign(b"msg").unwrap();
        assert!(keys::primary().public_key().verify(b"msg", &sig));
    }
}
