//! # Core Module
//!
//! Small locking primitives shared by the chunk pipeline.
//!
//! Chunks are read by the main thread and the loader thread at the same time. A
//! panic on one thread must not take the other down with a poisoned lock, so
//! every guard handed out here recovers the inner value instead of propagating
//! the poison.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a read guard, recovering from poisoning.
pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Acquires a write guard, recovering from poisoning.
pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Locks a mutex, recovering from poisoning.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn poisoned_lock_still_hands_out_the_value() {
        let shared = Arc::new(RwLock::new(5));
        let clone = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let _guard = clone.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(shared.is_poisoned());
        assert_eq!(*read(&shared), 5);
        *write(&shared) += 1;
        assert_eq!(*read(&shared), 6);
    }
}
