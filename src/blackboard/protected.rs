use crate::fatal;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared/exclusive lease wrapper around a long-lived subsystem accessed from several threads.
///
/// Readers take a [`Lease`] and never observe a mutation in progress; a writer takes an
/// [`ExclusiveLease`] and sees the latest committed state. Every released exclusive lease
/// bumps a modification serial that readers can poll to notice edits without locking.
///
/// # Deadlock
/// Taking an exclusive lease while the same thread already holds any lease on the same
/// object deadlocks. This is a precondition of the API and deliberately not checked.
#[derive(Debug, Default)]
pub struct Protected<T> {
    /// The guarded subsystem.
    inner: RwLock<T>,
    /// Number of exclusive leases released so far.
    serial: AtomicU64,
}

/// Scoped shared access to a [`Protected`] value. Released on drop.
pub struct Lease<'a, T> {
    guard: RwLockReadGuard<'a, T>,
}

/// Scoped exclusive access to a [`Protected`] value. Released on drop.
pub struct ExclusiveLease<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    serial: &'a AtomicU64,
}

impl<T> Protected<T> {
    /// Creates a new `Protected` owning `value`.
    pub fn new(value: T) -> Self { Self { inner: RwLock::new(value), serial: AtomicU64::new(0) } }

    /// Acquires a shared lease, blocking while an exclusive lease is held.
    ///
    /// # Panics
    /// If a previous lease holder panicked and poisoned the lock.
    pub fn lease(&self) -> Lease<'_, T> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(|_| fatal!("Lock poisoned: failed to acquire shared lease"));
        Lease { guard }
    }

    /// Acquires an exclusive lease, blocking all other readers and writers.
    ///
    /// # Panics
    /// If a previous lease holder panicked and poisoned the lock.
    pub fn lease_mut(&self) -> ExclusiveLease<'_, T> {
        let guard = self
            .inner
            .write()
            .unwrap_or_else(|_| fatal!("Lock poisoned: failed to acquire exclusive lease"));
        ExclusiveLease { guard, serial: &self.serial }
    }

    /// Attempts a shared lease without blocking. Used by render paths that rather skip a
    /// frame than wait for the orchestrator.
    pub fn try_lease(&self) -> Option<Lease<'_, T>> {
        self.inner.try_read().ok().map(|guard| Lease { guard })
    }

    /// Runs `f` under a shared lease.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&*self.lease()) }

    /// Runs `f` under an exclusive lease.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R { f(&mut *self.lease_mut()) }

    /// Modification serial; changes whenever an exclusive lease has been released.
    pub fn serial(&self) -> u64 { self.serial.load(Ordering::Acquire) }
}

impl<T: Clone> Protected<T> {
    /// Returns a copy of the current value taken under a shared lease.
    pub fn snapshot(&self) -> T { (*self.lease()).clone() }
}

impl<T> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl<T> Deref for ExclusiveLease<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl<T> DerefMut for ExclusiveLease<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

impl<T> Drop for ExclusiveLease<'_, T> {
    fn drop(&mut self) { self.serial.fetch_add(1, Ordering::AcqRel); }
}
