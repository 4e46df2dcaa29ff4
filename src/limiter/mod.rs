//! Two-level concurrency gate
//!
//! This module bounds how many network operations run at once:
//! - a global ceiling across all hosts
//! - an independent per-host ceiling, so one slow or sensitive origin never
//!   absorbs the whole budget and no origin sees burst load
//!
//! Hosts are discovered at runtime (they are only known once redirects have
//! resolved), so per-host semaphores are created lazily and kept for the
//! lifetime of the run. Permits are RAII guards: dropping a permit releases
//! its slots on every exit path, including task cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Error returned by acquire calls after the limiter has been closed
#[derive(Debug, Error)]
#[error("limiter is closed")]
pub struct LimiterClosed;

/// Permit for an operation counted only against the global ceiling
///
/// Dropping the permit releases the slot.
#[derive(Debug)]
pub struct GlobalPermit {
    _global: OwnedSemaphorePermit,
}

/// Permit for an operation counted against both ceilings
///
/// Holds one global slot and one slot for the operation's host. Dropping the
/// permit releases both.
#[derive(Debug)]
pub struct HostPermit {
    _global: OwnedSemaphorePermit,
    _host: OwnedSemaphorePermit,
}

/// Concurrency gate with a global ceiling and lazily-created per-host ceilings
pub struct HostLimiter {
    /// Global semaphore bounding total in-flight operations
    global: Arc<Semaphore>,

    /// Slot count for each per-host semaphore
    per_host_max: usize,

    /// Per-host semaphores, created on first acquire for a host and never
    /// removed during the run. The lock is never held across an await.
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,

    /// Set once by close(); newly-created host semaphores start closed
    closed: AtomicBool,
}

impl HostLimiter {
    /// Creates a limiter with the given ceilings
    ///
    /// # Arguments
    ///
    /// * `global_max` - Maximum in-flight operations across all hosts
    /// * `per_host_max` - Maximum in-flight operations per host
    pub fn new(global_max: usize, per_host_max: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_max)),
            per_host_max,
            hosts: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Acquires a slot against the global ceiling only
    ///
    /// Suspends the calling task until a slot is free. Returns
    /// `Err(LimiterClosed)` if the limiter was closed before or while
    /// waiting.
    pub async fn acquire_global(&self) -> Result<GlobalPermit, LimiterClosed> {
        let global = self
            .global
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LimiterClosed)?;
        Ok(GlobalPermit { _global: global })
    }

    /// Acquires a slot against both the global and the host ceiling
    ///
    /// Acquisition order is fixed: global first, then host. Every caller
    /// uses the same order, so tasks contending for different hosts cannot
    /// deadlock. If the host acquisition fails the already-held global slot
    /// is released on the error path.
    pub async fn acquire(&self, host: &str) -> Result<HostPermit, LimiterClosed> {
        let global = self
            .global
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LimiterClosed)?;

        let host_sem = self.host_semaphore(host);
        let host = host_sem.acquire_owned().await.map_err(|_| LimiterClosed)?;

        Ok(HostPermit {
            _global: global,
            _host: host,
        })
    }

    /// Stops admitting new acquisitions
    ///
    /// Pending and future acquire calls fail with `LimiterClosed`; permits
    /// already handed out drain normally. This is the single cancellation
    /// signal for a pipeline run.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.global.close();

        let hosts = self.hosts.lock().unwrap();
        for sem in hosts.values() {
            sem.close();
        }
    }

    /// Returns true if close() has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the number of hosts seen so far
    pub fn known_hosts(&self) -> usize {
        self.hosts.lock().unwrap().len()
    }

    /// Gets or creates the semaphore for a host
    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap();
        let sem = hosts.entry(host.to_string()).or_insert_with(|| {
            let sem = Arc::new(Semaphore::new(self.per_host_max));
            // A close() racing with first contact for this host must still
            // win: the new semaphore starts closed.
            if self.closed.load(Ordering::SeqCst) {
                sem.close();
            }
            sem
        });
        Arc::clone(sem)
    }
}
