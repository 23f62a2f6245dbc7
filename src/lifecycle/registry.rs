//! Process-wide service registry keyed by type
//!
//! One service instance per type. `get_or_init` lets exactly one caller run
//! the constructor; callers that arrive while it runs block until the
//! instance is published instead of building a duplicate.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, error, warn};

type Service = Arc<dyn Any + Send + Sync>;

enum Slot {
    /// A constructor is running on some thread
    Creating,
    Ready(Service),
}

#[derive(Default)]
struct Inner {
    services: HashMap<TypeId, Slot>,
    quitting: bool,
}

/// Type-keyed registry of shared services
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
    ready: Condvar,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a service without creating it
    pub fn try_get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let inner = self.lock();
        if inner.quitting {
            return None;
        }
        match inner.services.get(&TypeId::of::<T>()) {
            Some(Slot::Ready(service)) => service.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Look up a service, building it with `init` if nobody has yet.
    ///
    /// Returns `None` once the registry is shutting down.
    pub fn get_or_init<T, F>(&self, init: F) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let key = TypeId::of::<T>();
        let mut inner = self.lock();

        loop {
            if inner.quitting {
                error!(
                    service = std::any::type_name::<T>(),
                    "registry already shut down, not creating service"
                );
                return None;
            }
            let creating = match inner.services.get(&key) {
                Some(Slot::Ready(service)) => return service.clone().downcast::<T>().ok(),
                Some(Slot::Creating) => true,
                None => false,
            };
            if !creating {
                break;
            }
            inner = self.ready.wait(inner).unwrap_or_else(PoisonError::into_inner);
        }

        inner.services.insert(key, Slot::Creating);
        drop(inner);

        // Clears the placeholder if `init` unwinds so waiters don't hang.
        let pending = PendingSlot { registry: self, key };
        let service = Arc::new(init());
        std::mem::forget(pending);

        let mut inner = self.lock();
        if inner.quitting {
            inner.services.remove(&key);
            self.ready.notify_all();
            return None;
        }
        inner.services.insert(key, Slot::Ready(service.clone()));
        self.ready.notify_all();
        debug!(service = std::any::type_name::<T>(), "service created");
        Some(service)
    }

    /// Stop handing out services. Further lookups return `None`.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        if !inner.quitting {
            warn!(services = inner.services.len(), "registry shutting down");
        }
        inner.quitting = true;
        inner.services.clear();
        self.ready.notify_all();
    }
}

struct PendingSlot<'a> {
    registry: &'a Registry,
    key: TypeId,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        let mut inner = self.registry.lock();
        if matches!(inner.services.get(&self.key), Some(Slot::Creating)) {
            inner.services.remove(&self.key);
        }
        self.registry.ready.notify_all();
    }
}
