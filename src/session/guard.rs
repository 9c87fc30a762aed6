use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::store::SessionStore;
use crate::error::{Result, SessionError};

/// Single-flight flag for one kind of operation
///
/// The equivalent of disabling a button while its request is pending: a
/// second `acquire` fails with [`SessionError::Busy`] until the first
/// [`InFlight`] is dropped.
#[derive(Debug, Clone)]
pub struct Trigger {
    name: &'static str,
    busy: Arc<AtomicBool>,
}

/// Held while the operation runs; releases the trigger on drop
#[derive(Debug)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl Trigger {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn acquire(&self) -> Result<InFlight> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SessionError::Busy(self.name))?;

        Ok(InFlight {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Undoes a store transition if the future that made it is dropped
///
/// Armed right after the transition; [`disarm`](Self::disarm) once the
/// operation has written its own outcome.
pub struct StoreRollback {
    store: Arc<RwLock<SessionStore>>,
    undo: Option<fn(&mut SessionStore)>,
}

impl StoreRollback {
    pub fn new(store: &Arc<RwLock<SessionStore>>, undo: fn(&mut SessionStore)) -> Self {
        Self {
            store: Arc::clone(store),
            undo: Some(undo),
        }
    }

    pub fn disarm(mut self) {
        self.undo = None;
    }
}

impl Drop for StoreRollback {
    fn drop(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };

        warn!("Session operation cancelled; rolling back");

        if let Ok(mut store) = self.store.try_write() {
            undo(&mut store);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    undo(&mut *store.write().await);
                });
            }
            Err(_) => warn!("No runtime available; session store not rolled back"),
        }
    }
}
