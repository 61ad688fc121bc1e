//! User-supplied event handlers and the registry the dispatch task reads them
//! from.

use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::trace;

use crate::error::ArgError;
use crate::scan::ScanResultList;

/// Result reported to connection and scan handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

pub type StationConnectedHandler = Arc<dyn Fn(Outcome) + Send + Sync>;
pub type LinkEventHandler = Arc<dyn Fn() + Send + Sync>;
/// Receives the reassembled list by reference; it is released as soon as the
/// handler returns, so copy anything that must outlive the call.
pub type ScanDoneHandler = Arc<dyn Fn(Outcome, Option<&ScanResultList>) + Send + Sync>;

/// Five optional handler slots. Handlers run on the dispatch task and should
/// return quickly.
#[derive(Clone, Default)]
pub struct CallbackTable {
    pub station_connected: Option<StationConnectedHandler>,
    pub station_disconnected: Option<LinkEventHandler>,
    pub soft_ap_station_joined: Option<LinkEventHandler>,
    pub soft_ap_station_left: Option<LinkEventHandler>,
    pub scan_done: Option<ScanDoneHandler>,
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTable")
            .field("station_connected", &self.station_connected.is_some())
            .field("station_disconnected", &self.station_disconnected.is_some())
            .field("soft_ap_station_joined", &self.soft_ap_station_joined.is_some())
            .field("soft_ap_station_left", &self.soft_ap_station_left.is_some())
            .field("scan_done", &self.scan_done.is_some())
            .finish()
    }
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_station_connected(
        mut self,
        handler: impl Fn(Outcome) + Send + Sync + 'static,
    ) -> Self {
        self.station_connected = Some(Arc::new(handler));
        self
    }

    pub fn on_station_disconnected(
        mut self,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.station_disconnected = Some(Arc::new(handler));
        self
    }

    pub fn on_soft_ap_station_joined(
        mut self,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.soft_ap_station_joined = Some(Arc::new(handler));
        self
    }

    pub fn on_soft_ap_station_left(
        mut self,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.soft_ap_station_left = Some(Arc::new(handler));
        self
    }

    pub fn on_scan_done(
        mut self,
        handler: impl Fn(Outcome, Option<&ScanResultList>) + Send + Sync + 'static,
    ) -> Self {
        self.scan_done = Some(Arc::new(handler));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.station_connected.is_none()
            && self.station_disconnected.is_none()
            && self.soft_ap_station_joined.is_none()
            && self.soft_ap_station_left.is_none()
            && self.scan_done.is_none()
    }
}

/// Something the dispatch task wants a handler to hear about.
#[derive(Debug, Clone, Copy)]
pub enum Notification<'a> {
    StationConnected(Outcome),
    StationDisconnected,
    SoftApStationJoined,
    SoftApStationLeft,
    ScanDone {
        outcome: Outcome,
        results: Option<&'a ScanResultList>,
    },
}

impl Notification<'_> {
    fn slot(&self) -> &'static str {
        match self {
            Notification::StationConnected(_) => "station_connected",
            Notification::StationDisconnected => "station_disconnected",
            Notification::SoftApStationJoined => "soft_ap_station_joined",
            Notification::SoftApStationLeft => "soft_ap_station_left",
            Notification::ScanDone { .. } => "scan_done",
        }
    }
}

/// Shared, synchronized holder of the active [`CallbackTable`].
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    table: Arc<RwLock<CallbackTable>>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("table", &self.snapshot())
            .finish()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole table. Last writer wins.
    pub fn register(
        &self,
        table: impl Into<Option<CallbackTable>>,
    ) -> Result<(), ArgError> {
        let table = table.into().ok_or(ArgError::MissingCallbacks)?;
        *self
            .table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = table;
        Ok(())
    }

    pub fn clear(&self) {
        *self
            .table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = CallbackTable::default();
    }

    pub fn snapshot(&self) -> CallbackTable {
        self.table
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Invokes the matching handler, if any. The lock is released before the
    /// handler runs. Returns whether a handler was present.
    pub fn notify(&self, notification: Notification<'_>) -> bool {
        let table = self.snapshot();
        let delivered = match notification {
            Notification::StationConnected(outcome) => {
                table.station_connected.map(|handler| handler(outcome))
            }
            Notification::StationDisconnected => {
                table.station_disconnected.map(|handler| handler())
            }
            Notification::SoftApStationJoined => {
                table.soft_ap_station_joined.map(|handler| handler())
            }
            Notification::SoftApStationLeft => {
                table.soft_ap_station_left.map(|handler| handler())
            }
            Notification::ScanDone { outcome, results } => {
                table.scan_done.map(|handler| handler(outcome, results))
            }
        }
        .is_some();

        if !delivered {
            trace!(target: "airlink::callbacks", slot = notification.slot(), "no handler registered, dropping event");
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn register_rejects_absent_table() {
        let registry = CallbackRegistry::new();
        assert_eq!(registry.register(None::<CallbackTable>), Err(ArgError::MissingCallbacks));
    }

    #[test]
    fn empty_slot_drops_silently() {
        let registry = CallbackRegistry::new();
        assert!(!registry.notify(Notification::StationDisconnected));
    }

    #[test]
    fn last_registration_wins() {
        let registry = CallbackRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = first.clone();
        registry
            .register(CallbackTable::new().on_station_disconnected(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        let counter = second.clone();
        registry
            .register(CallbackTable::new().on_station_disconnected(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(registry.notify(Notification::StationDisconnected));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_empties_every_slot() {
        let registry = CallbackRegistry::new();
        registry
            .register(
                CallbackTable::new()
                    .on_station_connected(|_| {})
                    .on_scan_done(|_, _| {}),
            )
            .unwrap();
        assert!(!registry.snapshot().is_empty());

        registry.clear();
        assert!(registry.snapshot().is_empty());
        assert!(!registry.notify(Notification::StationConnected(Outcome::Success)));
    }

    #[test]
    fn handler_may_reregister_without_deadlock() {
        let registry = CallbackRegistry::new();
        let inner = registry.clone();
        registry
            .register(CallbackTable::new().on_soft_ap_station_left(move || {
                inner.clear();
            }))
            .unwrap();

        assert!(registry.notify(Notification::SoftApStationLeft));
        assert!(registry.snapshot().is_empty());
    }
}
