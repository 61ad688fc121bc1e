//! Reassembly of fragmented scan reports into one ordered result list.

use std::slice;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use airlink_model::ApScanInfo;

/// Access points from one completed scan, in the order the driver reported
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResultList {
    entries: Vec<ApScanInfo>,
    truncated: bool,
}

impl ScanResultList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, ApScanInfo> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&ApScanInfo> {
        self.entries.first()
    }

    /// True when the scan hit the fragment cap while the driver still
    /// announced more results.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn ssids(&self) -> Vec<&str> {
        self.entries.iter().map(|ap| ap.ssid.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<ApScanInfo> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a ScanResultList {
    type Item = &'a ApScanInfo;
    type IntoIter = slice::Iter<'a, ApScanInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Whether a scan is currently being reassembled. Shared between the
/// dispatch task (writer) and the public API (reader).
#[derive(Debug, Clone, Default)]
pub struct ScanStatus(Arc<AtomicBool>);

impl ScanStatus {
    pub fn in_progress(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks a scan as requested. Returns false if one is already in flight.
    pub fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.set(false);
    }

    fn set(&self, value: bool) {
        self.0.store(value, Ordering::Release);
    }
}

/// Accumulates scan fragments until the driver reports the last one or the
/// hard cap is reached.
#[derive(Debug)]
pub struct ScanAssembler {
    cap: usize,
    entries: Vec<ApScanInfo>,
    active: bool,
    status: ScanStatus,
}

impl ScanAssembler {
    pub fn new(cap: usize, status: ScanStatus) -> Self {
        Self {
            cap: cap.max(1),
            entries: Vec::new(),
            active: false,
            status,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Starts a new, empty sequence.
    pub fn begin(&mut self) {
        self.entries.clear();
        self.active = true;
        self.status.set(true);
    }

    /// Appends at the tail and returns the new count. Starts a sequence
    /// implicitly if none is active.
    pub fn push(&mut self, access_point: ApScanInfo) -> usize {
        if !self.active {
            self.begin();
        }
        self.entries.push(access_point);
        self.entries.len()
    }

    pub fn is_terminal(&self, more: bool, count: usize) -> bool {
        !more || count >= self.cap
    }

    /// Yields the completed sequence and resets to empty.
    pub fn finish(&mut self, more: bool) -> ScanResultList {
        let entries = std::mem::take(&mut self.entries);
        self.active = false;
        self.status.set(false);
        ScanResultList {
            entries,
            truncated: more,
        }
    }

    /// Drops everything collected so far. Returns whether a sequence was
    /// in progress.
    pub fn discard(&mut self) -> bool {
        let was_active = self.active;
        self.entries.clear();
        self.active = false;
        self.status.set(false);
        was_active
    }
}
