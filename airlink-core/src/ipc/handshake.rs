use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::{BridgeError, Result};

/// Which side of the session lifecycle is waiting on the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    Startup,
    Shutdown,
}

impl fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakePhase::Startup => write!(f, "startup"),
            HandshakePhase::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Counting signal between the dispatch task and its owner.
///
/// Starts with zero permits; every [`Handshake::signal`] adds one and every
/// successful [`Handshake::wait`] consumes one.
#[derive(Clone)]
pub struct Handshake {
    permits: Arc<Semaphore>,
    posted: Arc<AtomicUsize>,
}

impl fmt::Debug for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("pending", &self.permits.available_permits())
            .field("posted", &self.signals_posted())
            .finish()
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(0)),
            posted: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn signal(&self) {
        self.posted.fetch_add(1, Ordering::AcqRel);
        self.permits.add_permits(1);
    }

    /// Blocks until a signal is available or `timeout` elapses.
    pub async fn wait(&self, timeout: Duration, phase: HandshakePhase) -> Result<()> {
        match tokio::time::timeout(timeout, self.permits.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                Ok(())
            }
            // The semaphore is never closed; treat it like a timeout regardless.
            Ok(Err(_)) | Err(_) => Err(BridgeError::HandshakeTimeout {
                phase,
                waited: timeout,
            }),
        }
    }

    /// Total signals posted since creation.
    pub fn signals_posted(&self) -> usize {
        self.posted.load(Ordering::Acquire)
    }

    /// Signals posted but not yet consumed by a waiter.
    pub fn pending(&self) -> usize {
        self.permits.available_permits()
    }

    /// Arms a guard that signals once when dropped.
    pub fn guard(&self) -> HandshakeGuard {
        HandshakeGuard {
            handshake: self.clone(),
        }
    }
}

/// Posts the handshake exactly once when it goes out of scope.
#[derive(Debug)]
pub struct HandshakeGuard {
    handshake: Handshake,
}

impl Drop for HandshakeGuard {
    fn drop(&mut self) {
        self.handshake.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_consumes_one_signal() {
        let handshake = Handshake::new();
        handshake.signal();
        handshake
            .wait(Duration::from_millis(10), HandshakePhase::Startup)
            .await
            .expect("signal available");
        assert_eq!(handshake.pending(), 0);
        assert_eq!(handshake.signals_posted(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_without_signal() {
        let handshake = Handshake::new();
        let err = handshake
            .wait(Duration::from_millis(250), HandshakePhase::Shutdown)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::HandshakeTimeout {
                phase: HandshakePhase::Shutdown,
                waited: Duration::from_millis(250),
            }
        );
    }

    #[tokio::test]
    async fn guard_signals_on_drop() {
        let handshake = Handshake::new();
        {
            let _guard = handshake.guard();
            assert_eq!(handshake.pending(), 0);
        }
        assert_eq!(handshake.pending(), 1);
        assert_eq!(handshake.signals_posted(), 1);
    }
}
