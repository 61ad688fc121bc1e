use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::error::IpcError;
use crate::ipc::{ChannelName, EventRecord};

type ChannelMap = HashMap<ChannelName, mpsc::Sender<EventRecord>>;

/// Namespace of named, bounded event channels shared by the bridge and the
/// driver. A channel exists from [`EventHub::create`] until
/// [`EventHub::unlink`]; producers look it up by name.
#[derive(Clone, Default)]
pub struct EventHub {
    channels: Arc<Mutex<ChannelMap>>,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("channels", &self.len())
            .finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChannelMap> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates a channel and hands back its only receiving end.
    pub fn create(
        &self,
        name: &ChannelName,
        capacity: usize,
    ) -> Result<EventReceiver, IpcError> {
        let mut channels = self.lock();
        if channels.contains_key(name) {
            return Err(IpcError::ChannelExists(name.clone()));
        }
        let (tx, rx) = mpsc::channel(capacity.max(1));
        channels.insert(name.clone(), tx);
        Ok(EventReceiver {
            name: name.clone(),
            rx,
        })
    }

    pub fn open(&self, name: &ChannelName) -> Result<EventSender, IpcError> {
        self.lock()
            .get(name)
            .map(|tx| EventSender {
                name: name.clone(),
                tx: tx.clone(),
            })
            .ok_or_else(|| IpcError::ChannelNotFound(name.clone()))
    }

    /// Removes the name. Senders already opened keep working until the
    /// receiver goes away. Returns whether the name was linked.
    pub fn unlink(&self, name: &ChannelName) -> bool {
        self.lock().remove(name).is_some()
    }

    pub fn is_linked(&self, name: &ChannelName) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct EventSender {
    name: ChannelName,
    tx: mpsc::Sender<EventRecord>,
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("name", &self.name)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl EventSender {
    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    pub async fn send(&self, record: EventRecord) -> Result<(), IpcError> {
        self.tx
            .send(record)
            .await
            .map_err(|_| IpcError::Closed(self.name.clone()))
    }

    pub async fn send_timeout(
        &self,
        record: EventRecord,
        timeout: Duration,
    ) -> Result<(), IpcError> {
        self.tx
            .send_timeout(record, timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => IpcError::SendTimeout {
                    channel: self.name.clone(),
                    waited: timeout,
                },
                SendTimeoutError::Closed(_) => IpcError::Closed(self.name.clone()),
            })
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    name: ChannelName,
    rx: mpsc::Receiver<EventRecord>,
}

impl EventReceiver {
    pub fn name(&self) -> &ChannelName {
        &self.name
    }

    /// Waits for the next record; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<EventRecord> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::EventTag;

    #[tokio::test]
    async fn create_open_unlink_roundtrip() {
        let hub = EventHub::new();
        let name = ChannelName::generate();

        let mut rx = hub.create(&name, 4).expect("create");
        assert!(hub.is_linked(&name));
        assert_eq!(
            hub.create(&name, 4).unwrap_err(),
            IpcError::ChannelExists(name.clone())
        );

        let tx = hub.open(&name).expect("open");
        tx.send(EventRecord::new(EventTag::StationDisconnected))
            .await
            .expect("send");
        let record = rx.recv().await.expect("record");
        assert_eq!(record.tag, EventTag::StationDisconnected as u32);

        assert!(hub.unlink(&name));
        assert!(!hub.unlink(&name));
        assert_eq!(
            hub.open(&name).unwrap_err(),
            IpcError::ChannelNotFound(name.clone())
        );
    }

    #[tokio::test]
    async fn records_arrive_in_send_order() {
        let hub = EventHub::new();
        let name = ChannelName::generate();
        let mut rx = hub.create(&name, 8).expect("create");
        let tx = hub.open(&name).expect("open");

        for tag in [
            EventTag::StationConnected,
            EventTag::StationDisconnected,
            EventTag::SoftApStationJoined,
        ] {
            tx.send(EventRecord::new(tag)).await.expect("send");
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(rx.recv().await.expect("record").tag);
        }
        assert_eq!(seen, vec![1, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn full_channel_times_out() {
        let hub = EventHub::new();
        let name = ChannelName::generate();
        let _rx = hub.create(&name, 1).expect("create");
        let tx = hub.open(&name).expect("open");

        tx.send(EventRecord::terminate()).await.expect("first fits");
        let err = tx
            .send_timeout(EventRecord::terminate(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, IpcError::SendTimeout { .. }));
    }

    #[tokio::test]
    async fn dropped_receiver_closes_channel() {
        let hub = EventHub::new();
        let name = ChannelName::generate();
        let rx = hub.create(&name, 1).expect("create");
        let tx = hub.open(&name).expect("open");
        drop(rx);

        assert_eq!(
            tx.send(EventRecord::terminate()).await.unwrap_err(),
            IpcError::Closed(name)
        );
    }
}
