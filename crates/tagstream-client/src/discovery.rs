//! Device discovery registry.
//!
//! Maintains the set of devices currently visible on the network segment,
//! fed by a stream of appear/disappear advertisements. Real beacons
//! repeat: the registry deliberately performs no duplicate suppression on
//! the subscriber path — every advertisement for a known device still
//! reaches subscribers — while the membership set itself stays
//! deduplicated. De-duplication, where wanted, is each subscriber's
//! responsibility.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tagstream_core::DeviceUri;
use tagstream_transport::events::Advertisement;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A device currently visible via discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Address of the device.
    pub uri: DeviceUri,

    /// Whether the device is currently visible. Always `true` for entries
    /// in the registry; a disappear advertisement removes the entry.
    pub visible: bool,

    /// When the device was first discovered in this registry run.
    pub discovered_at: DateTime<Utc>,
}

/// Visibility change delivered to registry subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEvent {
    /// Address of the device.
    pub uri: DeviceUri,

    /// `true` for an appear advertisement, `false` for disappear.
    pub visible: bool,
}

#[derive(Debug, Default)]
struct RegistryInner {
    devices: HashMap<DeviceUri, DiscoveredDevice>,
    subscribers: Vec<mpsc::UnboundedSender<DiscoveryEvent>>,
}

/// Registry of devices visible on the network segment.
///
/// Entries live only while the registry is running and are discarded on
/// [`stop`](DiscoveryRegistry::stop).
///
/// # Examples
///
/// ```
/// use tagstream_client::DiscoveryRegistry;
/// use tagstream_transport::mock::MockDiscovery;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tagstream_core::Result<()> {
/// let (handle, advertisements) = MockDiscovery::channel();
/// let registry = DiscoveryRegistry::start(advertisements);
/// let mut events = registry.subscribe();
///
/// handle.appear("mdns://reader-01.local".parse()?).await?;
///
/// let event = events.recv().await.unwrap();
/// assert!(event.visible);
/// assert_eq!(registry.device_count(), 1);
///
/// registry.stop();
/// assert_eq!(registry.device_count(), 0);
/// # Ok(())
/// # }
/// ```
pub struct DiscoveryRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscoveryRegistry {
    /// Start listening on an advertisement feed.
    pub fn start(advertisements: mpsc::Receiver<Advertisement>) -> Self {
        let inner = Arc::new(Mutex::new(RegistryInner::default()));
        let task = tokio::spawn(drain_advertisements(advertisements, Arc::clone(&inner)));
        info!("Device discovery started");

        Self {
            inner,
            task: Mutex::new(Some(task)),
        }
    }

    /// Subscribe to visibility changes.
    ///
    /// Note: repeated appear advertisements for an already-visible device
    /// are forwarded without suppression, mirroring the beacons on the
    /// wire. Subscribers needing distinct-device semantics must
    /// de-duplicate themselves.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DiscoveryEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// Snapshot of the currently visible devices.
    pub fn devices(&self) -> Vec<DiscoveredDevice> {
        self.lock().devices.values().cloned().collect()
    }

    /// Number of currently visible devices.
    pub fn device_count(&self) -> usize {
        self.lock().devices.len()
    }

    /// Whether the registry is still draining its advertisement feed.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .expect("discovery task lock poisoned")
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Stop listening and discard all entries.
    ///
    /// Idempotent. Subscribers receive no further events.
    pub fn stop(&self) {
        if let Some(task) = self
            .task
            .lock()
            .expect("discovery task lock poisoned")
            .take()
        {
            task.abort();
            info!("Device discovery stopped");
        }
        let mut inner = self.lock();
        inner.devices.clear();
        inner.subscribers.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().expect("discovery registry lock poisoned")
    }
}

impl Drop for DiscoveryRegistry {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Drain loop: applies each advertisement atomically to the membership
/// set, then forwards it to subscribers.
async fn drain_advertisements(
    mut advertisements: mpsc::Receiver<Advertisement>,
    inner: Arc<Mutex<RegistryInner>>,
) {
    while let Some(advertisement) = advertisements.recv().await {
        let mut inner = inner.lock().expect("discovery registry lock poisoned");

        if advertisement.visible {
            // Idempotent insert: a repeated appear never duplicates the
            // entry or resets its discovery timestamp.
            inner
                .devices
                .entry(advertisement.uri.clone())
                .or_insert_with(|| {
                    debug!(uri = %advertisement.uri, "Device appeared");
                    DiscoveredDevice {
                        uri: advertisement.uri.clone(),
                        visible: true,
                        discovered_at: Utc::now(),
                    }
                });
        } else {
            if inner.devices.remove(&advertisement.uri).is_none() {
                // Disappear for an unknown device: no entry, no callback
                continue;
            }
            debug!(uri = %advertisement.uri, "Device disappeared");
        }

        let event = DiscoveryEvent {
            uri: advertisement.uri,
            visible: advertisement.visible,
        };
        inner
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
    debug!("Advertisement feed closed, discovery drain exiting");
}
