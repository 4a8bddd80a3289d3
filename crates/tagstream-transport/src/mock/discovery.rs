//! Mock advertisement source for discovery testing.

use crate::events::Advertisement;
use tagstream_core::{DeviceUri, Error, Result};
use tokio::sync::mpsc;

/// Mock discovery backend.
///
/// Produces the advertisement feed a
/// `DiscoveryRegistry` consumes, driven programmatically through a
/// [`MockDiscoveryHandle`].
///
/// # Examples
///
/// ```
/// use tagstream_transport::mock::MockDiscovery;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tagstream_core::Result<()> {
/// let (handle, mut advertisements) = MockDiscovery::channel();
///
/// handle.appear("mdns://reader-01.local".parse()?).await?;
///
/// let ad = advertisements.recv().await.unwrap();
/// assert!(ad.visible);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockDiscovery;

impl MockDiscovery {
    /// Create an advertisement channel and its controlling handle.
    pub fn channel() -> (MockDiscoveryHandle, mpsc::Receiver<Advertisement>) {
        let (tx, rx) = mpsc::channel(32);
        (MockDiscoveryHandle { tx }, rx)
    }
}

/// Handle emitting advertisements into a mock discovery feed.
#[derive(Debug, Clone)]
pub struct MockDiscoveryHandle {
    tx: mpsc::Sender<Advertisement>,
}

impl MockDiscoveryHandle {
    async fn send(&self, advertisement: Advertisement) -> Result<()> {
        self.tx
            .send(advertisement)
            .await
            .map_err(|_| Error::transport("advertisement channel closed"))
    }

    /// Advertise a device as present.
    pub async fn appear(&self, uri: DeviceUri) -> Result<()> {
        self.send(Advertisement { uri, visible: true }).await
    }

    /// Advertise a device as gone.
    pub async fn disappear(&self, uri: DeviceUri) -> Result<()> {
        self.send(Advertisement {
            uri,
            visible: false,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appear_disappear_sequence() {
        let (handle, mut rx) = MockDiscovery::channel();

        let uri: DeviceUri = "tcp://192.168.1.7".parse().unwrap();
        handle.appear(uri.clone()).await.unwrap();
        handle.disappear(uri.clone()).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.uri, uri);
        assert!(first.visible);

        let second = rx.recv().await.unwrap();
        assert!(!second.visible);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (handle, rx) = MockDiscovery::channel();
        drop(rx);

        let uri: DeviceUri = "tcp://192.168.1.7".parse().unwrap();
        let result = handle.appear(uri).await;
        assert!(matches!(result, Err(Error::TransportFailure { .. })));
    }
}
