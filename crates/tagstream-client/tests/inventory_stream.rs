//! Integration tests for inventory operations.
//!
//! These tests cover single blocking inventory, the streaming lifecycle
//! with device-initiated stops and automatic restart, and the tag store's
//! drain semantics end to end.

use std::time::Duration;
use tagstream_client::{
    ConnectionState, ReaderSession, SessionConfig, SessionEvent, StreamState,
};
use tagstream_core::Error;
use tagstream_transport::command::{Command, CommandKind, CommandResponse};
use tagstream_transport::events::TagObservation;
use tagstream_transport::mock::{MockTransport, MockTransportHandle};
use tagstream_transport::types::InventoryParams;

async fn connected_session() -> (
    ReaderSession<MockTransport>,
    MockTransportHandle,
) {
    let (transport, handle, events) = MockTransport::new();
    let config = SessionConfig {
        connect_timeout: Duration::from_millis(500),
        stop_grace: Duration::from_millis(100),
        disconnect_grace: Duration::from_millis(200),
        ..SessionConfig::default()
    };
    let session = ReaderSession::new(transport, events, config);

    let target = "tcp://10.0.0.5".parse().unwrap();
    let connect = session.connect(&target);
    let confirm = async {
        handle.complete_connect().await.unwrap();
    };
    let (result, ()) = tokio::join!(connect, confirm);
    result.unwrap();

    (session, handle)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn obs(epc: &[u8], rssi: i16) -> TagObservation {
    TagObservation::new(epc.to_vec(), rssi)
}

#[tokio::test]
async fn test_single_inventory_fetches_and_ingests() {
    let (session, handle) = connected_session().await;

    handle.script_response(
        CommandKind::FetchTags,
        CommandResponse::Tags(vec![obs(&[0xE2, 0x01], -48), obs(&[0xE2, 0x02], -61)]),
    );

    let snapshot = session
        .run_inventory(InventoryParams::default())
        .await
        .unwrap();
    assert_eq!(snapshot.len(), 2);

    // Inventory round first, then the fetch
    let commands = handle.sent_commands();
    let inventory_pos = commands
        .iter()
        .position(|c| matches!(c, Command::Inventory(_)))
        .unwrap();
    let fetch_pos = commands
        .iter()
        .position(|c| *c == Command::FetchTags)
        .unwrap();
    assert!(inventory_pos < fetch_pos);

    // Best-signal query over the snapshot
    let best = session.tags().best_tag().unwrap();
    assert_eq!(best.epc, vec![0xE2, 0x01]);
}

#[tokio::test]
async fn test_find_nearest_tag() {
    let (session, handle) = connected_session().await;

    handle.script_response(
        CommandKind::FetchTags,
        CommandResponse::Tags(vec![obs(&[0x0A], -70), obs(&[0x0B], -41)]),
    );

    let nearest = session.find_nearest_tag().await.unwrap().unwrap();
    assert_eq!(nearest.epc, vec![0x0B]);

    // The store was cleared before the round
    assert_eq!(handle.command_count(CommandKind::ClearTags), 1);
}

#[tokio::test]
async fn test_run_inventory_busy_while_streaming() {
    let (session, _handle) = connected_session().await;

    session.start_stream().await.unwrap();
    assert_eq!(session.stream_state(), StreamState::Running);

    let result = session.run_inventory(InventoryParams::default()).await;
    assert!(matches!(result, Err(Error::Busy { .. })));

    let result = session.clear_tags().await;
    assert!(matches!(result, Err(Error::Busy { .. })));
}

#[tokio::test]
async fn test_disconnect_releases_blocked_inventory() {
    let (session, handle) = connected_session().await;

    // The round never completes on the device side
    handle.hang_command(CommandKind::Inventory);

    let blocked = async { session.run_inventory(InventoryParams::default()).await };
    let release = async {
        // Give the round a moment to block, then pull the plug
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.disconnect().await;
    };
    let (result, ()) = tokio::join!(blocked, release);

    assert!(matches!(result, Err(Error::Disconnected)));
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_stream_restart_after_device_stop() {
    let (session, handle) = connected_session().await;
    session.start_stream().await.unwrap();

    // A round lands, then the device stops the stream on its own
    handle.emit_tags(vec![obs(&[0xAA], -50)]).await.unwrap();
    handle.notify_stream_stopped().await.unwrap();

    // Exactly one restart command is issued and the stream runs again
    wait_until(|| session.stream_state() == StreamState::Running).await;
    wait_until(|| handle.command_count(CommandKind::StartInventoryStream) == 2).await;

    // The final round before the stop was ingested, not dropped
    assert_eq!(session.tags().len(), 1);

    // No further restarts happen spuriously
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.command_count(CommandKind::StartInventoryStream), 2);
}

#[tokio::test]
async fn test_restart_failure_reported_to_subscribers() {
    let (session, handle) = connected_session().await;
    let mut events = session.subscribe();
    session.start_stream().await.unwrap();

    handle.fail_command(CommandKind::StartInventoryStream, "reader NAK");
    handle.notify_stream_stopped().await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if let SessionEvent::StreamRestartFailed { detail } = events.recv().await.unwrap() {
                return detail;
            }
        }
    })
    .await
    .unwrap();
    assert!(event.contains("reader NAK"));
    assert_eq!(session.stream_state(), StreamState::StoppedByDevice);

    // The controller does not crash: a manual start works again
    session.start_stream().await.unwrap();
    assert_eq!(session.stream_state(), StreamState::Running);
}

#[tokio::test]
async fn test_stop_stream_confirmed_by_device() {
    let (session, handle) = connected_session().await;
    session.start_stream().await.unwrap();

    let stop = async { session.stop_stream().await };
    let confirm = async {
        wait_until(|| session.stream_state() == StreamState::Stopping).await;
        handle.notify_stream_stopped().await.unwrap();
    };
    let (result, ()) = tokio::join!(stop, confirm);
    result.unwrap();

    assert_eq!(session.stream_state(), StreamState::Idle);
    // A caller-initiated stop must not trigger the auto-restart
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.command_count(CommandKind::StartInventoryStream), 1);
}

#[tokio::test]
async fn test_disconnect_forces_stream_idle() {
    let (session, _handle) = connected_session().await;
    session.start_stream().await.unwrap();

    session.disconnect().await;

    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    assert_eq!(session.stream_state(), StreamState::Idle);
}

#[tokio::test]
async fn test_streaming_drain_semantics_end_to_end() {
    let (session, handle) = connected_session().await;
    let mut events = session.subscribe();
    session.start_stream().await.unwrap();

    // Round 1: A appears
    handle.emit_tags(vec![obs(&[0x0A], 10)]).await.unwrap();
    // Round 2: B appears, A re-observed with a new reading
    handle
        .emit_tags(vec![obs(&[0x0B], 20), obs(&[0x0A], 15)])
        .await
        .unwrap();

    // Wait for both rounds to be ingested
    let mut rounds = 0;
    while rounds < 2 {
        if let SessionEvent::TagsUpdated { .. } =
            tokio::time::timeout(Duration::from_secs(1), events.recv())
                .await
                .unwrap()
                .unwrap()
        {
            rounds += 1;
        }
    }

    let store = session.tags();
    let added = store.drain_added();
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].epc, vec![0x0A]);
    assert_eq!(added[0].rssi, 10); // first-sight snapshot
    assert_eq!(added[1].epc, vec![0x0B]);
    assert_eq!(added[1].rssi, 20);

    let updated = store.drain_updated();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].epc, vec![0x0A]);
    assert_eq!(updated[0].rssi, 15);

    // Drains are destructive
    assert!(store.drain_added().is_empty());
    assert!(store.drain_updated().is_empty());

    // The main store still holds both tags with current readings
    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 2);
}

#[tokio::test]
async fn test_tags_updated_event_counts() {
    let (session, handle) = connected_session().await;
    let mut events = session.subscribe();
    session.start_stream().await.unwrap();

    handle.emit_tags(vec![obs(&[0x0A], 10)]).await.unwrap();
    handle
        .emit_tags(vec![obs(&[0x0B], 20), obs(&[0x0A], 15)])
        .await
        .unwrap();

    let mut counts = Vec::new();
    while counts.len() < 2 {
        if let SessionEvent::TagsUpdated { added, updated } =
            tokio::time::timeout(Duration::from_secs(1), events.recv())
                .await
                .unwrap()
                .unwrap()
        {
            counts.push((added, updated));
        }
    }
    assert_eq!(counts, vec![(1, 0), (1, 1)]);
}

#[tokio::test]
async fn test_gpio_edge_fans_out() {
    let (session, handle) = connected_session().await;
    let mut events = session.subscribe();

    handle
        .emit_gpio_edge(2, tagstream_transport::events::EdgeDirection::Rising)
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if let SessionEvent::GpioEdge { source, direction } = events.recv().await.unwrap() {
                return (source, direction);
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(event.0, 2);
    assert_eq!(event.1, tagstream_transport::events::EdgeDirection::Rising);
}
