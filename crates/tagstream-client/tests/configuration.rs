//! Integration tests for the GPIO, antenna, and settings surfaces.

use std::time::Duration;
use tagstream_client::{ReaderSession, SessionConfig};
use tagstream_core::Error;
use tagstream_transport::command::{Command, CommandKind};
use tagstream_transport::mock::{MockTransport, MockTransportHandle};
use tagstream_transport::types::{
    AntennaMapping, GpioKind, InventoryReadConfig, IrMode, MemoryBank, SetupPatch,
};

async fn connected_session() -> (
    ReaderSession<MockTransport>,
    MockTransportHandle,
) {
    let (transport, handle, events) = MockTransport::new();
    let config = SessionConfig {
        connect_timeout: Duration::from_millis(500),
        ..SessionConfig::default()
    };
    let session = ReaderSession::new(transport, events, config);

    let target = "ser://com6".parse().unwrap();
    let connect = session.connect(&target);
    let confirm = async {
        handle.complete_connect().await.unwrap();
    };
    let (result, ()) = tokio::join!(connect, confirm);
    result.unwrap();

    (session, handle)
}

#[tokio::test]
async fn test_reader_info() {
    let (session, _handle) = connected_session().await;

    let info = session.reader_info().await.unwrap();
    assert_eq!(info.name, "Mock Reader");
    assert_eq!(info.gpio_count, 8);
    assert_eq!(info.max_antennas, 4);
}

#[tokio::test]
async fn test_gpio_list_and_led_walk() {
    let (session, handle) = connected_session().await;

    let config = session.gpio_config().await.unwrap();
    assert_eq!(config.len(), 8);
    assert_eq!(config[0].kind, GpioKind::Input);
    assert_eq!(config[4].kind, GpioKind::Output);

    // Walk the output pins one by one, then all at once via the mask
    for index in 4..8 {
        session.set_gpio_status(index, true).await.unwrap();
        assert!(session.gpio_status(index).await.unwrap().state);
    }
    session.set_gpio_status_mask(0xF0, false).await.unwrap();
    for index in 4..8 {
        assert!(!session.gpio_status(index).await.unwrap().state);
    }

    assert_eq!(handle.command_count(CommandKind::SetGpioStatus), 4);
    assert_eq!(handle.command_count(CommandKind::SetGpioStatusMask), 1);
}

#[tokio::test]
async fn test_antenna_enable_disable_round_trip() {
    let (session, handle) = connected_session().await;
    handle.set_antennas(
        (0u8..16)
            .map(|id| AntennaMapping::new(id, format!("AUX{}", id + 1)))
            .collect(),
        0xFFFF,
    );

    let list = session.antenna_list().await.unwrap();
    assert_eq!(list.len(), 16);

    assert!(session.is_antenna_enabled("AUX1,AUX16").await.unwrap());
    assert_eq!(session.antenna_mask("AUX7,AUX8").await.unwrap(), 0x00C0);

    session.set_antennas_enabled("AUX16", false).await.unwrap();
    let enabled = session.enabled_antennas().await.unwrap();
    assert_eq!(enabled.len(), 15);
    assert!(!enabled.contains(&"AUX16".to_string()));
    assert!(!session.is_antenna_enabled("AUX1,AUX16").await.unwrap());

    session
        .set_antennas_enabled("AUX1,AUX16", true)
        .await
        .unwrap();
    assert!(session.is_antenna_enabled("AUX1,AUX16").await.unwrap());
}

#[tokio::test]
async fn test_unknown_antenna_rejected_without_command() {
    let (session, handle) = connected_session().await;

    let before = handle.command_count(CommandKind::SetAntennaMask);
    let result = session.set_antennas_enabled("AUX1,NOPE", true).await;
    match result {
        Err(Error::UnknownAntenna { name }) => assert_eq!(name, "NOPE"),
        other => panic!("unexpected result: {:?}", other),
    }
    // The rejection happened before any mask write was sent
    assert_eq!(handle.command_count(CommandKind::SetAntennaMask), before);
}

#[tokio::test]
async fn test_module_setup_patch() {
    let (session, _handle) = connected_session().await;

    let setup = session.module_setup().await.unwrap();
    assert_eq!(setup.inventory_q, 0);

    let updated = session
        .apply_setup(SetupPatch {
            inventory_q: Some(6),
            inventory_rounds: Some(2),
            ..SetupPatch::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.inventory_q, 6);
    assert_eq!(updated.inventory_rounds, 2);

    let read_back = session.module_setup().await.unwrap();
    assert_eq!(read_back, updated);
}

#[tokio::test]
async fn test_setup_patch_validation() {
    let (session, handle) = connected_session().await;

    let result = session
        .apply_setup(SetupPatch {
            inventory_q: Some(16),
            ..SetupPatch::default()
        })
        .await;
    assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    assert_eq!(handle.command_count(CommandKind::SetSetup), 0);
}

#[tokio::test]
async fn test_inventory_read_config_round_trip() {
    let (session, handle) = connected_session().await;

    let initial = session.inventory_read().await.unwrap();
    assert!(!initial.active);

    let config = InventoryReadConfig {
        active: true,
        mode: IrMode::EpcData,
        bank: MemoryBank::Tid,
        word_address: 0,
        word_count: 4,
    };
    session.set_inventory_read(config).await.unwrap();

    let read_back = session.inventory_read().await.unwrap();
    assert_eq!(read_back, config);

    assert!(
        handle
            .sent_commands()
            .contains(&Command::SetInventoryRead(config))
    );
}

#[tokio::test]
async fn test_inventory_read_validation() {
    let (session, _handle) = connected_session().await;

    let config = InventoryReadConfig {
        active: true,
        mode: IrMode::EpcData,
        bank: MemoryBank::User,
        word_address: 0,
        word_count: 0,
    };
    let result = session.set_inventory_read(config).await;
    assert!(matches!(result, Err(Error::InvalidParameter { .. })));
}
