//! Channel manager lifecycle tests against the in-memory transport.

use std::sync::Arc;

use tokio::sync::mpsc;

use atelier_core::config::channel::ChannelConfig;
use atelier_core::error::ErrorKind;
use atelier_core::events::ChannelStatus;
use atelier_core::traits::{EventSink, RealtimeTransport};
use atelier_core::types::credential::ChannelCredential;
use atelier_core::types::id::{TenantId, UserId};
use atelier_sync::{ChannelManager, ChannelState, MemoryTransport};

const SECRET: &[u8] = b"channel-test-secret";

fn sink() -> EventSink {
    let (event_tx, _event_rx) = mpsc::channel(16);
    let (status_tx, _status_rx) = mpsc::channel(16);
    EventSink::new(event_tx, status_tx)
}

fn manager(
    transport: Arc<MemoryTransport>,
    config: ChannelConfig,
    tenant: TenantId,
    user: UserId,
) -> ChannelManager {
    ChannelManager::new(transport as Arc<dyn RealtimeTransport>, config, tenant, user)
}

#[tokio::test]
async fn test_full_handshake_reaches_subscribed() {
    let tenant = TenantId::new();
    let user = UserId::new();
    let transport = Arc::new(MemoryTransport::new());
    let manager = manager(Arc::clone(&transport), ChannelConfig::default(), tenant, user);
    let credential = ChannelCredential::issue(SECRET, tenant, user, 60).expect("issue");

    assert_eq!(manager.state(), ChannelState::Idle);
    assert!(manager.connect(&credential, sink()).await.expect("connect"));
    assert_eq!(manager.state(), ChannelState::Subscribed);
    assert_eq!(transport.subscriber_count(&manager.channel_name()), 1);

    // Connecting again while subscribed is a no-op that reports the sink
    // was not installed.
    assert!(!manager.connect(&credential, sink()).await.expect("no-op"));
    assert_eq!(transport.subscriber_count(&manager.channel_name()), 1);
}

#[tokio::test]
async fn test_expired_credential_rejected_before_transport() {
    let tenant = TenantId::new();
    let user = UserId::new();
    let transport = Arc::new(MemoryTransport::new());
    let manager = manager(Arc::clone(&transport), ChannelConfig::default(), tenant, user);

    let stale = ChannelCredential::issue(SECRET, tenant, user, -10).expect("issue");
    let err = manager.connect(&stale, sink()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(manager.state(), ChannelState::Error);
    // The handshake never reached the transport.
    assert_eq!(transport.subscriber_count(&manager.channel_name()), 0);
}

#[tokio::test]
async fn test_retry_gated_by_backoff_window() {
    let tenant = TenantId::new();
    let user = UserId::new();
    let transport = Arc::new(MemoryTransport::new());
    transport.set_fail_subscribe(true);
    let manager = manager(Arc::clone(&transport), ChannelConfig::default(), tenant, user);
    let credential = ChannelCredential::issue(SECRET, tenant, user, 60).expect("issue");

    assert!(manager.connect(&credential, sink()).await.is_err());
    assert_eq!(manager.state(), ChannelState::Error);

    // Default backoff starts at two seconds; an immediate retry is refused
    // without touching the transport.
    let err = manager.connect(&credential, sink()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Channel);
}

#[tokio::test]
async fn test_retry_succeeds_once_due() {
    let tenant = TenantId::new();
    let user = UserId::new();
    let transport = Arc::new(MemoryTransport::new());
    transport.set_fail_authenticate(true);

    // Zero backoff base makes every retry immediately due.
    let config = ChannelConfig {
        retry_backoff_base_ms: 0,
        ..ChannelConfig::default()
    };
    let manager = manager(Arc::clone(&transport), config, tenant, user);
    let credential = ChannelCredential::issue(SECRET, tenant, user, 60).expect("issue");

    assert!(manager.connect(&credential, sink()).await.is_err());
    assert_eq!(manager.state(), ChannelState::Error);

    transport.set_fail_authenticate(false);
    assert!(manager.connect(&credential, sink()).await.expect("retry"));
    assert_eq!(manager.state(), ChannelState::Subscribed);
}

#[tokio::test]
async fn test_rejected_status_marks_error() {
    let tenant = TenantId::new();
    let user = UserId::new();
    let transport = Arc::new(MemoryTransport::new());
    let manager = manager(Arc::clone(&transport), ChannelConfig::default(), tenant, user);
    let credential = ChannelCredential::issue(SECRET, tenant, user, 60).expect("issue");
    manager.connect(&credential, sink()).await.expect("connect");

    manager.on_status(ChannelStatus::Rejected {
        channel: manager.channel_name(),
        reason: "token revoked".into(),
    });
    assert_eq!(manager.state(), ChannelState::Error);
}

#[tokio::test]
async fn test_close_is_terminal() {
    let tenant = TenantId::new();
    let user = UserId::new();
    let transport = Arc::new(MemoryTransport::new());
    let manager = manager(Arc::clone(&transport), ChannelConfig::default(), tenant, user);
    let credential = ChannelCredential::issue(SECRET, tenant, user, 60).expect("issue");
    manager.connect(&credential, sink()).await.expect("connect");

    manager.close().await;
    assert_eq!(manager.state(), ChannelState::Closed);
    assert_eq!(transport.subscriber_count(&manager.channel_name()), 0);

    let err = manager.connect(&credential, sink()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Channel);

    // Closing again is harmless.
    manager.close().await;
    assert_eq!(manager.state(), ChannelState::Closed);
}
