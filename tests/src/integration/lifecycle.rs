//! # Lifecycle Integration Tests
//!
//! Session and monitor lifecycles exercised across components: provider
//! notifications flowing through [`WalletSession`] to watchers, and the
//! content-store [`LivenessMonitor`] being started, observed, and torn
//! down the way a mounting and unmounting view would drive it.

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::watch;
    use tokio::time::timeout;

    use denews_client::{
        Address, ClientError, LivenessMonitor, MockGateway, MockWallet, Session, WalletEvent,
        WalletSession,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn addr(suffix: &str) -> Address {
        format!("0x{:0>40}", suffix).parse().unwrap()
    }

    /// Wait for the next session change and return the new snapshot.
    async fn settled(rx: &mut watch::Receiver<Session>) -> Session {
        timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("no session change arrived")
            .expect("session channel closed");
        rx.borrow().clone()
    }

    // =========================================================================
    // SESSION: PROVIDER NOTIFICATIONS TO WATCHERS
    // =========================================================================

    /// A full session lifetime as the provider reports it: connect,
    /// account switch, chain switch, disconnect. Every transition reaches
    /// watchers and the queryable session state agrees.
    #[tokio::test]
    async fn test_session_tracks_provider_notifications_end_to_end() {
        let wallet = Arc::new(MockWallet::with_account(addr("a1")));
        let session = WalletSession::new(Arc::clone(&wallet));
        let mut changes = session.subscribe_changes();

        session.connect().await.unwrap();
        let connected = settled(&mut changes).await;
        assert_eq!(connected.active_identity, Some(addr("a1")));
        assert_eq!(connected.network_id.as_deref(), Some("0x539"));

        wallet.emit(WalletEvent::AccountsChanged(vec![addr("b2")]));
        let switched = settled(&mut changes).await;
        assert_eq!(switched.active_identity, Some(addr("b2")));
        // Network id is untouched by an account switch.
        assert_eq!(switched.network_id.as_deref(), Some("0x539"));

        wallet.emit(WalletEvent::ChainChanged("0x1".to_string()));
        let rechained = settled(&mut changes).await;
        assert_eq!(rechained.network_id.as_deref(), Some("0x1"));
        assert_eq!(rechained.active_identity, Some(addr("b2")));

        wallet.emit(WalletEvent::Disconnected);
        let cleared = settled(&mut changes).await;
        assert_eq!(cleared, Session::empty());
        assert!(!session.current_session().is_connected());
    }

    /// After a disconnect, a fresh `connect` prompts again and brings the
    /// session back without re-registering a second listener.
    #[tokio::test]
    async fn test_reconnect_after_disconnect() {
        let wallet = Arc::new(MockWallet::with_account(addr("a1")));
        let session = WalletSession::new(Arc::clone(&wallet));
        session.connect().await.unwrap();
        let mut changes = session.subscribe_changes();

        wallet.emit(WalletEvent::Disconnected);
        assert_eq!(settled(&mut changes).await, Session::empty());

        wallet.emit(WalletEvent::AccountsChanged(vec![addr("a1")]));
        let identity = session.connect().await.unwrap();
        assert_eq!(identity, addr("a1"));
        assert!(session.current_session().is_connected());

        // The single listener still relays later notifications.
        wallet.emit(WalletEvent::AccountsChanged(vec![addr("b2")]));
        loop {
            let snapshot = settled(&mut changes).await;
            if snapshot.active_identity == Some(addr("b2")) {
                break;
            }
        }
    }

    /// A provider whose connect prompt is declined leaves no session and
    /// no listener behind.
    #[tokio::test]
    async fn test_declined_connect_leaves_no_session() {
        let wallet = Arc::new(MockWallet::with_account(addr("a1")));
        wallet.reject_connect.store(true, Ordering::Relaxed);
        let session = WalletSession::new(Arc::clone(&wallet));

        assert!(matches!(
            session.connect().await,
            Err(ClientError::UserRejected(_))
        ));
        assert_eq!(session.current_session(), Session::empty());

        // No listener was registered, so notifications change nothing.
        wallet.emit(WalletEvent::ChainChanged("0x1".to_string()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(session.current_session(), Session::empty());
    }

    /// Dropping the session adapter tears the listener down; watchers see
    /// the channel close instead of hanging forever.
    #[tokio::test]
    async fn test_dropped_session_closes_change_channel() {
        let wallet = Arc::new(MockWallet::with_account(addr("a1")));
        let mut changes = {
            let session = WalletSession::new(Arc::clone(&wallet));
            session.connect().await.unwrap();
            session.subscribe_changes()
        };

        // Drain the connect notification, then expect closure.
        let _ = changes.changed().await;
        let closed = timeout(Duration::from_secs(1), async {
            while changes.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok(), "change channel never closed");
    }

    // =========================================================================
    // LIVENESS MONITOR: MOUNT, OBSERVE, UNMOUNT
    // =========================================================================

    /// The monitor follows the store through an outage and a recovery.
    #[tokio::test]
    async fn test_monitor_follows_outage_and_recovery() {
        let gateway = Arc::new(MockGateway::default());
        let mut monitor = LivenessMonitor::start(Arc::clone(&gateway), Duration::from_millis(10));
        let mut status = monitor.subscribe();

        status.changed().await.unwrap();
        assert!(*status.borrow());

        gateway.alive.store(false, Ordering::Relaxed);
        wait_for_status(&mut status, false).await;

        gateway.alive.store(true, Ordering::Relaxed);
        wait_for_status(&mut status, true).await;

        monitor.stop();
    }

    /// Dropping the monitor releases its grip on the gateway: the poll
    /// task is aborted and its `Arc` clone is freed.
    #[tokio::test]
    async fn test_dropped_monitor_releases_poller() {
        let gateway = Arc::new(MockGateway::default());
        {
            let monitor = LivenessMonitor::start(Arc::clone(&gateway), Duration::from_millis(10));
            assert!(monitor.is_running());
        }

        timeout(Duration::from_secs(1), async {
            while Arc::strong_count(&gateway) > 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("poll task kept running after drop");
    }

    async fn wait_for_status(status: &mut watch::Receiver<bool>, expected: bool) {
        timeout(Duration::from_secs(1), async {
            loop {
                if *status.borrow() == expected {
                    return;
                }
                status.changed().await.unwrap();
            }
        })
        .await
        .expect("status never reached the expected value");
    }
}
