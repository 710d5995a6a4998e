//! # Wallet Session
//!
//! Tracks the active identity and network identifier reported by the
//! wallet provider. The session is client-local and ephemeral: created on
//! connect, mutated only here in response to provider notifications,
//! cleared on disconnect. An account-change with an empty account list is
//! treated as a disconnect; a chain change replaces the network id and
//! notifies watchers, which are expected to re-fetch from a cold state
//! since contract bindings are network-specific.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::domain::{Address, ClientError, Session};
use crate::ports::outbound::{WalletEvent, WalletProvider};

/// The wallet session adapter. The only component that mutates [`Session`].
pub struct WalletSession<W: WalletProvider + 'static> {
    provider: Arc<W>,
    state: Arc<RwLock<Session>>,
    changes: watch::Sender<Session>,
    listener: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl<W: WalletProvider + 'static> WalletSession<W> {
    /// Create a session adapter over `provider`. No listeners are
    /// registered until [`connect`](Self::connect) succeeds.
    pub fn new(provider: Arc<W>) -> Self {
        let (changes, _) = watch::channel(Session::empty());
        Self {
            provider,
            state: Arc::new(RwLock::new(Session::empty())),
            changes,
            listener: parking_lot::Mutex::new(None),
        }
    }

    /// Request account access from the provider, prompting the user on the
    /// first call, and start listening for change notifications.
    ///
    /// Returns the active identity. Fails with
    /// [`ClientError::ProviderUnavailable`] when no provider is present and
    /// [`ClientError::UserRejected`] when the user declines the prompt.
    pub async fn connect(&self) -> Result<Address, ClientError> {
        let accounts = self.provider.request_accounts().await?;
        let identity = accounts.into_iter().next().ok_or_else(|| {
            ClientError::UserRejected("provider returned no accounts".to_string())
        })?;
        let network_id = self.provider.chain_id().await?;

        {
            let mut state = self.state.write();
            state.active_identity = Some(identity.clone());
            state.network_id = Some(network_id);
        }
        self.changes.send_replace(self.state.read().clone());

        self.start_listener();
        Ok(identity)
    }

    /// The last known session, without prompting the user. Empty if never
    /// connected.
    pub fn current_session(&self) -> Session {
        self.state.read().clone()
    }

    /// Watch session changes (connect, account switch, chain switch,
    /// disconnect).
    pub fn subscribe_changes(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }

    /// Stop processing provider notifications. In-flight provider calls
    /// are left to complete and be discarded; no state updates happen
    /// after teardown. Idempotent.
    pub fn teardown(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
    }

    fn start_listener(&self) {
        let mut guard = self.listener.lock();
        if guard.is_some() {
            return;
        }

        let mut events = self.provider.subscribe();
        let state = Arc::clone(&self.state);
        let changes = self.changes.clone();
        *guard = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(WalletEvent::AccountsChanged(accounts)) => {
                        let mut session = state.write();
                        match accounts.into_iter().next() {
                            Some(identity) => session.active_identity = Some(identity),
                            // Empty account list is a disconnect.
                            None => *session = Session::empty(),
                        }
                        let snapshot = session.clone();
                        drop(session);
                        changes.send_replace(snapshot);
                    }
                    Ok(WalletEvent::ChainChanged(network_id)) => {
                        tracing::info!(%network_id, "wallet switched networks");
                        let mut session = state.write();
                        session.network_id = Some(network_id);
                        let snapshot = session.clone();
                        drop(session);
                        changes.send_replace(snapshot);
                    }
                    Ok(WalletEvent::Disconnected) => {
                        *state.write() = Session::empty();
                        changes.send_replace(Session::empty());
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed wallet notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }
}

impl<W: WalletProvider + 'static> Drop for WalletSession<W> {
    fn drop(&mut self) {
        self.teardown();
    }
}
