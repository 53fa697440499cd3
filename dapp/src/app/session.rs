//! # Wallet Session
//!
//! Owns `address`, `chain_id` and `block_height`. Passive state comes from three startup
//! reads and from provider push events; [`Session::connect`] is the only explicit action.
//! Every field change is published to the [`SaleView`](crate::app::SaleView) and broadcast
//! as a [`SessionChanged`] so the read cache can refresh.

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::app::events::{SessionChanged, SessionField};
use crate::app::state::{StateHandle, WalletSession};
use crate::core::error::{AppError, Result};
use crate::core::service::{ProviderEvent, WalletProvider};
use crate::services::wallet::{self, parse_quantity_str, verify_account};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Session {
    provider: Arc<dyn WalletProvider>,
    state: StateHandle,
    changes: broadcast::Sender<SessionChanged>,
}

impl Session {
    pub fn new(provider: Arc<dyn WalletProvider>, state: StateHandle) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            provider,
            state,
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChanged> {
        self.changes.subscribe()
    }

    pub fn current(&self) -> WalletSession {
        self.state.read(|s| s.session.clone())
    }

    /// Establish passive state: accounts, chain id and block height, read concurrently.
    ///
    /// A failed read leaves its field unset.
    pub async fn init(&self) {
        let provider = self.provider.as_ref();
        let (accounts, chain_id, block) = tokio::join!(
            wallet::accounts(provider),
            wallet::chain_id(provider),
            wallet::block_number(provider),
        );

        match accounts {
            Ok(accounts) => self.set_address(verify_account(&accounts)),
            Err(e) => warn!(error = %e, "Initial eth_accounts failed"),
        }
        match chain_id {
            Ok(chain_id) => self.set_chain_id(chain_id),
            Err(e) => warn!(error = %e, "Initial eth_chainId failed"),
        }
        match block {
            Ok(height) => self.set_block_height(height),
            Err(e) => warn!(error = %e, "Initial eth_blockNumber failed"),
        }
    }

    /// Ask the wallet for account access.
    ///
    /// Fails with `PermissionDenied` when the user rejects or the returned account does not
    /// verify. On success the chain id is re-read.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<Address> {
        let accounts = wallet::request_accounts(self.provider.as_ref()).await?;
        let address = verify_account(&accounts).ok_or_else(|| {
            AppError::PermissionDenied("Permission denied or account not verified".to_string())
        })?;

        self.set_address(Some(address));
        if let Err(e) = self.reload_chain_id().await {
            warn!(error = %e, "Could not read chain id after connect");
        }

        info!(address = %address, "Wallet connected");
        Ok(address)
    }

    /// Re-read `eth_chainId` into the session.
    pub async fn reload_chain_id(&self) -> Result<u64> {
        let chain_id = wallet::chain_id(self.provider.as_ref()).await?;
        self.set_chain_id(chain_id);
        Ok(chain_id)
    }

    pub fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let address = verify_account(&accounts);
                if address.is_none() && !accounts.is_empty() {
                    warn!(account = %accounts[0], "Ignoring account that failed verification");
                }
                self.set_address(address);
            }
            ProviderEvent::ChainChanged(raw) => match parse_quantity_str(&raw) {
                Ok(chain_id) => self.set_chain_id(chain_id),
                Err(e) => warn!(chain_id = %raw, error = %e, "Unparseable chainChanged"),
            },
            ProviderEvent::NewBlock(height) => self.set_block_height(height),
        }
    }

    /// Consume provider events for as long as the provider keeps its queue open.
    pub fn spawn_event_loop(&self) -> JoinHandle<()> {
        let session = self.clone();
        let events = self.provider.events();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                debug!(event = ?event, "Provider event");
                session.handle_event(event);
            }
            debug!("Provider event queue closed");
        })
    }

    fn set_address(&self, address: Option<Address>) {
        self.set(SessionField::Address, |session| {
            if session.address == address {
                return false;
            }
            match address {
                Some(a) => info!(address = %a, "Account changed"),
                None => info!("Wallet disconnected"),
            }
            session.address = address;
            true
        });
    }

    fn set_chain_id(&self, chain_id: u64) {
        self.set(SessionField::ChainId, |session| {
            if session.chain_id == Some(chain_id) {
                return false;
            }
            info!(chain_id, "Chain changed");
            session.chain_id = Some(chain_id);
            true
        });
    }

    fn set_block_height(&self, height: u64) {
        self.set(SessionField::BlockHeight, |session| {
            if session.block_height == Some(height) {
                return false;
            }
            session.block_height = Some(height);
            true
        });
    }

    fn set(&self, field: SessionField, apply: impl FnOnce(&mut WalletSession) -> bool) {
        let mut snapshot = None;
        self.state.update_if(|state| {
            let changed = apply(&mut state.session);
            if changed {
                snapshot = Some(state.session.clone());
            }
            changed
        });
        if let Some(session) = snapshot {
            // No receivers is fine: nothing depends on the session yet.
            let _ = self.changes.send(SessionChanged { field, session });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::mock::{MockProvider, ACCOUNT};
    use shared::chain::METACHAIN;

    fn session_with(provider: Arc<MockProvider>) -> Session {
        Session::new(provider, StateHandle::new(&METACHAIN, true))
    }

    #[tokio::test]
    async fn test_init_reads_three_fields() {
        let provider = MockProvider::new();
        provider.set_accounts(vec![ACCOUNT.to_lowercase()]);
        provider.set_chain_id(1131);
        provider.set_block(42);
        let session = session_with(provider);

        session.init().await;

        let current = session.current();
        assert_eq!(current.address.map(|a| a.to_string()).as_deref(), Some(ACCOUNT));
        assert_eq!(current.chain_id, Some(1131));
        assert_eq!(current.block_height, Some(42));
    }

    #[tokio::test]
    async fn test_init_failed_read_leaves_field_unset() {
        let provider = MockProvider::new();
        provider.fail_method("eth_blockNumber");
        let session = session_with(provider);

        session.init().await;

        assert_eq!(session.current().block_height, None);
        assert_eq!(session.current().chain_id, Some(1130));
    }

    #[tokio::test]
    async fn test_connect_sets_address_and_chain() {
        let provider = MockProvider::new();
        provider.set_accounts(vec![ACCOUNT.to_string()]);
        let session = session_with(provider);

        let address = session.connect().await.unwrap();

        assert_eq!(address.to_string(), ACCOUNT);
        assert!(session.current().is_connected());
        assert_eq!(session.current().chain_id, Some(1130));
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let provider = MockProvider::new();
        provider.reject_method("eth_requestAccounts");
        let session = session_with(provider);

        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, AppError::PermissionDenied(_)));
        assert!(!session.current().is_connected());
    }

    #[tokio::test]
    async fn test_connect_unverified_account() {
        let provider = MockProvider::new();
        provider.set_accounts(vec!["0xnot-an-address".to_string()]);
        let session = session_with(provider);

        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_disconnect_clears_address() {
        let session = session_with(MockProvider::new());
        session.handle_event(ProviderEvent::AccountsChanged(vec![ACCOUNT.to_string()]));
        session.handle_event(ProviderEvent::ChainChanged("0x46a".to_string()));
        session.handle_event(ProviderEvent::NewBlock(7));
        assert!(session.current().is_connected());

        session.handle_event(ProviderEvent::AccountsChanged(vec![]));

        let current = session.current();
        assert_eq!(current.address, None);
        assert!(!current.is_connected());
        assert_eq!(current.chain_id, Some(1130));
        assert_eq!(current.block_height, Some(7));
    }

    #[tokio::test]
    async fn test_broadcasts_only_real_changes() {
        let session = session_with(MockProvider::new());
        let mut changes = session.subscribe();

        session.handle_event(ProviderEvent::NewBlock(5));
        session.handle_event(ProviderEvent::NewBlock(5));
        session.handle_event(ProviderEvent::ChainChanged("0x46b".to_string()));

        let first = changes.recv().await.unwrap();
        assert_eq!(first.field, SessionField::BlockHeight);
        assert_eq!(first.session.block_height, Some(5));
        let second = changes.recv().await.unwrap();
        assert_eq!(second.field, SessionField::ChainId);
        assert_eq!(second.session.chain_id, Some(1131));
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_event_loop_applies_pushed_events() {
        let provider = MockProvider::new();
        let session = session_with(provider.clone());
        let mut changes = session.subscribe();
        let handle = session.spawn_event_loop();

        provider.push(ProviderEvent::AccountsChanged(vec![ACCOUNT.to_string()]));

        let change = changes.recv().await.unwrap();
        assert_eq!(change.field, SessionField::Address);
        assert!(change.session.is_connected());
        handle.abort();
    }
}
