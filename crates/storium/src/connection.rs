//! connection manager: wallet handshake, session bookkeeping, contract binding

use crate::address::Address;
use crate::config::AppConfig;
use crate::contract::{ContractBinding, Signer};
use crate::error::{ClientError, Result};
use crate::network::NetworkGuard;
use crate::provider::{self, methods, WalletProvider};
use crate::session::{KeyValueStore, Session, SessionStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// live connection, rebuilt from the session on every reload
pub struct ConnectionHandle<P: ?Sized> {
    signer: Signer<P>,
    contract: Option<ContractBinding<P>>,
}

impl<P: ?Sized> ConnectionHandle<P> {
    pub fn account(&self) -> &Address {
        self.signer.account()
    }

    pub fn signer(&self) -> &Signer<P> {
        &self.signer
    }

    pub fn contract(&self) -> Option<&ContractBinding<P>> {
        self.contract.as_ref()
    }
}

pub struct ConnectionManager<P: ?Sized, S> {
    provider: Option<Arc<P>>,
    guard: NetworkGuard<P>,
    sessions: SessionStore<S>,
    contract_address: Option<Address>,
    revoke_on_logout: bool,
    handle: Option<ConnectionHandle<P>>,
}

impl<P: WalletProvider + ?Sized, S: KeyValueStore> ConnectionManager<P, S> {
    pub fn new(provider: Option<Arc<P>>, config: &AppConfig, store: S) -> Self {
        Self {
            guard: NetworkGuard::new(provider.clone(), config.network.clone()),
            provider,
            sessions: SessionStore::new(store),
            contract_address: config.contract_address.clone(),
            revoke_on_logout: config.revoke_on_logout,
            handle: None,
        }
    }

    pub fn provider(&self) -> Option<&Arc<P>> {
        self.provider.as_ref()
    }

    pub fn guard(&self) -> &NetworkGuard<P> {
        &self.guard
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    pub fn handle(&self) -> Option<&ConnectionHandle<P>> {
        self.handle.as_ref()
    }

    pub fn contract(&self) -> Option<&ContractBinding<P>> {
        self.handle.as_ref().and_then(ConnectionHandle::contract)
    }

    pub fn contract_address(&self) -> Option<&Address> {
        self.contract_address.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// full handshake. nothing is persisted unless every step before the
    /// session write succeeded.
    pub async fn connect(&mut self) -> Result<&ConnectionHandle<P>> {
        let provider = self.provider.clone().ok_or(ClientError::ProviderAbsent)?;

        if !self.guard.check_network().await? {
            self.guard.switch_to_expected_network().await?;
        }

        let accounts = provider::request_accounts(provider.as_ref()).await?;
        let account = provider::active_account(&accounts)?;

        self.sessions.save(&Session::connected(account.clone()))?;

        let signer = Signer::new(account, provider);
        let contract = self
            .contract_address
            .clone()
            .map(|address| ContractBinding::new(address, signer.clone()));
        info!(
            "connected {} (contract {})",
            signer.account(),
            self.contract_address
                .as_ref()
                .map_or_else(|| "unbound".to_string(), |a| a.to_string())
        );

        Ok(&*self.handle.insert(ConnectionHandle { signer, contract }))
    }

    /// logout: clear session and in-memory connection. safe to repeat.
    pub async fn disconnect(&mut self) -> Result<()> {
        let previous = self.handle.take();
        self.sessions.clear()?;

        if let (Some(handle), Some(provider), true) =
            (previous, self.provider.as_ref(), self.revoke_on_logout)
        {
            // best effort, the wallet may not support it
            let params = json!([{ "eth_accounts": {} }]);
            if let Err(e) = provider.request(methods::REQUEST_PERMISSIONS, params).await {
                debug!("permission reset for {} failed: {}", handle.account(), e);
            }
            info!("disconnected {}", handle.account());
        }
        Ok(())
    }

    /// wallet-side disconnect: drop everything, no further wallet requests
    pub fn drop_session(&mut self) -> Result<()> {
        self.handle = None;
        self.sessions.clear()
    }

    /// drop the in-memory connection, keep the persisted session
    pub fn forget(&mut self) {
        self.handle = None;
    }

    /// bind to another contract address with the current signer
    pub fn rebind(&mut self, address: Address) -> Result<&ContractBinding<P>> {
        let handle = self.handle.as_mut().ok_or(ClientError::NotConnected)?;
        info!("rebinding contract to {}", address);
        self.contract_address = Some(address.clone());
        let binding = ContractBinding::new(address, handle.signer.clone());
        Ok(&*handle.contract.insert(binding))
    }
}
