//! network guard: keep the wallet on the chain the registry lives on

use crate::config::NetworkDescriptor;
use crate::error::{ClientError, Result};
use crate::provider::{self, methods, WalletProvider};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// last known network status
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkState {
    pub expected_chain_id: String,
    /// chain the wallet reported on the last check
    pub current_chain_id: Option<String>,
    pub mismatch: bool,
}

pub struct NetworkGuard<P: ?Sized> {
    provider: Option<Arc<P>>,
    network: NetworkDescriptor,
    state: watch::Sender<NetworkState>,
}

impl<P: WalletProvider + ?Sized> NetworkGuard<P> {
    pub fn new(provider: Option<Arc<P>>, network: NetworkDescriptor) -> Self {
        let (state, _) = watch::channel(NetworkState {
            expected_chain_id: network.chain_id.clone(),
            current_chain_id: None,
            mismatch: false,
        });
        Self {
            provider,
            network,
            state,
        }
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    pub fn state(&self) -> NetworkState {
        self.state.borrow().clone()
    }

    pub fn is_mismatched(&self) -> bool {
        self.state.borrow().mismatch
    }

    /// watch the mismatch flag (header banner, connect screen)
    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }

    /// compare the wallet's active chain with the expected one
    pub async fn check_network(&self) -> Result<bool> {
        let provider = self.provider.as_ref().ok_or(ClientError::ProviderAbsent)?;
        let chain_id = provider::chain_id(provider.as_ref()).await?;
        let matches = self.network.is_chain(&chain_id);
        if !matches {
            warn!(
                "wallet on chain {}, expected {}",
                chain_id, self.network.chain_id
            );
        }
        self.state.send_modify(|s| {
            s.current_chain_id = Some(chain_id);
            s.mismatch = !matches;
        });
        Ok(matches)
    }

    /// ask the wallet to switch, registering the chain first if it doesn't know it.
    ///
    /// failures are returned for display and leave the mismatch flag set; the
    /// user is expected to fix things in the wallet ui.
    pub async fn switch_to_expected_network(&self) -> Result<()> {
        let provider = self.provider.as_ref().ok_or(ClientError::ProviderAbsent)?;
        let switch_params = json!([{ "chainId": self.network.chain_id }]);

        let result = match provider.request(methods::SWITCH_CHAIN, switch_params.clone()).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                info!("wallet does not know {}, adding it", self.network.chain_name);
                match provider
                    .request(methods::ADD_CHAIN, json!([self.network]))
                    .await
                {
                    Ok(_) => provider
                        .request(methods::SWITCH_CHAIN, switch_params)
                        .await
                        .map(|_| ())
                        .map_err(ClientError::NetworkSwitch),
                    Err(e) => Err(ClientError::NetworkAdd(e)),
                }
            }
            Err(e) => Err(ClientError::NetworkSwitch(e)),
        };

        match &result {
            Ok(()) => {
                info!("switched wallet to {}", self.network.chain_name);
                self.state.send_modify(|s| {
                    s.current_chain_id = Some(self.network.chain_id.clone());
                    s.mismatch = false;
                });
            }
            Err(e) => {
                warn!("network switch failed: {}", e);
                self.state.send_modify(|s| s.mismatch = true);
            }
        }
        result
    }
}
