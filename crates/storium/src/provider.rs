//! wallet provider interface (eip-1193)
//!
//! the browser wallet is opaque to us: a request/response rpc plus two
//! notifications. hosts implement [`WalletProvider`] over whatever binding
//! they have (wasm-bindgen, a bridge process, [`crate::testing::MockWallet`]).

use crate::address::Address;
use crate::error::{ClientError, Result, RpcError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    pub const REQUEST_PERMISSIONS: &str = "wallet_requestPermissions";
    pub const CALL: &str = "eth_call";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
}

/// notification pushed by the wallet at arbitrary times
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletEvent {
    /// `accountsChanged`, empty when the user disconnected the site
    AccountsChanged(Vec<String>),
    /// `chainChanged` with the new hex chain id
    ChainChanged(String),
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `request({ method, params })`
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, RpcError>;

    /// register for `accountsChanged` / `chainChanged` for the life of the page
    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent>;
}

/// active chain id as reported by the wallet
pub async fn chain_id<P: WalletProvider + ?Sized>(provider: &P) -> Result<String> {
    let value = provider.request(methods::CHAIN_ID, json!([])).await?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unexpected(methods::CHAIN_ID, "chain id is not a string"))
}

/// accounts already authorized for this site, never prompts
pub async fn accounts<P: WalletProvider + ?Sized>(provider: &P) -> Result<Vec<String>> {
    let value = provider.request(methods::ACCOUNTS, json!([])).await?;
    parse_accounts(methods::ACCOUNTS, value)
}

/// ask the user to authorize accounts for this site
pub async fn request_accounts<P: WalletProvider + ?Sized>(provider: &P) -> Result<Vec<String>> {
    let value = provider.request(methods::REQUEST_ACCOUNTS, json!([])).await?;
    parse_accounts(methods::REQUEST_ACCOUNTS, value)
}

/// first account of a list, which is the one the wallet treats as active
pub fn active_account(accounts: &[String]) -> Result<Address> {
    let first = accounts.first().ok_or(ClientError::NoAccounts)?;
    Address::parse(first)
}

fn parse_accounts(method: &str, value: Value) -> Result<Vec<String>> {
    let list = value
        .as_array()
        .ok_or_else(|| unexpected(method, "accounts is not an array"))?;
    list.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| unexpected(method, "account is not a string"))
        })
        .collect()
}

pub(crate) fn unexpected(method: &str, reason: &str) -> ClientError {
    ClientError::UnexpectedResponse {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}
