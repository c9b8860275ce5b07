//! error types for the storium client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// eip-1193: the user rejected the request
pub const USER_REJECTED: i64 = 4001;
/// eip-1193: the requested method is not authorized
pub const UNAUTHORIZED: i64 = 4100;
/// eip-3326: the wallet does not know the requested chain
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// error object returned by a wallet provider request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("wallet rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED, "user rejected the request")
    }

    pub fn unrecognized_chain(chain_id: &str) -> Self {
        Self::new(
            UNRECOGNIZED_CHAIN,
            format!("unrecognized chain id {}", chain_id),
        )
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no wallet provider detected, install a browser wallet to use storium")]
    ProviderAbsent,

    #[error("request rejected by the user")]
    UserRejected,

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("failed to switch network: {0}")]
    NetworkSwitch(RpcError),

    #[error("failed to add network: {0}")]
    NetworkAdd(RpcError),

    #[error("not connected to a wallet")]
    NotConnected,

    #[error("no contract bound")]
    NoContract,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Rpc(RpcError),

    #[error("unexpected wallet response for {method}: {reason}")]
    UnexpectedResponse { method: String, reason: String },

    #[error("abi error: {0}")]
    Abi(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<RpcError> for ClientError {
    fn from(e: RpcError) -> Self {
        if e.is_user_rejection() {
            ClientError::UserRejected
        } else {
            ClientError::Rpc(e)
        }
    }
}

impl From<alloy_sol_types::Error> for ClientError {
    fn from(e: alloy_sol_types::Error) -> Self {
        ClientError::Abi(e.to_string())
    }
}

impl From<sled::Error> for ClientError {
    fn from(e: sled::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Config(e.to_string())
    }
}
