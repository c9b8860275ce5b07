//! network and application configuration

use crate::address::Address;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// sepolia testnet chain id as the wallet reports it
pub const SEPOLIA_CHAIN_ID: &str = "0xaa36a7";

/// storium registry deployed on sepolia
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x2662b183bC1883e15B8E4D1E8DE1Da5ca126A626";

/// native currency of a chain (eip-3085)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// chain descriptor, serialized verbatim as `wallet_addEthereumChain` params
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    /// hex chain id, e.g. `0xaa36a7`
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkDescriptor {
    /// sepolia test network
    pub fn sepolia() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID.into(),
            chain_name: "Sepolia Test Network".into(),
            native_currency: NativeCurrency {
                name: "SepoliaETH".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://sepolia.infura.io/v3/".into()],
            block_explorer_urls: vec!["https://sepolia.etherscan.io/".into()],
        }
    }

    /// wallets disagree on hex casing of chain ids
    pub fn is_chain(&self, chain_id: &str) -> bool {
        self.chain_id.eq_ignore_ascii_case(chain_id)
    }
}

/// cosmetic transition timings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTimings {
    /// how long the transition stays visible
    #[serde(with = "millis")]
    pub visible_for: Duration,
    /// delay before a tab switch is committed
    #[serde(with = "millis")]
    pub tab_commit_delay: Duration,
    /// delay before logout clears state
    #[serde(with = "millis")]
    pub logout_delay: Duration,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            visible_for: Duration::from_millis(2000),
            tab_commit_delay: Duration::from_millis(500),
            logout_delay: Duration::from_millis(1000),
        }
    }
}

/// application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// network the contract is deployed on
    pub network: NetworkDescriptor,
    /// registry contract, `None` leaves the connection unbound
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub transitions: TransitionTimings,
    /// ask the wallet to drop its account grant on logout
    #[serde(default = "default_true")]
    pub revoke_on_logout: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

impl AppConfig {
    pub fn sepolia() -> Self {
        Self {
            network: NetworkDescriptor::sepolia(),
            contract_address: Address::parse(DEFAULT_CONTRACT_ADDRESS).ok(),
            transitions: TransitionTimings::default(),
            revoke_on_logout: true,
        }
    }

    /// load from a json document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let id = &self.network.chain_id;
        let digits = id
            .strip_prefix("0x")
            .ok_or_else(|| ClientError::Config(format!("chain id {} is not 0x-prefixed", id)))?;
        if digits.is_empty() || u64::from_str_radix(digits, 16).is_err() {
            return Err(ClientError::Config(format!("chain id {} is not hex", id)));
        }
        if self.network.rpc_urls.is_empty() {
            return Err(ClientError::Config("network has no rpc urls".into()));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
