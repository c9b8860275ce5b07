//! storium: client core for the storium decentralized file registry
//!
//! connects a browser wallet (eip-1193), keeps it on the registry's chain,
//! persists a minimal session for silent reconnection and binds the
//! registry contract to the connected account.
//!
//! ## layout
//!
//! ```text
//! App
//! ├── ConnectionManager
//! │   ├── NetworkGuard      chain check / switch / add
//! │   ├── SessionStore      walletConnected + connectedAccount
//! │   └── ConnectionHandle  account, signer, ContractBinding
//! └── ViewRouter            upload | files | explore | share
//! ```
//!
//! ## usage
//!
//! ```rust,ignore
//! let mut app = App::new(AppConfig::sepolia(), Some(wallet), MemoryStore::new());
//! app.init().await;          // silent reconnect if the session is still valid
//! app.enter();
//! app.connect().await?;
//! let files = app.require_contract()?.get_my_files().await?;
//! app.run().await;           // wallet notifications until teardown
//! ```

pub mod abi;
pub mod address;
pub mod app;
pub mod config;
pub mod connection;
pub mod contract;
pub mod effects;
pub mod error;
pub mod network;
pub mod provider;
pub mod router;
pub mod session;
pub mod testing;

pub use address::Address;
pub use app::{App, EventOutcome, Phase, View};
pub use config::{AppConfig, NetworkDescriptor, TransitionTimings};
pub use connection::{ConnectionHandle, ConnectionManager};
pub use alloy_primitives::U256;
pub use contract::{
    AccessGrant, ContractBinding, ContractEvent, FileRecord, Log, NewFile, UserAccess,
};
pub use error::{ClientError, Result, RpcError};
pub use network::{NetworkGuard, NetworkState};
pub use provider::{WalletEvent, WalletProvider};
pub use router::{Tab, ViewRouter};
pub use session::{KeyValueStore, MemoryStore, Session, SessionStore, SledStore};
