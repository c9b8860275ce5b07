//! persisted session record
//!
//! two string entries survive reloads:
//!
//! ```text
//! walletConnected  = "true" | absent
//! connectedAccount = "0x..." (as the wallet returned it)
//! ```
//!
//! the account is written verbatim and compared case-insensitively on read.

use crate::address::Address;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CONNECTED_KEY: &str = "walletConnected";
pub const ACCOUNT_KEY: &str = "connectedAccount";

/// string key/value backend (browser localStorage, sled, memory)
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// in-memory backend, clones share the same map
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// sled-backed store for native hosts, clones share the same tree
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: &str) -> Result<Self> {
        info!("opening session storage at {}", path);
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

/// minimal record allowing silent reconnection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub connected: bool,
    pub account: Address,
}

impl Session {
    pub fn connected(account: Address) -> Self {
        Self {
            connected: true,
            account,
        }
    }
}

pub struct SessionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if !session.connected {
            return self.clear();
        }
        self.backend.set(ACCOUNT_KEY, session.account.as_str())?;
        self.backend.set(CONNECTED_KEY, "true")?;
        debug!("saved session for {}", session.account);
        Ok(())
    }

    /// connected session, if any. a flag without a usable account is stale
    /// and gets dropped.
    pub fn load(&self) -> Result<Option<Session>> {
        if self.backend.get(CONNECTED_KEY)?.as_deref() != Some("true") {
            return Ok(None);
        }
        match self.load_account()? {
            Some(account) => Ok(Some(Session::connected(account))),
            None => {
                warn!("connected flag set without a valid account, clearing");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// persisted account regardless of the connected flag
    pub fn load_account(&self) -> Result<Option<Address>> {
        Ok(self
            .backend
            .get(ACCOUNT_KEY)?
            .and_then(|raw| Address::parse(&raw).ok()))
    }

    /// replace the account, keeping the connected flag as is
    pub fn update_account(&self, account: &Address) -> Result<()> {
        self.backend.set(ACCOUNT_KEY, account.as_str())
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove(CONNECTED_KEY)?;
        self.backend.remove(ACCOUNT_KEY)?;
        debug!("session cleared");
        Ok(())
    }
}
