//! scripted wallet provider for tests and headless hosts
//!
//! behaves like a browser wallet with one site permission: it tracks the
//! active chain, the chains it knows, whether the site is authorized, and
//! records every request it receives.

use crate::error::RpcError;
use crate::provider::{methods, WalletEvent, WalletProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::mpsc;

struct MockState {
    chain_id: String,
    known_chains: HashSet<String>,
    accounts: Vec<String>,
    authorized: bool,
    reject_accounts: bool,
    switch_error: Option<RpcError>,
    switch_error_once: Option<RpcError>,
    add_error: Option<RpcError>,
    responses: HashMap<String, VecDeque<Result<Value, RpcError>>>,
    calls: Vec<(String, Value)>,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<WalletEvent>>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWallet {
    /// wallet on sepolia and mainnet, no accounts, site not authorized
    pub fn new() -> Self {
        let known_chains = ["0x1", "0xaa36a7"].iter().map(|c| c.to_string()).collect();
        Self {
            state: Mutex::new(MockState {
                chain_id: "0xaa36a7".into(),
                known_chains,
                accounts: Vec::new(),
                authorized: false,
                reject_accounts: false,
                switch_error: None,
                switch_error_once: None,
                add_error: None,
                responses: HashMap::new(),
                calls: Vec::new(),
            }),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_chain(self, chain_id: &str) -> Self {
        {
            let mut s = self.state.lock();
            s.chain_id = chain_id.to_string();
            s.known_chains.insert(chain_id.to_ascii_lowercase());
        }
        self
    }

    /// forget a chain so switching to it answers 4902
    pub fn without_chain(self, chain_id: &str) -> Self {
        self.state.lock().known_chains.remove(&chain_id.to_ascii_lowercase());
        self
    }

    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        self.state.lock().accounts = accounts.iter().map(|a| a.to_string()).collect();
        self
    }

    /// site already holds an account permission (`eth_accounts` answers)
    pub fn authorized(self) -> Self {
        self.state.lock().authorized = true;
        self
    }

    pub fn reject_accounts(self) -> Self {
        self.state.lock().reject_accounts = true;
        self
    }

    pub fn fail_switch(self, err: RpcError) -> Self {
        self.state.lock().switch_error = Some(err);
        self
    }

    /// fail the next switch that would otherwise succeed, then behave normally
    pub fn fail_switch_once(self, err: RpcError) -> Self {
        self.state.lock().switch_error_once = Some(err);
        self
    }

    pub fn fail_add(self, err: RpcError) -> Self {
        self.state.lock().add_error = Some(err);
        self
    }

    /// queue a response for a method without built-in behaviour (`eth_call`, ...)
    pub fn push_response(&self, method: &str, response: Result<Value, RpcError>) {
        self.state
            .lock()
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn set_chain(&self, chain_id: &str) {
        let mut s = self.state.lock();
        s.chain_id = chain_id.to_string();
        s.known_chains.insert(chain_id.to_ascii_lowercase());
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.state.lock().accounts = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub fn chain(&self) -> String {
        self.state.lock().chain_id.clone()
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state.lock().calls.iter().filter(|(m, _)| m == method).count()
    }

    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.state
            .lock()
            .calls
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// push a notification to every subscriber
    pub fn emit(&self, event: WalletEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| !tx.is_closed());
        subs.len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut s = self.state.lock();
        s.calls.push((method.to_string(), params.clone()));

        match method {
            methods::CHAIN_ID => Ok(json!(s.chain_id)),
            methods::ACCOUNTS => {
                if s.authorized {
                    Ok(json!(s.accounts))
                } else {
                    Ok(json!([]))
                }
            }
            methods::REQUEST_ACCOUNTS => {
                if s.reject_accounts {
                    return Err(RpcError::user_rejected());
                }
                s.authorized = true;
                Ok(json!(s.accounts))
            }
            methods::SWITCH_CHAIN => {
                if let Some(err) = s.switch_error.clone() {
                    return Err(err);
                }
                let target = params[0]["chainId"].as_str().unwrap_or_default().to_string();
                if !s.known_chains.contains(&target.to_ascii_lowercase()) {
                    return Err(RpcError::unrecognized_chain(&target));
                }
                if let Some(err) = s.switch_error_once.take() {
                    return Err(err);
                }
                s.chain_id = target;
                Ok(Value::Null)
            }
            methods::ADD_CHAIN => {
                if let Some(err) = s.add_error.clone() {
                    return Err(err);
                }
                let target = params[0]["chainId"].as_str().unwrap_or_default().to_string();
                s.known_chains.insert(target.to_ascii_lowercase());
                Ok(Value::Null)
            }
            methods::REQUEST_PERMISSIONS => Ok(json!([{ "parentCapability": "eth_accounts" }])),
            other => s
                .responses
                .get_mut(other)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| {
                    Err(RpcError::new(-32601, format!("method {} not scripted", other)))
                }),
        }
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }
}
