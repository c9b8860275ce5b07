//! application state: session lifecycle on top of the connection manager
//!
//! ```text
//! Uninitialized   --session restored-->    Connected
//! Uninitialized   --no/stale session-->    LandingShown
//! LandingShown    --enter-->               AwaitingConnect
//! AwaitingConnect --connect ok-->          Connected
//! AwaitingConnect --switch failed-->       NetworkMismatch
//! NetworkMismatch --connect ok-->          Connected
//! *               --logout/accounts gone-> LandingShown
//! ```
//!
//! every operation takes `&mut self`, so wallet notifications handled by
//! [`App::run`] queue up behind an in-flight `connect()` instead of racing it.

use crate::address::Address;
use crate::config::AppConfig;
use crate::connection::ConnectionManager;
use crate::contract::ContractBinding;
use crate::error::{ClientError, Result};
use crate::provider::{self, WalletEvent, WalletProvider};
use crate::router::{Direction, PanelRequest, Tab, TransitionEffect, ViewRouter};
use crate::session::KeyValueStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    LandingShown,
    AwaitingConnect,
    Connected,
    NetworkMismatch,
}

/// result of handling a wallet notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored,
    /// wallet removed every account, session dropped
    Disconnected,
    /// in-memory state is stale, the host should reload
    Reload,
}

/// what the host should draw
pub enum View<'a, P: ?Sized> {
    Loading,
    Landing,
    Connect {
        network_error: bool,
        notice: Option<&'a str>,
    },
    Dashboard {
        account: &'a Address,
        active_tab: Tab,
        contract_address: Option<&'a Address>,
        network_error: bool,
        panel: Option<PanelRequest<'a, P>>,
        transition: Option<TransitionEffect>,
    },
}

pub struct App<P: ?Sized, S> {
    connection: ConnectionManager<P, S>,
    router: ViewRouter,
    phase: watch::Sender<Phase>,
    notice: Option<String>,
    events: Option<mpsc::UnboundedReceiver<WalletEvent>>,
}

impl<P: WalletProvider + ?Sized, S: KeyValueStore> App<P, S> {
    pub fn new(config: AppConfig, provider: Option<Arc<P>>, store: S) -> Self {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        Self {
            router: ViewRouter::new(config.transitions),
            connection: ConnectionManager::new(provider, &config, store),
            phase,
            notice: None,
            events: None,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// last user-facing error message
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn connection(&self) -> &ConnectionManager<P, S> {
        &self.connection
    }

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn account(&self) -> Option<&Address> {
        self.connection.handle().map(|h| h.account())
    }

    pub fn contract(&self) -> Option<&ContractBinding<P>> {
        self.connection.contract()
    }

    /// contract binding for a dashboard action. a pending network mismatch
    /// does not block the call, it surfaces as `network_error` in the view
    /// and the call fails upstream.
    pub fn require_contract(&self) -> Result<&ContractBinding<P>> {
        let handle = self.connection.handle().ok_or(ClientError::NotConnected)?;
        handle.contract().ok_or(ClientError::NoContract)
    }

    fn set_phase(&mut self, phase: Phase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!("phase {:?} -> {:?}", previous, phase);
        }
    }

    /// subscribe to wallet notifications and restore a previous session
    pub async fn init(&mut self) {
        if self.events.is_none() {
            self.events = self.connection.provider().map(|p| p.subscribe());
        }
        self.restore_session().await;
    }

    /// unsubscribe and drop in-memory state; the persisted session stays
    pub fn teardown(&mut self) {
        self.events = None;
        self.connection.forget();
        self.router.reset();
        self.notice = None;
        self.set_phase(Phase::Uninitialized);
    }

    /// full reload: rebuild everything from the persisted session
    pub async fn reload(&mut self) {
        info!("reloading from persisted session");
        self.connection.forget();
        self.router.reset();
        self.notice = None;
        self.set_phase(Phase::Uninitialized);
        self.restore_session().await;
    }

    async fn restore_session(&mut self) {
        let Some(provider) = self.connection.provider().cloned() else {
            info!("no wallet provider detected");
            self.set_phase(Phase::LandingShown);
            return;
        };

        if let Err(e) = self.connection.guard().check_network().await {
            warn!("network check failed: {}", e);
        }

        let session = match self.connection.sessions().load() {
            Ok(session) => session,
            Err(e) => {
                warn!("could not read session: {}", e);
                None
            }
        };
        let Some(session) = session else {
            self.set_phase(Phase::LandingShown);
            return;
        };

        let accounts = match provider::accounts(provider.as_ref()).await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("could not read wallet accounts: {}", e);
                Vec::new()
            }
        };
        let same_account = accounts
            .first()
            .is_some_and(|active| session.account.matches(active));

        if !same_account {
            info!("persisted session for {} is stale, discarding", session.account);
            if let Err(e) = self.connection.sessions().clear() {
                warn!("could not clear session: {}", e);
            }
            self.set_phase(Phase::LandingShown);
            return;
        }

        info!("restoring session for {}", session.account);
        // a failed silent reconnect leaves the user on the connect screen
        if let Err(e) = self.connect().await {
            debug!("silent reconnect for {} failed: {}", session.account, e);
        }
    }

    /// landing page "enter"
    pub fn enter(&mut self) {
        if self.phase() == Phase::LandingShown {
            self.set_phase(Phase::AwaitingConnect);
        }
    }

    /// back to the landing page from the connect screen
    pub fn back(&mut self) {
        if matches!(self.phase(), Phase::AwaitingConnect | Phase::NetworkMismatch) {
            self.set_phase(Phase::LandingShown);
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        let result = self.connection.connect().await.map(|_| ());
        match result {
            Ok(()) => {
                self.notice = None;
                self.set_phase(Phase::Connected);
                Ok(())
            }
            Err(e) => {
                warn!("connect failed: {}", e);
                self.notice = Some(e.to_string());
                let phase = match &e {
                    ClientError::NetworkSwitch(_) | ClientError::NetworkAdd(_) => {
                        Phase::NetworkMismatch
                    }
                    _ => Phase::AwaitingConnect,
                };
                self.set_phase(phase);
                Err(e)
            }
        }
    }

    /// "switch network" button on the connect screen or header banner
    pub async fn switch_network(&mut self) -> Result<()> {
        match self.connection.guard().switch_to_expected_network().await {
            Ok(()) => {
                self.notice = None;
                if self.phase() == Phase::NetworkMismatch {
                    self.set_phase(Phase::AwaitingConnect);
                }
                Ok(())
            }
            Err(e) => {
                self.notice = Some(format!(
                    "{}; switch to {} manually in your wallet",
                    e,
                    self.connection.guard().network().chain_name
                ));
                Err(e)
            }
        }
    }

    /// play the exit transition, then clear the session. idempotent.
    pub async fn logout(&mut self) -> Result<()> {
        self.router.play(Direction::Left, Instant::now());
        time::sleep(self.router.timings().logout_delay).await;

        let result = self.connection.disconnect().await;
        // the in-memory connection is gone either way
        self.router.reset();
        self.set_phase(Phase::LandingShown);
        match result {
            Ok(()) => {
                self.notice = None;
                Ok(())
            }
            Err(e) => {
                warn!("logout could not clear the session: {}", e);
                self.notice = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.phase() == Phase::Connected {
            self.router.select(tab, Instant::now());
        }
    }

    /// point the dashboard at another registry deployment
    pub fn rebind(&mut self, address: Address) -> Result<()> {
        self.connection.rebind(address).map(|_| ())
    }

    pub async fn handle_event(&mut self, event: WalletEvent) -> EventOutcome {
        match event {
            WalletEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                info!("wallet disconnected every account");
                if let Err(e) = self.connection.drop_session() {
                    warn!("could not clear session: {}", e);
                }
                self.router.reset();
                self.set_phase(Phase::LandingShown);
                EventOutcome::Disconnected
            }
            WalletEvent::AccountsChanged(accounts) => {
                let saved = match self.connection.sessions().load_account() {
                    Ok(saved) => saved,
                    Err(e) => {
                        warn!("could not read session: {}", e);
                        None
                    }
                };
                let Some(saved) = saved else {
                    return EventOutcome::Ignored;
                };
                if saved.matches(&accounts[0]) {
                    return EventOutcome::Ignored;
                }
                match Address::parse(&accounts[0]) {
                    Ok(next) => {
                        info!("active account changed {} -> {}", saved, next);
                        if let Err(e) = self.connection.sessions().update_account(&next) {
                            warn!("could not persist account: {}", e);
                        }
                    }
                    Err(e) => warn!("wallet reported bad account: {}", e),
                }
                EventOutcome::Reload
            }
            WalletEvent::ChainChanged(chain_id) => {
                info!("wallet switched to chain {}", chain_id);
                if let Err(e) = self.connection.guard().check_network().await {
                    warn!("network check failed: {}", e);
                }
                EventOutcome::Reload
            }
        }
    }

    /// next wallet notification, `None` once the provider is gone or torn down
    pub async fn next_event(&mut self) -> Option<WalletEvent> {
        self.events.as_mut()?.recv().await
    }

    /// process wallet notifications until the subscription closes
    pub async fn run(&mut self) {
        while let Some(event) = self.next_event().await {
            if self.handle_event(event).await == EventOutcome::Reload {
                self.reload().await;
            }
        }
        debug!("wallet event stream closed");
    }

    pub fn view(&mut self) -> View<'_, P> {
        let now = Instant::now();
        self.router.tick(now);

        match self.phase() {
            Phase::Uninitialized => View::Loading,
            Phase::LandingShown => View::Landing,
            Phase::AwaitingConnect | Phase::NetworkMismatch => View::Connect {
                network_error: self.connection.guard().is_mismatched(),
                notice: self.notice.as_deref(),
            },
            Phase::Connected => match self.connection.handle() {
                Some(handle) => View::Dashboard {
                    account: handle.account(),
                    active_tab: self.router.active_tab(),
                    contract_address: self.connection.contract_address(),
                    network_error: self.connection.guard().is_mismatched(),
                    panel: self.router.panel(handle.account(), handle.contract()),
                    transition: self.router.transition(now),
                },
                None => View::Connect {
                    network_error: self.connection.guard().is_mismatched(),
                    notice: self.notice.as_deref(),
                },
            },
        }
    }
}
