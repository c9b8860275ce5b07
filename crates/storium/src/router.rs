//! dashboard tab routing and the cosmetic transition
//!
//! a tab switch shows the transition right away and commits the new tab
//! after `tab_commit_delay`. commits resolve lazily against the clock the
//! caller passes in, so nothing here blocks or spawns.

use crate::address::Address;
use crate::config::TransitionTimings;
use crate::contract::ContractBinding;
use crate::error::ClientError;
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Upload,
    Files,
    Explore,
    Share,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Upload, Tab::Files, Tab::Explore, Tab::Share];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Upload => "upload",
            Tab::Files => "files",
            Tab::Explore => "explore",
            Tab::Share => "share",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ClientError::Config(format!("unknown tab: {}", s)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// transition overlay, visible for a fixed time after it starts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionEffect {
    pub direction: Direction,
    pub started_at: Instant,
    pub visible_for: std::time::Duration,
}

impl TransitionEffect {
    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.started_at + self.visible_for
    }
}

/// what the active panel is handed
pub struct PanelRequest<'a, P: ?Sized> {
    pub tab: Tab,
    pub account: &'a Address,
    pub contract: &'a ContractBinding<P>,
}

#[derive(Clone, Copy, Debug)]
struct PendingTab {
    tab: Tab,
    commit_at: Instant,
}

pub struct ViewRouter {
    active: Tab,
    pending: Option<PendingTab>,
    transition: Option<TransitionEffect>,
    timings: TransitionTimings,
}

impl ViewRouter {
    pub fn new(timings: TransitionTimings) -> Self {
        Self {
            active: Tab::default(),
            pending: None,
            transition: None,
            timings,
        }
    }

    pub fn timings(&self) -> &TransitionTimings {
        &self.timings
    }

    /// start the transition and schedule `tab` to become active
    pub fn select(&mut self, tab: Tab, now: Instant) {
        self.play(Direction::Right, now);
        self.pending = Some(PendingTab {
            tab,
            commit_at: now + self.timings.tab_commit_delay,
        });
    }

    pub fn play(&mut self, direction: Direction, now: Instant) {
        self.transition = Some(TransitionEffect {
            direction,
            started_at: now,
            visible_for: self.timings.visible_for,
        });
    }

    /// commit a pending switch whose delay has elapsed
    pub fn tick(&mut self, now: Instant) {
        if let Some(pending) = self.pending {
            if now >= pending.commit_at {
                self.active = pending.tab;
                self.pending = None;
            }
        }
        if let Some(t) = self.transition {
            if !t.is_visible(now) {
                self.transition = None;
            }
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active
    }

    pub fn pending_tab(&self) -> Option<Tab> {
        self.pending.map(|p| p.tab)
    }

    pub fn transition(&self, now: Instant) -> Option<TransitionEffect> {
        self.transition.filter(|t| t.is_visible(now))
    }

    /// back to the first tab, keeps a running transition on screen
    pub fn reset(&mut self) {
        self.active = Tab::default();
        self.pending = None;
    }

    /// the one panel to render, nothing until a contract is bound
    pub fn panel<'a, P: ?Sized>(
        &self,
        account: &'a Address,
        contract: Option<&'a ContractBinding<P>>,
    ) -> Option<PanelRequest<'a, P>> {
        contract.map(|contract| PanelRequest {
            tab: self.active,
            account,
            contract,
        })
    }
}
