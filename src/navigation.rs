//! Navigation bookkeeping: which location is committed, which one is in
//! flight, and which load results are still allowed to land.
//!
//! Every navigation gets a sequence number. Only the newest navigation is
//! ever pending; issuing a new one supersedes whatever was in flight, and a
//! result carrying an older number is stale no matter when it arrives.

use tracing::debug;

use crate::history::History;
use crate::location::Location;

/// How a navigation touches history once it commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    Push,
    Replace,
    /// Back/forward: move the history cursor to `index`.
    Pop { index: usize },
}

/// Handed to the loader; the load result must come back with the same `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTicket {
    pub seq: u64,
    pub location: Location,
}

#[derive(Debug, Clone)]
struct PendingNavigation {
    seq: u64,
    location: Location,
    mode: NavigationMode,
}

/// A completion whose sequence number is not the one currently pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stale {
    pub seq: u64,
    pub latest: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStatus {
    Idle,
    /// In flight to a location carrying `q`
    Searching,
    /// In flight to anywhere else
    LoadingDetail,
}

impl NavigationStatus {
    pub fn derive(pending: Option<&Location>) -> Self {
        match pending {
            None => NavigationStatus::Idle,
            Some(target) if target.has_query() => NavigationStatus::Searching,
            Some(_) => NavigationStatus::LoadingDetail,
        }
    }

    pub fn searching(self) -> bool {
        self == NavigationStatus::Searching
    }

    pub fn loading_detail_pane(self) -> bool {
        self == NavigationStatus::LoadingDetail
    }
}

/// Per-link highlight, in the order a nav link resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Idle,
    Active,
    Pending,
}

#[derive(Debug)]
pub struct Navigator {
    history: History,
    last_issued: u64,
    pending: Option<PendingNavigation>,
}

impl Navigator {
    pub fn new(initial: Location) -> Self {
        Self {
            history: History::new(initial),
            last_issued: 0,
            pending: None,
        }
    }

    /// The committed location.
    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn pending(&self) -> Option<&Location> {
        self.pending.as_ref().map(|p| &p.location)
    }

    pub fn status(&self) -> NavigationStatus {
        NavigationStatus::derive(self.pending())
    }

    pub fn navigate(&mut self, location: Location, mode: NavigationMode) -> NavigationTicket {
        self.last_issued += 1;
        let seq = self.last_issued;
        let next = PendingNavigation {
            seq,
            location: location.clone(),
            mode,
        };
        if let Some(previous) = self.pending.replace(next) {
            debug!(
                superseded = previous.seq,
                by = seq,
                target = %previous.location,
                "navigation superseded"
            );
        }
        debug!(seq, target = %location, ?mode, "navigation submitted");
        NavigationTicket { seq, location }
    }

    pub fn back(&mut self) -> Option<NavigationTicket> {
        let base = self.cursor();
        let index = base.checked_sub(1)?;
        self.pop_to(index)
    }

    pub fn forward(&mut self) -> Option<NavigationTicket> {
        let index = self.cursor() + 1;
        self.pop_to(index)
    }

    /// Commit the pending navigation if `seq` is the one in flight.
    pub fn commit(&mut self, seq: u64) -> Result<&Location, Stale> {
        let pending = self.take_if_latest(seq)?;
        match pending.mode {
            NavigationMode::Push => self.history.push(pending.location),
            NavigationMode::Replace => self.history.replace(pending.location),
            NavigationMode::Pop { index } => {
                if self.history.go_to(index) {
                    self.history.replace(pending.location);
                } else {
                    self.history.push(pending.location);
                }
            }
        }
        debug!(seq, location = %self.history.current(), "navigation committed");
        Ok(self.history.current())
    }

    /// Drop the pending navigation without touching history.
    pub fn abandon(&mut self, seq: u64) -> Result<Location, Stale> {
        let pending = self.take_if_latest(seq)?;
        debug!(seq, target = %pending.location, "navigation abandoned");
        Ok(pending.location)
    }

    pub fn link_state(&self, href: &str) -> LinkState {
        let Ok(target) = Location::parse(href) else {
            return LinkState::Idle;
        };
        if self.location().is_within(target.path()) {
            LinkState::Active
        } else if self
            .pending()
            .is_some_and(|pending| pending.is_within(target.path()))
        {
            LinkState::Pending
        } else {
            LinkState::Idle
        }
    }

    fn take_if_latest(&mut self, seq: u64) -> Result<PendingNavigation, Stale> {
        match self.pending.take() {
            Some(pending) if pending.seq == seq => Ok(pending),
            other => {
                self.pending = other;
                Err(Stale {
                    seq,
                    latest: self.last_issued,
                })
            }
        }
    }

    /// History index back/forward should start from: an in-flight pop's
    /// target, otherwise the committed cursor.
    fn cursor(&self) -> usize {
        match self.pending.as_ref().map(|p| p.mode) {
            Some(NavigationMode::Pop { index }) => index,
            _ => self.history.index(),
        }
    }

    fn pop_to(&mut self, index: usize) -> Option<NavigationTicket> {
        let location = self.history.get(index)?.clone();
        Some(self.navigate(location, NavigationMode::Pop { index }))
    }
}
