//! The roster: every member of one room, in join order.
//!
//! Each member is either connected through a link of type `L` (the room
//! uses an outbound channel; tests use plain values) or disconnected and
//! waiting out a grace period.
//!
//! ```text
//!   join() ──→ Connected ──(detach)──→ Disconnected{serial} ──(expire)──→ removed
//!                  ↑                          │
//!                  └───────(join with id)─────┘
//! ```
//!
//! Every detach hands out a new serial. `expire` only removes the member
//! if that exact grace period is still running, so a late expiry from an
//! earlier disconnect cannot remove a player who came back and left again.

use cardhall_protocol::PlayerId;
use rand::Rng;

use crate::SessionError;

/// Display name for players who join without one.
pub const DEFAULT_NAME: &str = "Player";

// ---------------------------------------------------------------------------
// Member
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence<L> {
    Connected(L),
    /// Inside the reconnection grace period started by detach `serial`.
    Disconnected { serial: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member<L> {
    pub id: PlayerId,
    pub name: String,
    pub presence: Presence<L>,
}

impl<L> Member<L> {
    pub fn is_connected(&self) -> bool {
        matches!(self.presence, Presence::Connected(_))
    }

    pub fn link(&self) -> Option<&L> {
        match &self.presence {
            Presence::Connected(link) => Some(link),
            Presence::Disconnected { .. } => None,
        }
    }
}

/// The outcome of a successful join.
#[derive(Debug)]
pub struct Admission {
    pub player_id: PlayerId,
    pub is_host: bool,
    /// `true` when an existing member was rebound rather than added.
    pub rejoined: bool,
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Roster<L> {
    members: Vec<Member<L>>,
    host: Option<PlayerId>,
    capacity: usize,
    next_serial: u64,
}

impl<L> Roster<L> {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::new(),
            host: None,
            capacity,
            next_serial: 0,
        }
    }

    /// Admits a player through `link`.
    ///
    /// If `reconnect` names a current member, that member is rebound to
    /// `link` (and renamed when `name` is non-empty). This path ignores
    /// capacity since nobody is added. Otherwise a new member is created
    /// with a fresh id, and becomes host if the room has none.
    ///
    /// # Errors
    /// [`SessionError::Full`] when a new member would exceed capacity.
    pub fn join(
        &mut self,
        name: Option<&str>,
        reconnect: Option<&PlayerId>,
        link: L,
    ) -> Result<Admission, SessionError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        if let Some(member) = reconnect.and_then(|id| self.get_mut(id)) {
            if let Some(name) = name {
                member.name = name.to_owned();
            }
            member.presence = Presence::Connected(link);
            let player_id = member.id.clone();
            tracing::info!(%player_id, "member rejoined");
            return Ok(Admission {
                is_host: self.is_host(&player_id),
                player_id,
                rejoined: true,
            });
        }

        if self.members.len() >= self.capacity {
            return Err(SessionError::Full {
                capacity: self.capacity,
            });
        }

        let player_id = loop {
            let candidate = generate_player_id();
            if !self.contains(&candidate) {
                break candidate;
            }
        };
        self.members.push(Member {
            id: player_id.clone(),
            name: name.unwrap_or(DEFAULT_NAME).to_owned(),
            presence: Presence::Connected(link),
        });
        if self.host.is_none() {
            self.host = Some(player_id.clone());
        }

        tracing::info!(%player_id, members = self.members.len(), "member joined");
        Ok(Admission {
            is_host: self.is_host(&player_id),
            player_id,
            rejoined: false,
        })
    }

    /// Marks a member disconnected and starts a grace period.
    ///
    /// `is_current` decides whether the closing connection is still the
    /// member's link. A connection that was already replaced by a rejoin
    /// closes without effect, and `None` is returned.
    pub fn detach(&mut self, id: &PlayerId, is_current: impl FnOnce(&L) -> bool) -> Option<u64> {
        let serial = self.next_serial + 1;
        let member = self.members.iter_mut().find(|m| &m.id == id)?;
        let current = match &member.presence {
            Presence::Connected(link) => is_current(link),
            Presence::Disconnected { .. } => false,
        };
        if !current {
            return None;
        }
        member.presence = Presence::Disconnected { serial };
        self.next_serial = serial;
        tracing::info!(player_id = %id, serial, "member disconnected, grace period started");
        Some(serial)
    }

    /// Ends the grace period `serial` by removing the member.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`]: already gone
    /// - [`SessionError::Reconnected`]: the member is connected again, or
    ///   a later grace period has replaced this one
    pub fn expire(&mut self, id: &PlayerId, serial: u64) -> Result<Member<L>, SessionError> {
        let member = self
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        match member.presence {
            Presence::Disconnected { serial: current } if current == serial => {}
            _ => return Err(SessionError::Reconnected(id.clone())),
        }
        tracing::info!(player_id = %id, "grace period elapsed");
        self.remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Removes a member outright, electing a new host if needed.
    pub fn remove(&mut self, id: &PlayerId) -> Option<Member<L>> {
        let pos = self.members.iter().position(|m| &m.id == id)?;
        let member = self.members.remove(pos);
        if self.host.as_ref() == Some(id) {
            self.host = self.members.first().map(|m| m.id.clone());
            if let Some(host) = &self.host {
                tracing::info!(%host, "host reassigned");
            }
        }
        Some(member)
    }

    pub fn host(&self) -> Option<&PlayerId> {
        self.host.as_ref()
    }

    pub fn is_host(&self, id: &PlayerId) -> bool {
        self.host.as_ref() == Some(id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Member<L>> {
        self.members.iter().find(|m| &m.id == id)
    }

    fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Member<L>> {
        self.members.iter_mut().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Members in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Member<L>> {
        self.members.iter()
    }

    /// Ids in join order.
    pub fn ids(&self) -> Vec<PlayerId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    /// Connected members and their links, in join order.
    pub fn connected(&self) -> impl Iterator<Item = (&PlayerId, &L)> {
        self.members
            .iter()
            .filter_map(|m| m.link().map(|link| (&m.id, link)))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A random 32-character hex id (128 bits).
pub fn generate_player_id() -> PlayerId {
    let bytes: [u8; 16] = rand::rng().random();
    PlayerId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// =========================================================================
// Tests
// =========================================================================
