//! The player roster: who is in the session, their roles, their outboxes.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is NOT thread-safe by itself — it's a plain `Vec` with
//! no interior locking. The [`GameSession`](crate::session::GameSession)
//! owns the only instance behind a mutex, and every mutation (register,
//! deal, disconnect) goes through that one lock. Keeping the registry
//! simple here keeps the locking discipline visible in one place.

use callout_protocol::{Envelope, PlayerId, Role};
use tokio::sync::mpsc;

use crate::deal::RoleDeck;
use crate::error::GameError;

/// Fixed session size: the game is defined for exactly three players.
pub const SESSION_SIZE: usize = 3;

/// Sending side of a player's outbox. The per-connection writer task owns
/// the receiving side and drains it to the socket.
pub type Outbound = mpsc::UnboundedSender<Envelope>;

/// One admitted player.
///
/// Entries are append-only: a player who disconnects keeps their seat, name
/// and dealt role (the resolver still needs them), but loses their outbox
/// so broadcasts stop trying to reach a dead connection.
#[derive(Debug)]
pub struct PlayerEntry {
    pub id: PlayerId,
    pub name: String,
    role: Option<Role>,
    outbound: Option<Outbound>,
}

impl PlayerEntry {
    /// The player's dealt role; `None` until the deal.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// `true` while the player's connection is alive.
    pub fn is_connected(&self) -> bool {
        self.outbound.is_some()
    }
}

/// Roster of at most [`SESSION_SIZE`] players.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<PlayerEntry>,
    next_id: u64,
    dealt: bool,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of admitted players (connected or not).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// `true` once all three seats are taken.
    pub fn is_full(&self) -> bool {
        self.players.len() >= SESSION_SIZE
    }

    /// Admits a player if a seat is free.
    ///
    /// Display names are taken as given — uniqueness is the players'
    /// problem, per the game's rules.
    ///
    /// # Errors
    /// Returns [`GameError::RegistryFull`] when all seats are taken; the
    /// caller is expected to close the rejected connection, not retry.
    pub fn register(
        &mut self,
        name: String,
        outbound: Outbound,
    ) -> Result<PlayerId, GameError> {
        if self.is_full() {
            return Err(GameError::RegistryFull);
        }
        self.next_id += 1;
        let id = PlayerId(self.next_id);
        self.players.push(PlayerEntry {
            id,
            name,
            role: None,
            outbound: Some(outbound),
        });
        Ok(id)
    }

    /// Deals one role from the deck to each seat, exactly once per session.
    ///
    /// # Errors
    /// Returns [`GameError::AlreadyDealt`] on a second call.
    pub fn assign_roles(&mut self, mut deck: RoleDeck) -> Result<(), GameError> {
        if self.dealt {
            return Err(GameError::AlreadyDealt);
        }
        debug_assert_eq!(self.players.len(), SESSION_SIZE, "deal requires a full roster");
        for entry in &mut self.players {
            // Safe: the deck holds one role per seat and we deal only once.
            entry.role = Some(deck.draw().expect("deck holds one role per seat"));
        }
        self.dealt = true;
        Ok(())
    }

    /// Looks up a player by id.
    pub fn entry(&self, id: PlayerId) -> Option<&PlayerEntry> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Looks up a player by display name (first match wins).
    pub fn find_by_name(&self, name: &str) -> Option<&PlayerEntry> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Looks up the player holding `role`.
    ///
    /// # Errors
    /// Returns [`GameError::RoleNotAssigned`] before the deal.
    pub fn find_by_role(&self, role: Role) -> Result<&PlayerEntry, GameError> {
        self.players
            .iter()
            .find(|p| p.role == Some(role))
            .ok_or(GameError::RoleNotAssigned(role))
    }

    /// Iterates over all admitted players.
    pub fn players(&self) -> impl Iterator<Item = &PlayerEntry> {
        self.players.iter()
    }

    /// Queues `envelope` to every connected player except `exclude`.
    ///
    /// A dead outbox is logged and skipped; one lost recipient never aborts
    /// delivery to the rest.
    pub fn broadcast(&self, envelope: &Envelope, exclude: Option<PlayerId>) {
        for entry in &self.players {
            if Some(entry.id) == exclude {
                continue;
            }
            self.deliver(entry, envelope.clone());
        }
    }

    /// Queues `envelope` to a single player. A missing or disconnected
    /// player is a silent no-op (they're simply gone).
    pub fn send_to(&self, id: PlayerId, envelope: Envelope) {
        if let Some(entry) = self.entry(id) {
            self.deliver(entry, envelope);
        }
    }

    fn deliver(&self, entry: &PlayerEntry, envelope: Envelope) {
        let Some(outbound) = &entry.outbound else {
            return;
        };
        if outbound.send(envelope).is_err() {
            tracing::debug!(
                player_id = %entry.id,
                player = %entry.name,
                "dropped message to dead connection"
            );
        }
    }

    /// Drops the player's outbox so future broadcasts skip them.
    /// The seat, name, and role stay — roles are never reassigned.
    pub fn mark_disconnected(&mut self, id: PlayerId) {
        if let Some(entry) = self.players.iter_mut().find(|p| p.id == id) {
            entry.outbound = None;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
