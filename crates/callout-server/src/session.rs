//! The session coordinator: phase state machine, quorum latch, chat
//! routing, and decision resolution.
//!
//! One [`GameSession`] exists per server process, created at startup and
//! shared by reference among all connection handlers — the explicitly owned
//! replacement for ambient global state. The roster and the phase are the
//! only shared mutable data in the system, and every mutation of either
//! happens under the session's single mutex, so two handlers can never deal
//! roles twice or resolve two decisions.

use std::fmt;

use callout_protocol::{Envelope, PlayerId, Role, SERVER_SENDER};
use tokio::sync::{Mutex, watch};

use crate::deal::RoleDeck;
use crate::error::GameError;
use crate::registry::{Outbound, PlayerRegistry};

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of the one session this server runs.
///
/// Transitions are strictly ordered and one-directional — no phase is
/// re-enterable:
///
/// ```text
/// AwaitingPlayers → Active → Resolved → Closed
/// ```
///
/// - **AwaitingPlayers**: 0–2 players admitted; handlers park on the latch.
/// - **Active**: three players, roles dealt and revealed; chat and the one
///   decision are allowed.
/// - **Resolved**: the decision landed and the outcome was broadcast.
/// - **Closed**: terminal; no further routing of anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    AwaitingPlayers,
    Active,
    Resolved,
    Closed,
}

impl GamePhase {
    /// `true` while new players may still take a seat.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::AwaitingPlayers)
    }

    /// `true` while chat and decisions are processed.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// `true` once the decision has landed — handlers stop reading.
    pub fn is_over(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// The next phase in the strict ordering, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::AwaitingPlayers => Some(Self::Active),
            Self::Active => Some(Self::Resolved),
            Self::Resolved => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// `true` if moving to `target` respects the strict ordering.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingPlayers => write!(f, "AwaitingPlayers"),
            Self::Active => write!(f, "Active"),
            Self::Resolved => write!(f, "Resolved"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// Shared session state for one three-player game.
///
/// The phase lives in a `watch` channel so it doubles as the quorum latch:
/// a handler that subscribes *after* the transition sees the current value
/// immediately, so the release can't be missed — a one-shot latch, not an
/// edge-triggered event. The channel value is only ever written while the
/// registry mutex is held, which linearizes registrations, the deal, and
/// resolution.
pub struct GameSession {
    registry: Mutex<PlayerRegistry>,
    phase: watch::Sender<GamePhase>,
}

impl GameSession {
    /// Creates an empty session awaiting its three players.
    pub fn new() -> Self {
        let (phase, _) = watch::channel(GamePhase::AwaitingPlayers);
        Self {
            registry: Mutex::new(PlayerRegistry::new()),
            phase,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> GamePhase {
        *self.phase.borrow()
    }

    /// A receiver for phase changes; used by handlers to notice resolution.
    pub fn subscribe_phase(&self) -> watch::Receiver<GamePhase> {
        self.phase.subscribe()
    }

    /// Admits a player into the roster.
    ///
    /// The third successful admission performs the role deal, queues every
    /// player's `RoleReveal`, and releases the quorum latch — all in one
    /// critical section. Outboxes are FIFO, so each player's reveal is
    /// ordered ahead of any chat that follows activation.
    ///
    /// # Errors
    /// Returns [`GameError::RegistryFull`] when the roster is full or the
    /// session has already left the lobby.
    pub async fn admit(
        &self,
        name: String,
        outbound: Outbound,
    ) -> Result<PlayerId, GameError> {
        let mut registry = self.registry.lock().await;
        if !self.phase().is_joinable() {
            return Err(GameError::RegistryFull);
        }
        let id = registry.register(name, outbound)?;
        tracing::info!(player_id = %id, players = registry.len(), "player admitted");

        if registry.is_full() {
            let deck = RoleDeck::shuffled(&mut rand::rng());
            registry.assign_roles(deck)?;
            for entry in registry.players() {
                // Safe: assign_roles just dealt every seat.
                let role = entry.role().expect("roles were just dealt");
                registry.send_to(entry.id, Envelope::RoleReveal { role });
            }
            self.advance(GamePhase::Active);
            tracing::info!("three players joined, session is active");
        }
        Ok(id)
    }

    /// Parks until the session leaves the lobby. Safe to call before or
    /// after the transition; a late waiter returns immediately.
    pub async fn wait_until_active(&self) {
        let mut rx = self.phase.subscribe();
        // Only fails if the sender is dropped, and `self` owns the sender.
        let _ = rx.wait_for(|phase| !phase.is_joinable()).await;
    }

    /// Relays a chat line from `sender` to the other two players.
    ///
    /// # Errors
    /// Returns [`GameError::InvalidPhase`] outside the `Active` phase.
    pub async fn chat(&self, sender: PlayerId, message: String) -> Result<(), GameError> {
        let registry = self.registry.lock().await;
        let phase = self.phase();
        if !phase.is_active() {
            return Err(GameError::InvalidPhase { action: "chat", phase });
        }
        // Safe: chat is only dispatched for admitted players.
        let entry = registry.entry(sender).expect("chat sender is registered");
        let relayed = Envelope::ServerChat {
            message,
            sender: entry.name.clone(),
        };
        registry.broadcast(&relayed, Some(sender));
        Ok(())
    }

    /// Resolves the game from an accusation by `sender`.
    ///
    /// On success the session is `Resolved`, the announcement and the
    /// outcome have been queued to every connected player, and the session
    /// is then `Closed`. The outcome is deliberately two-way: the accused
    /// holding [`Role::Target`] is a shared win for Privileged and Target;
    /// naming anyone else hands the win to Neutral.
    ///
    /// # Errors
    /// - [`GameError::InvalidPhase`] outside `Active` (nothing is mutated).
    /// - [`GameError::Forbidden`] if `sender` doesn't hold `Privileged`.
    /// - [`GameError::InvalidTarget`] for an unknown name or self-accusal.
    pub async fn resolve(
        &self,
        sender: PlayerId,
        target_name: &str,
    ) -> Result<(), GameError> {
        let registry = self.registry.lock().await;
        let phase = self.phase();
        if !phase.is_active() {
            return Err(GameError::InvalidPhase {
                action: "a decision",
                phase,
            });
        }
        // Safe: decisions are only dispatched for admitted players.
        let accuser = registry.entry(sender).expect("decision sender is registered");
        if accuser.role() != Some(Role::Privileged) {
            return Err(GameError::Forbidden(sender));
        }
        let accused = registry
            .find_by_name(target_name)
            .ok_or_else(|| GameError::InvalidTarget(target_name.to_string()))?;
        if accused.id == sender {
            return Err(GameError::InvalidTarget(target_name.to_string()));
        }
        // Safe: the session is Active, so every seat has a role.
        let accused_role = accused.role().expect("roles dealt before activation");
        let accuser_name = accuser.name.clone();
        let accused_name = accused.name.clone();

        self.advance(GamePhase::Resolved);
        tracing::info!(
            accuser = %accuser_name,
            accused = %accused_name,
            correct = accused_role == Role::Target,
            "decision made, session resolved"
        );

        registry.broadcast(
            &server_chat(format!("{accuser_name} has accused {accused_name}!")),
            None,
        );
        let outcome = if accused_role == Role::Target {
            "The Privileged and the Target win!"
        } else {
            "The Neutral wins!"
        };
        registry.broadcast(&server_chat(outcome.to_string()), None);

        self.advance(GamePhase::Closed);
        Ok(())
    }

    /// Sends a server-originated chat line to one player only. Used for
    /// polite rejections that keep the connection open.
    pub async fn notify(&self, id: PlayerId, message: String) {
        let registry = self.registry.lock().await;
        registry.send_to(id, server_chat(message));
    }

    /// Releases a player's outbox after their connection died, so future
    /// broadcasts skip the dead connection instead of erroring on it.
    pub async fn mark_disconnected(&self, id: PlayerId) {
        let mut registry = self.registry.lock().await;
        registry.mark_disconnected(id);
        tracing::info!(player_id = %id, "player connection released");
    }

    /// The dealt role of a player, if any.
    pub async fn role_of(&self, id: PlayerId) -> Option<Role> {
        let registry = self.registry.lock().await;
        registry.entry(id).and_then(|p| p.role())
    }

    /// The display name of the player holding `role`.
    ///
    /// # Errors
    /// Returns [`GameError::RoleNotAssigned`] before the deal.
    pub async fn holder_of(&self, role: Role) -> Result<String, GameError> {
        let registry = self.registry.lock().await;
        registry.find_by_role(role).map(|p| p.name.clone())
    }

    /// Advances the phase. Callers hold the registry lock; the watch
    /// channel is only the waiting side of the latch.
    fn advance(&self, next: GamePhase) {
        let current = *self.phase.borrow();
        debug_assert!(
            current.can_transition_to(next),
            "phase cannot move {current} -> {next}"
        );
        self.phase.send_replace(next);
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

fn server_chat(message: String) -> Envelope {
    Envelope::ServerChat {
        message,
        sender: SERVER_SENDER.to_string(),
    }
}

// =========================================================================
// Tests
// =========================================================================
