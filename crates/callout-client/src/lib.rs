//! Client-side message shaping for Callout.
//!
//! The interactive loop itself lives in the binary; this lib holds the two
//! pure pieces worth testing on their own: turning a typed line into an
//! outbound envelope, and turning an inbound envelope into a printed line.

use callout_protocol::{Envelope, Role};

/// The accusation command. Typed by the Privileged player as
/// `/accuse <name>` to end the game.
pub const ACCUSE_COMMAND: &str = "/accuse";

/// Converts one line of player input into the envelope to send.
///
/// Returns `None` for blank lines. A line starting with
/// [`ACCUSE_COMMAND`] becomes a `PlayerDecision` — but only when the local
/// player holds [`Role::Privileged`]; from anyone else the same line is
/// ordinary chat (and the table gets to read it).
pub fn outbound_for_line(role: Role, line: &str) -> Option<Envelope> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if role == Role::Privileged {
        if let Some(rest) = trimmed.strip_prefix(ACCUSE_COMMAND) {
            // Only a real command: "/accuser Bob" is chat, "/accuse" alone
            // has no target to accuse.
            if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
                return Some(Envelope::PlayerDecision {
                    target_name: rest.trim().to_string(),
                });
            }
        }
    }
    Some(Envelope::PlayerChat {
        message: trimmed.to_string(),
    })
}

/// Formats an inbound envelope for the terminal.
///
/// Returns `None` for kinds the server has no business sending — the
/// caller treats that as a protocol violation and disconnects.
pub fn render(envelope: &Envelope) -> Option<String> {
    match envelope {
        Envelope::ServerChat { message, sender } => Some(format!("{sender}: {message}")),
        Envelope::RoleReveal { role } => Some(format!("SERVER: your role is {role}")),
        Envelope::PlayerName { .. }
        | Envelope::PlayerChat { .. }
        | Envelope::PlayerDecision { .. } => None,
    }
}
