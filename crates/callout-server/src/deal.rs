//! The role deck: a one-shot random assignment of the three roles.

use callout_protocol::Role;
use rand::Rng;
use rand::seq::SliceRandom;

/// A shuffled deck holding exactly one of each role.
///
/// Built once per session, when the third player joins. Each draw hands out
/// the next role of a uniformly random permutation, so over a session the
/// deck can neither repeat nor omit a role. Fresh randomness every session;
/// there is deliberately no seeding hook.
#[derive(Debug)]
pub struct RoleDeck {
    cards: Vec<Role>,
}

impl RoleDeck {
    /// Shuffles a fresh deck. All `3! = 6` orderings are equally likely.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = Role::ALL.to_vec();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Draws the next role. `None` once all three are handed out.
    pub fn draw(&mut self) -> Option<Role> {
        self.cards.pop()
    }

    /// Number of roles not yet drawn.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deck_deals_each_role_exactly_once() {
        // Property: whatever the shuffle, three draws yield the full role
        // set with no repeats.
        for _ in 0..200 {
            let mut deck = RoleDeck::shuffled(&mut rand::rng());
            let mut seen = HashSet::new();
            for _ in 0..3 {
                let role = deck.draw().expect("deck holds three roles");
                assert!(seen.insert(role), "role dealt twice");
            }
            assert_eq!(seen.len(), 3);
            assert!(deck.draw().is_none(), "deck must be exhausted");
        }
    }

    #[test]
    fn test_deck_produces_every_permutation() {
        // 500 shuffles missing one of the 6 orderings would be a broken
        // shuffle, not bad luck.
        let mut orderings = HashSet::new();
        for _ in 0..500 {
            let mut deck = RoleDeck::shuffled(&mut rand::rng());
            let order: Vec<Role> =
                std::iter::from_fn(|| deck.draw()).collect();
            orderings.insert(order);
        }
        assert_eq!(orderings.len(), 6, "every permutation should occur");
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut deck = RoleDeck::shuffled(&mut rand::rng());
        assert_eq!(deck.remaining(), 3);
        deck.draw();
        assert_eq!(deck.remaining(), 2);
        deck.draw();
        deck.draw();
        assert_eq!(deck.remaining(), 0);
    }
}
