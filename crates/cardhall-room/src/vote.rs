//! Variant voting.

use std::collections::HashMap;

use cardhall_protocol::{PlayerId, Variant, VoteCounts};

/// Each member's latest vote. Revoting overwrites.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    votes: HashMap<PlayerId, Variant>,
}

impl VoteTally {
    pub fn record(&mut self, player: PlayerId, variant: Variant) {
        self.votes.insert(player, variant);
    }

    pub fn remove(&mut self, player: &PlayerId) {
        self.votes.remove(player);
    }

    pub fn clear(&mut self) {
        self.votes.clear();
    }

    pub fn counts(&self) -> VoteCounts {
        let mut counts = VoteCounts::default();
        for variant in self.votes.values() {
            match variant {
                Variant::Omaha => counts.votes4 += 1,
                Variant::Durak => counts.votes6 += 1,
            }
        }
        counts
    }

    /// The variant holding a strict majority of `occupancy`, or Durak.
    ///
    /// Non-voters count against both options, so in a room of 4 two votes
    /// are not enough.
    pub fn decide(&self, occupancy: usize) -> Variant {
        let needed = occupancy / 2 + 1;
        let counts = self.counts();
        if counts.votes4 >= needed {
            Variant::Omaha
        } else {
            Variant::Durak
        }
    }
}
