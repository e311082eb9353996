//! Five-card hand evaluation.
//!
//! Every hand is reduced to a [`HandScore`]: a category plus a list of
//! tiebreak ranks. Scores compare lexicographically (category first, then
//! tiebreaks in order), so `Ord` on `HandScore` is exactly "which hand wins".
//!
//! ```text
//! straight flush  [high]            full house  [trips, pair]
//! four of a kind  [quad, kicker]    two pair    [high pair, low pair, kicker]
//! flush           [r1..r5]          one pair    [pair, k1, k2, k3]
//! straight        [high]            high card   [r1..r5]
//! three of a kind [trips, k1, k2]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Card, ACE};

/// The category ladder, weakest first so the derived `Ord` matches strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        f.write_str(name)
    }
}

/// A comparable hand strength.
///
/// Field order matters: the derived `Ord` compares `category` before
/// `tiebreaks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandScore {
    pub category: HandCategory,
    pub tiebreaks: Vec<u8>,
}

/// Scores exactly five cards.
pub fn score_five(cards: &[Card; 5]) -> HandScore {
    let mut ranks: Vec<u8> = cards.iter().map(|c| c.rank).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let flush = cards.iter().all(|c| c.suit == cards[0].suit);
    let straight_high = straight_high(&ranks);

    // (count, rank) groups, biggest group first, then highest rank.
    let mut groups: Vec<(usize, u8)> = Vec::with_capacity(5);
    for &rank in &ranks {
        match groups.iter_mut().find(|(_, r)| *r == rank) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, rank)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<u8> = groups.iter().map(|&(_, r)| r).collect();

    let (category, tiebreaks) = match (straight_high, flush, groups[0].0, groups.get(1).map(|g| g.0)) {
        (Some(high), true, _, _) => (HandCategory::StraightFlush, vec![high]),
        (_, _, 4, _) => (HandCategory::FourOfAKind, grouped),
        (_, _, 3, Some(2)) => (HandCategory::FullHouse, grouped),
        (_, true, _, _) => (HandCategory::Flush, ranks),
        (Some(high), false, _, _) => (HandCategory::Straight, vec![high]),
        (_, _, 3, _) => (HandCategory::ThreeOfAKind, grouped),
        (_, _, 2, Some(2)) => (HandCategory::TwoPair, grouped),
        (_, _, 2, _) => (HandCategory::OnePair, grouped),
        _ => (HandCategory::HighCard, ranks),
    };

    HandScore {
        category,
        tiebreaks,
    }
}

/// High card of a straight over descending `ranks`, or `None`.
/// The wheel (A-2-3-4-5) counts as five-high.
fn straight_high(ranks: &[u8]) -> Option<u8> {
    let distinct = ranks.windows(2).all(|w| w[0] != w[1]);
    if !distinct || ranks.len() != 5 {
        return None;
    }
    if ranks[0] - ranks[4] == 4 {
        return Some(ranks[0]);
    }
    if ranks == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

/// All `k`-element subsets of `items`, preserving input order.
pub fn combinations<T: Copy>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k > items.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i]).collect());

        // Advance the rightmost index that still has room.
        let Some(pos) = (0..k).rev().find(|&p| idx[p] < items.len() - k + p) else {
            return out;
        };
        idx[pos] += 1;
        for p in pos + 1..k {
            idx[p] = idx[p - 1] + 1;
        }
    }
}

/// Best score over every five-card hand built from 0, 1, or 2 `hole` cards
/// plus the complement from `board`.
///
/// Returns `None` when no five-card hand can be formed.
pub fn best_hand(hole: &[Card], board: &[Card]) -> Option<HandScore> {
    let mut best: Option<HandScore> = None;
    for from_hole in 0..=2usize.min(hole.len()) {
        let from_board = 5 - from_hole;
        if board.len() < from_board {
            continue;
        }
        for hole_part in combinations(hole, from_hole) {
            for board_part in combinations(board, from_board) {
                let cards: Vec<Card> = hole_part.iter().chain(&board_part).copied().collect();
                let Ok(five) = <[Card; 5]>::try_from(cards) else {
                    continue;
                };
                let score = score_five(&five);
                if best.as_ref().is_none_or(|b| score > *b) {
                    best = Some(score);
                }
            }
        }
    }
    best
}
