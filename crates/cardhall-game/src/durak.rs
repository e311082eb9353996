//! Durak: the trick-taking elimination game (vote value `"6"`).
//!
//! A round cycles between two phases:
//!
//! ```text
//!            PLAY_ATTACK / TRANSFER
//!   attack ─────────────────────────▶ defend
//!     ▲  │                              │
//!     │  │ END_ATTACK       PLAY_DEFENSE│ (all pairs beaten)
//!     │  ▼                              ▼
//!   round end ◀──── TAKE_CARDS ──── defend/attack
//! ```
//!
//! Round end refills hands, drops players who ran out, and either starts
//! the next round in `attack` or finishes the game in `complete`.

use cardhall_cards::{Card, CardId, Deck, Suit};
use cardhall_protocol::{
    DurakPhase, DurakView, GameAction, GameView, HandView, PlayerId, TablePair, Variant,
};
use rand::Rng;

use crate::engine::{deal, Seat};
use crate::{
    Engine, EngineConfig, Rejection, SetupError, TimerFired, TimerRequest, TimerTicket,
};

/// Cards each player is dealt and refilled to.
pub const HAND_SIZE: usize = 6;

/// Most attacks that can be open in a round.
pub const MAX_ATTACKS: usize = 6;

/// Attack cap once the attack has been transferred.
pub const MAX_ATTACKS_AFTER_TRANSFER: usize = 5;

/// Full state of one Durak game.
#[derive(Debug, Clone)]
pub struct DurakGame {
    serial: u64,
    config: EngineConfig,
    trump_card: Card,
    deck: Deck,
    /// Players still in the game, in seat order.
    seats: Vec<Seat>,
    table: Vec<TablePair>,
    discard: Vec<Card>,
    attacker: usize,
    defender: usize,
    phase: DurakPhase,
    max_attacks: usize,
    transfer_occurred: bool,
    loser: Option<PlayerId>,
    turn: Option<PlayerId>,
    turn_deadline: Option<u64>,
    epoch: u64,
}

impl DurakGame {
    /// Shuffles a fresh deck and deals.
    pub fn new<R: Rng + ?Sized>(
        serial: u64,
        players: &[PlayerId],
        config: EngineConfig,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        Self::with_deck(serial, players, Deck::shuffled(rng), config, now_ms)
    }

    /// Deals from `deck` as given, top card first.
    ///
    /// The trump is the suit of the bottom card. Seat 0 attacks first and
    /// seat 1 defends.
    pub fn with_deck(
        serial: u64,
        players: &[PlayerId],
        mut deck: Deck,
        config: EngineConfig,
        now_ms: u64,
    ) -> Result<Self, SetupError> {
        if players.len() < 2 {
            return Err(SetupError::TooFewPlayers(players.len()));
        }
        let trump_card = *deck.bottom().ok_or(SetupError::DeckTooSmall {
            needed: 1,
            available: 0,
        })?;
        let seats = deal(players, &mut deck, HAND_SIZE);

        let mut game = Self {
            serial,
            config,
            trump_card,
            deck,
            seats,
            table: Vec::new(),
            discard: Vec::new(),
            attacker: 0,
            defender: 1,
            phase: DurakPhase::Attack,
            max_attacks: 0,
            transfer_occurred: false,
            loser: None,
            turn: None,
            turn_deadline: None,
            epoch: 0,
        };
        game.max_attacks = game.seats[game.defender].hand.len().min(MAX_ATTACKS);
        game.sort_hands();
        game.arm_turn(now_ms);

        tracing::debug!(
            game = serial,
            players = players.len(),
            trump = %trump_card.suit,
            "durak dealt"
        );
        Ok(game)
    }

    // -- accessors ---------------------------------------------------------

    pub fn phase(&self) -> DurakPhase {
        self.phase
    }

    pub fn trump(&self) -> Suit {
        self.trump_card.suit
    }

    pub fn trump_card(&self) -> Card {
        self.trump_card
    }

    pub fn attacker_id(&self) -> Option<&PlayerId> {
        self.active_seat(self.attacker)
    }

    pub fn defender_id(&self) -> Option<&PlayerId> {
        self.active_seat(self.defender)
    }

    /// Players still holding a seat, in order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.seats.iter().map(|s| &s.player)
    }

    pub fn hand(&self, player: &PlayerId) -> Option<&[Card]> {
        self.seats
            .iter()
            .find(|s| &s.player == player)
            .map(|s| s.hand.as_slice())
    }

    pub fn table(&self) -> &[TablePair] {
        &self.table
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn discard_len(&self) -> usize {
        self.discard.len()
    }

    pub fn max_attacks(&self) -> usize {
        self.max_attacks
    }

    pub fn transfer_occurred(&self) -> bool {
        self.transfer_occurred
    }

    pub fn loser(&self) -> Option<&PlayerId> {
        self.loser.as_ref()
    }

    pub fn turn(&self) -> Option<&PlayerId> {
        self.turn.as_ref()
    }

    pub fn turn_deadline(&self) -> Option<u64> {
        self.turn_deadline
    }

    /// Whether `defense` beats `attack` under this game's trump.
    pub fn beats(&self, attack: &Card, defense: &Card) -> bool {
        beats(self.trump(), attack, defense)
    }

    // -- actions -----------------------------------------------------------

    fn play_attack(&mut self, seat: usize, card_id: CardId, now_ms: u64) -> Result<(), Rejection> {
        if self.phase != DurakPhase::Attack {
            return Err(Rejection::WrongPhase);
        }
        if seat == self.defender {
            return Err(Rejection::NotYourTurn);
        }
        // Only the attacker may lead; others may only pile on.
        if seat != self.attacker && self.table.is_empty() {
            return Err(Rejection::NotYourTurn);
        }
        if self.table.len() >= self.max_attacks {
            return Err(Rejection::TableFull);
        }
        let card = self.seats[seat].peek(card_id)?;
        if !self.table.is_empty() && !self.ranks_on_table().any(|r| r == card.rank) {
            return Err(Rejection::RankNotOnTable);
        }

        self.seats[seat].take(card_id)?;
        self.table.push(TablePair::open(card));
        self.phase = DurakPhase::Defend;
        self.arm_turn(now_ms);
        Ok(())
    }

    fn play_defense(
        &mut self,
        seat: usize,
        card_id: CardId,
        attack_index: usize,
        now_ms: u64,
    ) -> Result<(), Rejection> {
        if seat != self.defender {
            return Err(Rejection::NotYourTurn);
        }
        if self.phase != DurakPhase::Defend {
            return Err(Rejection::WrongPhase);
        }
        let card = self.seats[seat].peek(card_id)?;
        let target = self
            .table
            .get(attack_index)
            .ok_or(Rejection::NoSuchAttack(attack_index))?;
        if target.is_defended() {
            return Err(Rejection::AlreadyDefended(attack_index));
        }
        if !self.beats(&target.attack, &card) {
            return Err(Rejection::DoesNotBeat);
        }

        self.seats[seat].take(card_id)?;
        self.table[attack_index].defense = Some(card);
        if self.table.iter().all(TablePair::is_defended) {
            self.phase = DurakPhase::Attack;
            self.arm_turn(now_ms);
        }
        Ok(())
    }

    fn transfer(&mut self, seat: usize, card_id: CardId, now_ms: u64) -> Result<(), Rejection> {
        if seat != self.defender {
            return Err(Rejection::NotYourTurn);
        }
        if self.phase != DurakPhase::Defend {
            return Err(Rejection::WrongPhase);
        }
        if self.table.iter().any(TablePair::is_defended) {
            return Err(Rejection::TransferAfterDefense);
        }
        if self.seats.len() <= 2 {
            return Err(Rejection::TooFewPlayers);
        }
        let card = self.seats[seat].peek(card_id)?;
        if !self.table.iter().any(|p| p.attack.rank == card.rank) {
            return Err(Rejection::RankNotOnTable);
        }
        let next = (self.defender + 1) % self.seats.len();
        if next == self.attacker || self.seats[next].hand.is_empty() {
            return Err(Rejection::TransferBlocked);
        }

        self.seats[seat].take(card_id)?;
        self.table.push(TablePair::open(card));
        self.defender = next;
        self.transfer_occurred = true;
        self.max_attacks = self.max_attacks.min(MAX_ATTACKS_AFTER_TRANSFER);
        self.phase = DurakPhase::Defend;
        self.arm_turn(now_ms);
        Ok(())
    }

    fn end_attack(&mut self, seat: usize, now_ms: u64) -> Result<(), Rejection> {
        if seat != self.attacker {
            return Err(Rejection::NotYourTurn);
        }
        if self.table.is_empty() {
            return Err(Rejection::EmptyTable);
        }
        if !self.table.iter().all(TablePair::is_defended) {
            return Err(Rejection::Undefended);
        }
        self.end_round(false, now_ms);
        Ok(())
    }

    fn take_cards(&mut self, seat: usize, now_ms: u64) -> Result<(), Rejection> {
        if seat != self.defender {
            return Err(Rejection::NotYourTurn);
        }
        if self.table.is_empty() {
            return Err(Rejection::EmptyTable);
        }
        self.end_round(true, now_ms);
        Ok(())
    }

    // -- round resolution --------------------------------------------------

    fn end_round(&mut self, defender_takes: bool, now_ms: u64) {
        let n = self.seats.len();
        let old_attacker = self.attacker;
        let old_defender = self.defender;

        let cards = self
            .table
            .drain(..)
            .flat_map(|pair| std::iter::once(pair.attack).chain(pair.defense));
        if defender_takes {
            self.seats[old_defender].hand.extend(cards);
        } else {
            self.discard.extend(cards);
        }

        // Refill from the old attacker round the table; the defender draws last.
        let draw_order = (0..n)
            .map(|k| (old_attacker + k) % n)
            .filter(|&i| i != old_defender)
            .chain(std::iter::once(old_defender));
        for i in draw_order {
            while self.seats[i].hand.len() < HAND_SIZE {
                match self.deck.draw() {
                    Some(card) => self.seats[i].hand.push(card),
                    None => break,
                }
            }
        }

        self.phase = DurakPhase::Attack;
        self.transfer_occurred = false;
        self.sort_hands();

        // A defender who took is skipped: the lead passes to the next seat
        // still holding cards. A defender who beat the attack leads next,
        // unless they went out, in which case the first surviving seat leads.
        let next_attacker = if defender_takes {
            (1..n)
                .map(|k| (old_defender + k) % n)
                .find(|&i| !self.seats[i].hand.is_empty())
                .map(|i| self.seats[i].player.clone())
        } else if !self.seats[old_defender].hand.is_empty() {
            Some(self.seats[old_defender].player.clone())
        } else {
            None
        };

        let before = self.seats.len();
        self.seats.retain(|s| !s.hand.is_empty());
        if self.seats.len() < before {
            tracing::debug!(game = self.serial, out = before - self.seats.len(), "players out");
        }

        if self.seats.len() <= 1 {
            self.phase = DurakPhase::Complete;
            self.loser = self.seats.first().map(|s| s.player.clone());
            self.turn = None;
            self.turn_deadline = None;
            self.epoch += 1;
            tracing::debug!(game = self.serial, loser = ?self.loser, "durak complete");
            return;
        }

        self.attacker = next_attacker
            .and_then(|id| self.seats.iter().position(|s| s.player == id))
            .unwrap_or(0);
        self.defender = (self.attacker + 1) % self.seats.len();
        self.max_attacks = self.seats[self.defender].hand.len().min(MAX_ATTACKS);
        self.arm_turn(now_ms);
    }

    // -- helpers -----------------------------------------------------------

    fn seat_of(&self, player: &PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| &s.player == player)
    }

    fn active_seat(&self, index: usize) -> Option<&PlayerId> {
        if self.phase == DurakPhase::Complete {
            return None;
        }
        self.seats.get(index).map(|s| &s.player)
    }

    fn ranks_on_table(&self) -> impl Iterator<Item = u8> + '_ {
        self.table
            .iter()
            .flat_map(|p| std::iter::once(p.attack).chain(p.defense))
            .map(|c| c.rank)
    }

    /// Non-trumps by suit then rank, trumps last.
    fn sort_hands(&mut self) {
        let trump = self.trump();
        for seat in &mut self.seats {
            seat.hand
                .sort_by_key(|c| (c.suit == trump, c.suit.index(), c.rank));
        }
    }

    /// Starts the clock on whoever must act in the current phase.
    fn arm_turn(&mut self, now_ms: u64) {
        let on_turn = match self.phase {
            DurakPhase::Defend => self.defender,
            _ => self.attacker,
        };
        self.turn = self.seats.get(on_turn).map(|s| s.player.clone());
        self.turn_deadline = Some(now_ms + self.config.turn_timeout_ms);
        self.epoch += 1;
    }

    fn ticket(&self) -> TimerTicket {
        TimerTicket {
            game: self.serial,
            epoch: self.epoch,
        }
    }
}

/// Same suit and higher, or trump over non-trump. Trump on trump needs rank.
pub fn beats(trump: Suit, attack: &Card, defense: &Card) -> bool {
    if defense.suit == attack.suit {
        return defense.rank > attack.rank;
    }
    defense.suit == trump
}

impl Engine for DurakGame {
    fn apply<R: Rng + ?Sized>(
        &mut self,
        player: &PlayerId,
        action: &GameAction,
        now_ms: u64,
        _rng: &mut R,
    ) -> Result<(), Rejection> {
        if self.phase == DurakPhase::Complete {
            return Err(Rejection::GameOver);
        }
        let seat = self.seat_of(player).ok_or(Rejection::NotSeated)?;
        match *action {
            GameAction::PlayAttack { card_id } => self.play_attack(seat, card_id, now_ms),
            GameAction::PlayDefense {
                card_id,
                attack_index,
            } => self.play_defense(seat, card_id, attack_index, now_ms),
            GameAction::Transfer { card_id } => self.transfer(seat, card_id, now_ms),
            GameAction::EndAttack => self.end_attack(seat, now_ms),
            GameAction::TakeCards => self.take_cards(seat, now_ms),
            GameAction::Discard { .. } => Err(Rejection::WrongVariant),
        }
    }

    fn timer(&self) -> TimerRequest {
        match (self.phase, self.turn_deadline) {
            (DurakPhase::Complete, _) | (_, None) => TimerRequest::Idle,
            (_, Some(at_ms)) => TimerRequest::Alarm {
                at_ms,
                ticket: self.ticket(),
            },
        }
    }

    /// A turn timeout while defending takes the table; while attacking over
    /// a fully beaten table it ends the attack. Otherwise the clock simply
    /// stops until the next move.
    fn on_timer<R: Rng + ?Sized>(
        &mut self,
        fired: TimerFired,
        now_ms: u64,
        _rng: &mut R,
    ) -> Result<(), Rejection> {
        let TimerFired::Alarm(ticket) = fired else {
            return Err(Rejection::StaleTimer);
        };
        if ticket != self.ticket() || self.turn_deadline.is_none() {
            return Err(Rejection::StaleTimer);
        }
        match self.phase {
            DurakPhase::Complete => Err(Rejection::GameOver),
            DurakPhase::Defend => {
                self.end_round(true, now_ms);
                Ok(())
            }
            DurakPhase::Attack
                if !self.table.is_empty() && self.table.iter().all(TablePair::is_defended) =>
            {
                self.end_round(false, now_ms);
                Ok(())
            }
            DurakPhase::Attack => {
                self.turn_deadline = None;
                self.epoch += 1;
                Ok(())
            }
        }
    }

    fn view(&self, viewer: &PlayerId) -> GameView {
        GameView::Durak(DurakView {
            mode: Variant::Durak,
            phase: self.phase,
            attacker_id: self.attacker_id().cloned(),
            defender_id: self.defender_id().cloned(),
            trump_suit: self.trump(),
            trump_card: self.trump_card,
            deck_count: self.deck.len(),
            discard_count: self.discard.len(),
            table: self.table.clone(),
            hands: self
                .seats
                .iter()
                .map(|s| HandView::redacted(&s.player, &s.hand, viewer))
                .collect(),
            transfer_occurred: self.transfer_occurred,
            max_attacks: self.max_attacks,
            durak_loser_id: self.loser.clone(),
            turn: self.turn.clone(),
            turn_deadline: self.turn_deadline,
        })
    }

    fn is_finished(&self) -> bool {
        self.phase == DurakPhase::Complete
    }

    fn census(&self) -> Vec<CardId> {
        self.deck
            .iter()
            .chain(self.seats.iter().flat_map(|s| s.hand.iter()))
            .chain(
                self.table
                    .iter()
                    .flat_map(|p| std::iter::once(&p.attack).chain(p.defense.as_ref())),
            )
            .chain(self.discard.iter())
            .map(|c| c.id)
            .collect()
    }
}
