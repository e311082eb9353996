//! Why an action or timer did nothing.
//!
//! Clients never see these: an illegal move is dropped without a reply or
//! a broadcast. The reasons exist so tests can assert *why* a move was
//! refused and so the room can log it at debug level.

use cardhall_cards::CardId;

/// A refused action. The game state is untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("no game is running")]
    NotStarted,

    #[error("the game is over")]
    GameOver,

    #[error("player has no seat in this game")]
    NotSeated,

    #[error("action does not belong to this game")]
    WrongVariant,

    #[error("action not allowed in the current phase")]
    WrongPhase,

    #[error("another player must act")]
    NotYourTurn,

    #[error("card {0} is not in hand")]
    CardNotInHand(CardId),

    #[error("the table already holds the maximum number of attacks")]
    TableFull,

    #[error("the table is empty")]
    EmptyTable,

    #[error("card rank is not on the table")]
    RankNotOnTable,

    #[error("no attack at index {0}")]
    NoSuchAttack(usize),

    #[error("attack at index {0} is already beaten")]
    AlreadyDefended(usize),

    #[error("card does not beat the attack")]
    DoesNotBeat,

    #[error("an attack has already been beaten this round")]
    TransferAfterDefense,

    #[error("not enough players for a transfer")]
    TooFewPlayers,

    #[error("the next seat cannot receive the transfer")]
    TransferBlocked,

    #[error("some attacks are still unbeaten")]
    Undefended,

    #[error("player has nothing to discard in this stage")]
    NotPending,

    #[error("timer no longer matches the game state")]
    StaleTimer,

    #[error("no discard deadline has passed")]
    NothingDue,
}

/// A game could not be dealt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("need at least 2 players, got {0}")]
    TooFewPlayers(usize),

    #[error("deck holds {available} cards, need {needed}")]
    DeckTooSmall { needed: usize, available: usize },
}
