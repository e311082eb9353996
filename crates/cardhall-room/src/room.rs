//! Room actor: an isolated Tokio task that owns one room.
//!
//! Everything that can change a room arrives as a [`RoomCommand`] on the
//! actor's channel or as a timer wake-up inside the same `select!` loop,
//! so mutations are applied one at a time and in order. After every
//! successful mutation the actor re-derives its timers from the game and
//! sends each connected member their own snapshot.

use std::collections::HashMap;

use cardhall_game::{GameState, TimerFired, TimerTicket};
use cardhall_protocol::{
    GameAction, JoinRequest, PlayerId, PlayerSummary, RoomCode, RoomSnapshot, ServerMessage,
    Variant,
};
use cardhall_session::{Roster, SessionError};
use cardhall_tick::{Alarm, RoomClock, TickConfig, TickScheduler};
use cardhall_transport::ConnectionId;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{RoomConfig, RoomError, VoteTally};

/// Channel for delivering outbound messages to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// A member's live connection: its id and its outbound channel.
#[derive(Debug, Clone)]
pub struct Link {
    pub conn: ConnectionId,
    pub sender: PlayerSender,
}

impl Link {
    pub fn new(conn: ConnectionId, sender: PlayerSender) -> Self {
        Self { conn, sender }
    }

    /// Drops the message if the connection is already gone.
    fn send(&self, msg: ServerMessage) {
        let _ = self.sender.send(msg);
    }
}

/// What a successful join tells the connection handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub player_id: PlayerId,
    pub is_host: bool,
}

/// Room metadata, for the registry and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub host: Option<PlayerId>,
    /// Join order.
    pub members: Vec<PlayerId>,
    pub connected: usize,
    pub variant: Option<Variant>,
    pub finished: bool,
    /// Card ids the running game holds; empty when unstarted.
    pub card_count: usize,
}

pub(crate) enum RoomCommand {
    Join {
        request: JoinRequest,
        link: Link,
        reply: oneshot::Sender<Result<Joined, RoomError>>,
    },
    /// A connection closed. Ignored unless it is the member's current one.
    Disconnect {
        player_id: PlayerId,
        conn: ConnectionId,
    },
    /// Posted by the grace task `serial` when its sleep ends.
    GraceExpired {
        player_id: PlayerId,
        serial: u64,
    },
    /// A post-join message. Ignored unless `conn` is the member's current
    /// connection.
    Member {
        player_id: PlayerId,
        conn: ConnectionId,
        request: MemberRequest,
    },
    Inspect {
        reply: oneshot::Sender<RoomInfo>,
    },
}

pub(crate) enum MemberRequest {
    Vote { mode: String },
    Start,
    Restart,
    Emoji { emoji_code: String },
    Action(GameAction),
}

// ---------------------------------------------------------------------------
// RoomHandle
// ---------------------------------------------------------------------------

/// Handle to a running room actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Admits a connection. On success the connection has already been
    /// sent `PLAYER_JOINED` followed by its `ROOM_UPDATE`.
    pub async fn join(&self, request: JoinRequest, link: Link) -> Result<Joined, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            request,
            link,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn disconnect(&self, player_id: PlayerId, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { player_id, conn }).await
    }

    pub async fn vote(
        &self,
        player_id: PlayerId,
        conn: ConnectionId,
        mode: String,
    ) -> Result<(), RoomError> {
        self.member(player_id, conn, MemberRequest::Vote { mode }).await
    }

    pub async fn start(&self, player_id: PlayerId, conn: ConnectionId) -> Result<(), RoomError> {
        self.member(player_id, conn, MemberRequest::Start).await
    }

    pub async fn restart(&self, player_id: PlayerId, conn: ConnectionId) -> Result<(), RoomError> {
        self.member(player_id, conn, MemberRequest::Restart).await
    }

    pub async fn emoji(
        &self,
        player_id: PlayerId,
        conn: ConnectionId,
        emoji_code: String,
    ) -> Result<(), RoomError> {
        self.member(player_id, conn, MemberRequest::Emoji { emoji_code })
            .await
    }

    pub async fn action(
        &self,
        player_id: PlayerId,
        conn: ConnectionId,
        action: GameAction,
    ) -> Result<(), RoomError> {
        self.member(player_id, conn, MemberRequest::Action(action))
            .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Inspect { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    async fn member(
        &self,
        player_id: PlayerId,
        conn: ConnectionId,
        request: MemberRequest,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Member {
            player_id,
            conn,
            request,
        })
        .await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

struct RoomActor {
    code: RoomCode,
    config: RoomConfig,
    clock: RoomClock,
    created_at: u64,
    roster: Roster<Link>,
    votes: VoteTally,
    game: GameState,
    /// Number of games dealt so far; stamps timer tickets.
    games_dealt: u64,
    rng: StdRng,
    alarm: Alarm<TimerTicket>,
    sweep: TickScheduler,
    grace: HashMap<PlayerId, JoinHandle<()>>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// For grace tasks; weak so the actor never keeps itself alive.
    mailbox: mpsc::WeakSender<RoomCommand>,
    closing: bool,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room actor started");

        while !self.closing {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                ticket = self.alarm.wait() => self.on_timer(TimerFired::Alarm(ticket)),
                _ = self.sweep.wait_for_tick() => self.on_timer(TimerFired::Sweep),
            }
        }

        for (_, task) in self.grace.drain() {
            task.abort();
        }
        tracing::info!(room = %self.code, "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                request,
                link,
                reply,
            } => {
                let _ = reply.send(self.handle_join(request, link));
            }
            RoomCommand::Disconnect { player_id, conn } => self.handle_disconnect(player_id, conn),
            RoomCommand::GraceExpired { player_id, serial } => {
                self.handle_grace_expired(player_id, serial)
            }
            RoomCommand::Member {
                player_id,
                conn,
                request,
            } => self.handle_member(player_id, conn, request),
            RoomCommand::Inspect { reply } => {
                let _ = reply.send(self.info());
            }
        }
    }

    /// Routes a post-join message from a member's current connection.
    /// A socket superseded by a rejoin, or a member in their grace period,
    /// is not heard.
    fn handle_member(&mut self, player_id: PlayerId, conn: ConnectionId, request: MemberRequest) {
        let current = self
            .roster
            .get(&player_id)
            .and_then(|member| member.link())
            .is_some_and(|link| link.conn == conn);
        if !current {
            tracing::debug!(room = %self.code, %player_id, %conn, "message from stale connection ignored");
            return;
        }

        match request {
            MemberRequest::Vote { mode } => self.handle_vote(player_id, &mode),
            MemberRequest::Start => self.handle_start(&player_id),
            MemberRequest::Restart => self.handle_restart(&player_id),
            MemberRequest::Emoji { emoji_code } => self.handle_emoji(player_id, emoji_code),
            MemberRequest::Action(action) => self.handle_action(&player_id, &action),
        }
    }

    // -- membership --------------------------------------------------------

    fn handle_join(&mut self, request: JoinRequest, link: Link) -> Result<Joined, RoomError> {
        let admission = self
            .roster
            .join(
                request.name.as_deref(),
                request.player_id.as_ref(),
                link.clone(),
            )
            .map_err(|err| match err {
                SessionError::Full { .. } => RoomError::RoomFull(self.code.clone()),
                _ => RoomError::Unavailable(self.code.clone()),
            })?;

        let player_id = admission.player_id;
        if admission.rejoined {
            if let Some(task) = self.grace.remove(&player_id) {
                task.abort();
            }
        }
        tracing::info!(
            room = %self.code,
            %player_id,
            rejoined = admission.rejoined,
            members = self.roster.len(),
            "player joined"
        );

        link.send(ServerMessage::PlayerJoined {
            player_id: player_id.clone(),
            is_host: admission.is_host,
            room: self.snapshot(&player_id),
        });
        self.broadcast();

        Ok(Joined {
            player_id,
            is_host: admission.is_host,
        })
    }

    fn handle_disconnect(&mut self, player_id: PlayerId, conn: ConnectionId) {
        let Some(serial) = self.roster.detach(&player_id, |link| link.conn == conn) else {
            tracing::debug!(room = %self.code, %player_id, %conn, "stale disconnect ignored");
            return;
        };

        let mailbox = self.mailbox.clone();
        let grace = self.config.reconnect_grace;
        let expired_id = player_id.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx
                    .send(RoomCommand::GraceExpired {
                        player_id: expired_id,
                        serial,
                    })
                    .await;
            }
        });
        if let Some(previous) = self.grace.insert(player_id, task) {
            previous.abort();
        }
        self.broadcast();
    }

    fn handle_grace_expired(&mut self, player_id: PlayerId, serial: u64) {
        match self.roster.expire(&player_id, serial) {
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(room = %self.code, %player_id, %err, "grace expiry ignored");
                return;
            }
        }
        self.grace.remove(&player_id);
        self.votes.remove(&player_id);
        tracing::info!(room = %self.code, %player_id, members = self.roster.len(), "player removed");

        if self.roster.is_empty() {
            tracing::info!(room = %self.code, "last member gone, closing room");
            self.closing = true;
            return;
        }
        self.broadcast();
    }

    // -- lobby -------------------------------------------------------------

    fn handle_vote(&mut self, player_id: PlayerId, mode: &str) {
        if self.game.is_started() {
            return;
        }
        let Some(variant) = Variant::from_vote(mode) else {
            tracing::debug!(room = %self.code, %player_id, mode, "unknown vote ignored");
            return;
        };
        self.votes.record(player_id, variant);
        self.broadcast();
    }

    fn handle_start(&mut self, player_id: &PlayerId) {
        if !self.roster.is_host(player_id)
            || self.roster.len() < self.config.min_players
            || self.game.is_started()
        {
            tracing::debug!(room = %self.code, %player_id, "start refused");
            return;
        }

        let variant = self.votes.decide(self.roster.len());
        self.games_dealt += 1;
        let players = self.roster.ids();
        let now = self.clock.now_ms();
        match GameState::start(
            variant,
            self.games_dealt,
            &players,
            self.config.engine_config(),
            now,
            &mut self.rng,
        ) {
            Ok(game) => {
                self.game = game;
                tracing::info!(room = %self.code, %variant, players = players.len(), "game started");
                self.sync_timers();
                self.broadcast();
            }
            Err(err) => {
                tracing::warn!(room = %self.code, %variant, %err, "game could not be dealt");
            }
        }
    }

    fn handle_restart(&mut self, player_id: &PlayerId) {
        if !self.roster.is_host(player_id) {
            return;
        }
        self.game = GameState::Unstarted;
        self.votes.clear();
        self.sync_timers();
        tracing::info!(room = %self.code, "game reset");
        self.broadcast();
    }

    fn handle_emoji(&mut self, player_id: PlayerId, emoji_code: String) {
        let msg = ServerMessage::EmojiEvent {
            player_id,
            emoji_code,
            timestamp: self.clock.now_ms(),
        };
        for (_, link) in self.roster.connected() {
            link.send(msg.clone());
        }
    }

    // -- game --------------------------------------------------------------

    fn handle_action(&mut self, player_id: &PlayerId, action: &GameAction) {
        let now = self.clock.now_ms();
        match self.game.apply(player_id, action, now, &mut self.rng) {
            Ok(()) => {
                if self.game.is_finished() {
                    tracing::info!(room = %self.code, "game finished");
                }
                self.sync_timers();
                self.broadcast();
            }
            Err(reason) => {
                tracing::debug!(room = %self.code, %player_id, ?action, %reason, "action rejected");
            }
        }
    }

    fn on_timer(&mut self, fired: TimerFired) {
        let now = self.clock.now_ms();
        match self.game.on_timer(fired, now, &mut self.rng) {
            Ok(()) => {
                tracing::debug!(room = %self.code, ?fired, "timer resolved");
                self.sync_timers();
                self.broadcast();
            }
            Err(reason) => {
                tracing::trace!(room = %self.code, ?fired, %reason, "timer ignored");
                self.sync_timers();
            }
        }
    }

    /// Points the alarm and sweep at whatever the game now wants.
    fn sync_timers(&mut self) {
        use cardhall_game::TimerRequest;

        let request = self.game.timer();
        self.sweep.set_running(request == TimerRequest::Sweep);
        match request {
            TimerRequest::Alarm { at_ms, ticket } => {
                self.alarm.arm(self.clock.instant_at(at_ms), ticket);
            }
            TimerRequest::Idle | TimerRequest::Sweep => self.alarm.disarm(),
        }
    }

    // -- views -------------------------------------------------------------

    fn snapshot(&self, viewer: &PlayerId) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host_id: self.roster.host().cloned(),
            player_id: viewer.clone(),
            created_at: self.created_at,
            players: self
                .roster
                .iter()
                .map(|m| PlayerSummary {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    connected: m.is_connected(),
                })
                .collect(),
            votes: self.votes.counts(),
            player_count: self.roster.len(),
            game_state: self.game.view(viewer),
        }
    }

    /// Sends every connected member their own `ROOM_UPDATE`.
    fn broadcast(&self) {
        for (player_id, link) in self.roster.connected() {
            link.send(ServerMessage::RoomUpdate(self.snapshot(player_id)));
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            host: self.roster.host().cloned(),
            members: self.roster.ids(),
            connected: self.roster.connected().count(),
            variant: self.game.variant(),
            finished: self.game.is_finished(),
            card_count: self.game.census().len(),
        }
    }
}

/// Spawns a room actor and returns its handle.
pub(crate) fn spawn_room(code: RoomCode, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let sweep = TickScheduler::paused(TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_period(config.sweep_interval)
    });
    let clock = RoomClock::new();

    let actor = RoomActor {
        code: code.clone(),
        roster: Roster::new(config.capacity),
        config,
        created_at: clock.now_ms(),
        clock,
        votes: VoteTally::default(),
        game: GameState::Unstarted,
        games_dealt: 0,
        rng,
        alarm: Alarm::new(),
        sweep,
        grace: HashMap::new(),
        receiver: rx,
        mailbox: tx.downgrade(),
        closing: false,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
