//! Integration tests for rooms: membership, voting, games and timers.
//!
//! Every test runs on a paused Tokio clock. Commands are followed by an
//! `info()` round trip, which guarantees the actor has processed
//! everything sent before it, and outbound channels are then drained
//! with `try_recv`.

use std::time::Duration;

use cardhall_protocol::{
    DurakPhase, GameAction, GameView, JoinRequest, OmahaStage, PlayerId, RoomCode, RoomSnapshot,
    ServerMessage, Variant,
};
use cardhall_room::{Joined, Link, RoomConfig, RoomError, RoomHandle, RoomManager};
use cardhall_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

fn manager() -> RoomManager {
    RoomManager::new(RoomConfig {
        rng_seed: Some(11),
        ..RoomConfig::default()
    })
}

fn request(code: &str, name: &str, player_id: Option<&PlayerId>) -> JoinRequest {
    JoinRequest {
        name: Some(name.to_owned()),
        room_code: Some(code.to_owned()),
        player_id: player_id.cloned(),
    }
}

fn link(conn: u64) -> (Link, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Link::new(ConnectionId::new(conn), tx), rx)
}

struct Client {
    handle: RoomHandle,
    joined: Joined,
    conn: ConnectionId,
    inbox: Inbox,
}

impl Client {
    fn id(&self) -> PlayerId {
        self.joined.player_id.clone()
    }
}

async fn join(manager: &mut RoomManager, code: &str, name: &str, conn: u64) -> Client {
    let (link, inbox) = link(conn);
    let (handle, joined) = manager.join(request(code, name, None), link).await.unwrap();
    Client {
        handle,
        joined,
        conn: ConnectionId::new(conn),
        inbox,
    }
}

/// Waits until the actor has processed everything queued so far.
async fn settle(handle: &RoomHandle) {
    handle.info().await.unwrap();
}

fn drain(inbox: &mut Inbox) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = inbox.try_recv() {
        out.push(msg);
    }
    out
}

fn last_snapshot(inbox: &mut Inbox) -> RoomSnapshot {
    drain(inbox)
        .into_iter()
        .rev()
        .find_map(|msg| match msg {
            ServerMessage::RoomUpdate(snapshot) => Some(snapshot),
            _ => None,
        })
        .expect("no ROOM_UPDATE received")
}

async fn start_with_votes(clients: &mut [Client], mode: &str) {
    for client in clients.iter() {
        client.handle.vote(client.id(), client.conn, mode.to_owned()).await.unwrap();
    }
    let host = &clients[0];
    host.handle.start(host.id(), host.conn).await.unwrap();
    settle(&host.handle).await;
    for client in clients.iter_mut() {
        drain(&mut client.inbox);
    }
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_join_creates_room_and_makes_host() {
    let mut mgr = manager();
    let mut ann = join(&mut mgr, "ABCD", "Ann", 1).await;

    assert!(ann.joined.is_host);
    assert_eq!(mgr.room_count(), 1);
    settle(&ann.handle).await;

    let msgs = drain(&mut ann.inbox);
    assert_eq!(msgs.len(), 2);
    let ServerMessage::PlayerJoined {
        player_id,
        is_host,
        room,
    } = &msgs[0]
    else {
        panic!("expected PLAYER_JOINED first, got {:?}", msgs[0]);
    };
    assert_eq!(player_id, &ann.id());
    assert!(*is_host);
    assert_eq!(room.code, RoomCode::from("ABCD"));
    assert_eq!(room.host_id.as_ref(), Some(&ann.id()));
    assert!(matches!(msgs[1], ServerMessage::RoomUpdate(_)));
}

#[tokio::test(start_paused = true)]
async fn test_second_join_broadcasts_to_everyone() {
    let mut mgr = manager();
    let mut ann = join(&mut mgr, "ROOM", "Ann", 1).await;
    let mut bob = join(&mut mgr, "ROOM", "Bob", 2).await;
    settle(&bob.handle).await;

    assert!(!bob.joined.is_host);
    let seen_by_ann = last_snapshot(&mut ann.inbox);
    let seen_by_bob = last_snapshot(&mut bob.inbox);
    assert_eq!(seen_by_ann.player_count, 2);
    assert_eq!(seen_by_ann.player_id, ann.id());
    assert_eq!(seen_by_bob.player_id, bob.id());
    assert_eq!(seen_by_bob.players[1].name, "Bob");
    assert_eq!(mgr.room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_without_code_is_rejected() {
    let mut mgr = manager();
    let (link, _inbox) = link(1);
    let mut req = request("", "Ann", None);
    assert_eq!(mgr.join(req.clone(), link.clone()).await.unwrap_err(), RoomError::CodeRequired);

    req.room_code = None;
    let err = mgr.join(req, link).await.unwrap_err();
    assert_eq!(err.client_message(), Some("Room code required."));
    assert_eq!(mgr.room_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sixth_join_is_rejected_but_reconnect_is_not() {
    let mut mgr = manager();
    let mut clients = Vec::new();
    for conn in 0..5 {
        clients.push(join(&mut mgr, "FULL", "p", conn).await);
    }

    let (late, _inbox) = link(9);
    let err = mgr.join(request("FULL", "late", None), late).await.unwrap_err();
    assert_eq!(err, RoomError::RoomFull(RoomCode::from("FULL")));
    assert_eq!(err.client_message(), Some("Room is full."));

    let first = clients[0].id();
    clients[0].handle.disconnect(first.clone(), ConnectionId::new(0)).await.unwrap();
    let (back, _inbox) = link(10);
    let (_, joined) = mgr.join(request("FULL", "p", Some(&first)), back).await.unwrap();
    assert_eq!(joined.player_id, first);
    assert!(joined.is_host);
}

// =========================================================================
// Disconnects and grace
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reconnect_within_grace_keeps_id_and_host() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "G1", "Ann", 1).await;
    let mut bob = join(&mut mgr, "G1", "Bob", 2).await;

    ann.handle.disconnect(ann.id(), ConnectionId::new(1)).await.unwrap();
    settle(&ann.handle).await;
    let snapshot = last_snapshot(&mut bob.inbox);
    assert!(!snapshot.players[0].connected);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let (link, _inbox) = link(3);
    let (_, joined) = mgr.join(request("G1", "", Some(&ann.id())), link).await.unwrap();
    assert_eq!(joined.player_id, ann.id());
    assert!(joined.is_host);

    // The old grace period must not remove Ann later.
    tokio::time::sleep(Duration::from_secs(60)).await;
    let info = ann.handle.info().await.unwrap();
    assert_eq!(info.members, vec![ann.id(), bob.id()]);
    assert_eq!(info.connected, 2);
}

#[tokio::test(start_paused = true)]
async fn test_grace_expiry_removes_player_and_reassigns_host() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "G2", "Ann", 1).await;
    let mut bob = join(&mut mgr, "G2", "Bob", 2).await;
    ann.handle.vote(ann.id(), ann.conn, "4".into()).await.unwrap();

    ann.handle.disconnect(ann.id(), ConnectionId::new(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(61)).await;

    let info = bob.handle.info().await.unwrap();
    assert_eq!(info.members, vec![bob.id()]);
    assert_eq!(info.host, Some(bob.id()));
    let snapshot = last_snapshot(&mut bob.inbox);
    assert_eq!(snapshot.host_id, Some(bob.id()));
    assert_eq!(snapshot.votes.votes4, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_connection_close_is_ignored() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "G3", "Ann", 1).await;
    let (link, _inbox) = link(2);
    mgr.join(request("G3", "Ann", Some(&ann.id())), link).await.unwrap();

    // The first socket closes after the rejoin.
    ann.handle.disconnect(ann.id(), ConnectionId::new(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    let info = ann.handle.info().await.unwrap();
    assert_eq!(info.members, vec![ann.id()]);
    assert_eq!(info.connected, 1);
}

#[tokio::test(start_paused = true)]
async fn test_messages_from_stale_connection_are_ignored() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "G5", "Ann", 1).await;
    let mut bob = join(&mut mgr, "G5", "Bob", 2).await;
    let (link, _inbox) = link(3);
    mgr.join(request("G5", "Ann", Some(&ann.id())), link).await.unwrap();
    settle(&ann.handle).await;
    drain(&mut bob.inbox);

    // The superseded socket is still open but no longer speaks for Ann.
    ann.handle.vote(ann.id(), ann.conn, "4".into()).await.unwrap();
    ann.handle.start(ann.id(), ann.conn).await.unwrap();
    ann.handle.emoji(ann.id(), ann.conn, "wave".into()).await.unwrap();
    settle(&ann.handle).await;
    assert!(drain(&mut bob.inbox).is_empty());
    assert_eq!(ann.handle.info().await.unwrap().variant, None);

    ann.handle.vote(ann.id(), ConnectionId::new(3), "4".into()).await.unwrap();
    settle(&ann.handle).await;
    assert_eq!(last_snapshot(&mut bob.inbox).votes.votes4, 1);
}

#[tokio::test(start_paused = true)]
async fn test_messages_during_grace_are_ignored() {
    let mut mgr = manager();
    let mut ann = join(&mut mgr, "G6", "Ann", 1).await;
    let bob = join(&mut mgr, "G6", "Bob", 2).await;
    bob.handle.disconnect(bob.id(), bob.conn).await.unwrap();
    settle(&ann.handle).await;
    drain(&mut ann.inbox);

    bob.handle.vote(bob.id(), bob.conn, "4".into()).await.unwrap();
    settle(&ann.handle).await;
    assert!(drain(&mut ann.inbox).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_last_departure_closes_room() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "G4", "Ann", 1).await;
    ann.handle.disconnect(ann.id(), ConnectionId::new(1)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert!(ann.handle.is_closed());
    assert_eq!(mgr.room_count(), 0);
    assert!(ann.handle.info().await.is_err());

    // The code is free again; the next joiner hosts a fresh room.
    let bob = join(&mut mgr, "G4", "Bob", 2).await;
    assert!(bob.joined.is_host);
    assert_eq!(bob.handle.info().await.unwrap().members, vec![bob.id()]);
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_votes_are_counted_and_bad_modes_ignored() {
    let mut mgr = manager();
    let mut ann = join(&mut mgr, "V1", "Ann", 1).await;
    let bob = join(&mut mgr, "V1", "Bob", 2).await;

    ann.handle.vote(ann.id(), ann.conn, "4".into()).await.unwrap();
    bob.handle.vote(bob.id(), bob.conn, "6".into()).await.unwrap();
    bob.handle.vote(bob.id(), bob.conn, "4".into()).await.unwrap();
    bob.handle.vote(bob.id(), bob.conn, "7".into()).await.unwrap();
    settle(&ann.handle).await;

    let snapshot = last_snapshot(&mut ann.inbox);
    assert_eq!(snapshot.votes.votes4, 2);
    assert_eq!(snapshot.votes.votes6, 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_requires_host_and_two_players() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "S1", "Ann", 1).await;
    ann.handle.start(ann.id(), ann.conn).await.unwrap();
    assert_eq!(ann.handle.info().await.unwrap().variant, None);

    let bob = join(&mut mgr, "S1", "Bob", 2).await;
    bob.handle.start(bob.id(), bob.conn).await.unwrap();
    assert_eq!(ann.handle.info().await.unwrap().variant, None);

    ann.handle.start(ann.id(), ann.conn).await.unwrap();
    let info = ann.handle.info().await.unwrap();
    assert_eq!(info.variant, Some(Variant::Durak));
    assert_eq!(info.card_count, 52);
}

#[tokio::test(start_paused = true)]
async fn test_majority_vote_picks_omaha() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "S2", "Ann", 1).await;
    let bob = join(&mut mgr, "S2", "Bob", 2).await;
    let _cat = join(&mut mgr, "S2", "Cat", 3).await;

    ann.handle.vote(ann.id(), ann.conn, "4".into()).await.unwrap();
    bob.handle.vote(bob.id(), bob.conn, "4".into()).await.unwrap();
    ann.handle.start(ann.id(), ann.conn).await.unwrap();

    assert_eq!(ann.handle.info().await.unwrap().variant, Some(Variant::Omaha));
}

#[tokio::test(start_paused = true)]
async fn test_restart_resets_game_and_votes() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "S3", "Ann", 1).await;
    let mut bob = join(&mut mgr, "S3", "Bob", 2).await;
    let mut clients = [ann];
    start_with_votes(&mut clients, "6").await;
    let [ann] = clients;

    bob.handle.restart(bob.id(), bob.conn).await.unwrap();
    assert!(ann.handle.info().await.unwrap().variant.is_some());

    ann.handle.restart(ann.id(), ann.conn).await.unwrap();
    settle(&ann.handle).await;
    let info = ann.handle.info().await.unwrap();
    assert_eq!(info.variant, None);
    let snapshot = last_snapshot(&mut bob.inbox);
    assert_eq!(snapshot.votes.votes6, 0);
    assert!(matches!(snapshot.game_state, GameView::Unstarted(_)));
}

#[tokio::test(start_paused = true)]
async fn test_emoji_is_relayed_to_all_connected() {
    let mut mgr = manager();
    let mut ann = join(&mut mgr, "E1", "Ann", 1).await;
    let mut bob = join(&mut mgr, "E1", "Bob", 2).await;
    settle(&ann.handle).await;
    drain(&mut ann.inbox);
    drain(&mut bob.inbox);

    bob.handle.emoji(bob.id(), bob.conn, "wave".into()).await.unwrap();
    settle(&bob.handle).await;

    let bob_id = bob.id();
    for inbox in [&mut ann.inbox, &mut bob.inbox] {
        let msgs = drain(inbox);
        assert_eq!(msgs.len(), 1);
        let ServerMessage::EmojiEvent {
            player_id,
            emoji_code,
            timestamp,
        } = &msgs[0]
        else {
            panic!("expected EMOJI_EVENT");
        };
        assert_eq!(player_id, &bob_id);
        assert_eq!(emoji_code, "wave");
        assert!(*timestamp > 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_join_mid_game_is_seen_but_not_dealt() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "M1", "Ann", 1).await;
    let bob = join(&mut mgr, "M1", "Bob", 2).await;
    let mut clients = [ann, bob];
    start_with_votes(&mut clients, "6").await;

    let mut cat = join(&mut mgr, "M1", "Cat", 3).await;
    settle(&cat.handle).await;
    let snapshot = last_snapshot(&mut cat.inbox);
    assert_eq!(snapshot.player_count, 3);
    let GameView::Durak(view) = snapshot.game_state else {
        panic!("expected durak view");
    };
    assert_eq!(view.hands.len(), 2);
    assert!(view.hands.iter().all(|h| h.cards.is_none()));
}

// =========================================================================
// Games and timers
// =========================================================================

fn durak_view(snapshot: RoomSnapshot) -> cardhall_protocol::DurakView {
    match snapshot.game_state {
        GameView::Durak(view) => view,
        other => panic!("expected durak view, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_illegal_action_sends_nothing() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "D0", "Ann", 1).await;
    let bob = join(&mut mgr, "D0", "Bob", 2).await;
    let mut clients = [ann, bob];
    start_with_votes(&mut clients, "6").await;
    let [mut ann, mut bob] = clients;

    // Bob defends first and cannot lead.
    bob.handle.action(bob.id(), bob.conn, GameAction::EndAttack).await.unwrap();
    bob.handle
        .action(bob.id(), bob.conn, GameAction::Discard { card_id: cardhall_cards::CardId(0) })
        .await
        .unwrap();
    settle(&bob.handle).await;

    assert!(drain(&mut ann.inbox).is_empty());
    assert!(drain(&mut bob.inbox).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_durak_turn_timeout_makes_defender_take() {
    let mut mgr = manager();
    let mut ann = join(&mut mgr, "D1", "Ann", 1).await;
    let mut bob = join(&mut mgr, "D1", "Bob", 2).await;
    ann.handle.start(ann.id(), ann.conn).await.unwrap();
    settle(&ann.handle).await;
    drain(&mut bob.inbox);

    // Ann sits first and leads; only Ann's own view shows Ann's cards.
    let view = durak_view(last_snapshot(&mut ann.inbox));
    assert_eq!(view.attacker_id, Some(ann.id()));
    let attack = view
        .hands
        .iter()
        .find(|h| h.player_id == ann.id())
        .and_then(|h| h.cards.as_ref())
        .map(|cards| cards[0].id)
        .unwrap();

    ann.handle
        .action(ann.id(), ann.conn, GameAction::PlayAttack { card_id: attack })
        .await
        .unwrap();
    settle(&ann.handle).await;
    let view = durak_view(last_snapshot(&mut bob.inbox));
    assert_eq!(view.phase, DurakPhase::Defend);
    assert_eq!(view.turn, Some(bob.id()));
    let deadline = view.turn_deadline.unwrap();

    tokio::time::sleep(Duration::from_secs(21)).await;
    settle(&bob.handle).await;
    let view = durak_view(last_snapshot(&mut bob.inbox));
    assert_eq!(view.phase, DurakPhase::Attack);
    assert!(view.table.is_empty());
    let bob_hand = view.hands.iter().find(|h| h.player_id == bob.id()).unwrap();
    assert_eq!(bob_hand.count, 7);
    assert!(bob_hand.cards.as_ref().unwrap().iter().any(|c| c.id == attack));
    assert!(view.turn_deadline.unwrap() > deadline);
    assert_eq!(ann.handle.info().await.unwrap().card_count, 52);
}

#[tokio::test(start_paused = true)]
async fn test_omaha_sweep_auto_discards_overdue_players() {
    let mut mgr = manager();
    let ann = join(&mut mgr, "O1", "Ann", 1).await;
    let bob = join(&mut mgr, "O1", "Bob", 2).await;
    let mut clients = [ann, bob];
    start_with_votes(&mut clients, "4").await;
    let [ann, mut bob] = clients;

    tokio::time::sleep(Duration::from_secs(19)).await;
    settle(&ann.handle).await;
    assert!(drain(&mut bob.inbox).is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle(&ann.handle).await;
    let snapshot = last_snapshot(&mut bob.inbox);
    let GameView::Omaha(view) = snapshot.game_state else {
        panic!("expected omaha view");
    };
    assert_eq!(view.stage, OmahaStage::DiscardToRiver);
    assert_eq!(view.board.len(), 4);
    assert_eq!(view.muck_count, 2);
    assert_eq!(view.pending_discards.len(), 2);
    assert!(view.hands.iter().all(|h| h.count == 3));

    tokio::time::sleep(Duration::from_secs(21)).await;
    let info = ann.handle.info().await.unwrap();
    assert!(info.finished);
    assert_eq!(info.card_count, 52);
}
