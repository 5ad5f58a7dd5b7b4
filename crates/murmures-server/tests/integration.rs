//! Integration tests for client-server communication.
//!
//! Drives a match through `MatchSession` with the bundled data files and
//! keeps client mirrors in sync from the replies alone.

use std::path::{Path, PathBuf};

use murmures_core::Validation;
use murmures_protocol::{Coord, EngineState, OrderRequest, TileState};
use murmures_server::{
    protocol::{
        client_message_from_json, deserialize_server_message, serialize_server_message,
        server_message_to_json, ClientMessage, ServerMessage,
    },
    ClientMirror, MatchSession, ServerConfig,
};

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

fn bundled_config() -> ServerConfig {
    let dir = data_dir();
    let mut config = ServerConfig::load(&dir.join("server.yaml")).unwrap();
    config.registry = dir.join("registry.yaml");
    config.levels = vec![dir.join("levels/crypt.yaml"), dir.join("levels/attic.yaml")];
    config
}

fn join(session: &mut MatchSession, config: &ServerConfig, template: &str) -> ClientMirror {
    let reply = session.handle(ClientMessage::Join {
        template: template.into(),
    });
    ClientMirror::from_joined(
        config.load_templates().unwrap(),
        config.engine.clone(),
        &reply[0],
    )
    .unwrap()
}

/// Sends through the wire codec so the test also covers encoding.
fn broadcast(replies: &[ServerMessage], mirrors: &mut [&mut ClientMirror]) {
    for reply in replies {
        let bytes = serialize_server_message(reply).unwrap();
        let decoded = deserialize_server_message(&bytes).unwrap();
        for mirror in mirrors.iter_mut() {
            mirror.apply(&decoded).unwrap();
        }
    }
}

#[test]
fn bundled_match_starts() {
    let config = bundled_config();
    let mut session = MatchSession::from_config(&config).unwrap();
    assert_eq!(session.engine().level().id(), "crypt");
    assert_eq!(session.engine().level().mobs.len(), 2);

    let mut mirror = join(&mut session, &config, "knight");
    assert_eq!(session.engine().state(), EngineState::Playing);
    assert_eq!(mirror.engine().state(), EngineState::Playing);
    assert_eq!(mirror.checksum().unwrap(), {
        let ServerMessage::GameState { checksum, .. } =
            session.handle(ClientMessage::RequestState).remove(0)
        else {
            panic!("expected state");
        };
        checksum
    });
    let replies = session.handle(ClientMessage::RequestState);
    broadcast(&replies, &mut [&mut mirror]);
}

#[test]
fn mirrors_follow_a_two_hero_match() {
    let mut config = bundled_config();
    config.min_heroes = 2;
    let mut session = MatchSession::from_config(&config).unwrap();

    let mut first = join(&mut session, &config, "knight");
    let joined = session.handle(ClientMessage::Join {
        template: "ranger".into(),
    });
    broadcast(&joined, &mut [&mut first]);
    let mut second = ClientMirror::from_joined(
        config.load_templates().unwrap(),
        config.engine.clone(),
        &joined[0],
    )
    .unwrap();
    let (a, b) = (first.hero().unwrap(), second.hero().unwrap());
    assert_eq!(first.engine().state(), EngineState::Playing);

    let walk = [
        (Coord::new(2, 1), Coord::new(2, 2)),
        (Coord::new(3, 1), Coord::new(1, 3)),
        (Coord::new(4, 1), Coord::new(1, 4)),
    ];
    for (turn, (to_a, to_b)) in walk.into_iter().enumerate() {
        for (hero, to, mirror) in [(a, to_a, &first), (b, to_b, &second)] {
            assert_eq!(
                mirror.prevalidate(&OrderRequest::move_to(hero, to)),
                Validation::Accepted
            );
        }
        let replies = session.handle(ClientMessage::SubmitOrder {
            order: OrderRequest::move_to(a, to_a),
        });
        assert!(matches!(replies[0], ServerMessage::OrderAccepted { .. }));
        broadcast(&replies, &mut [&mut first, &mut second]);

        let replies = session.handle(ClientMessage::SubmitOrder {
            order: OrderRequest::move_to(b, to_b),
        });
        let ServerMessage::TurnResolved { turn: resolved, .. } = &replies[0] else {
            panic!("expected a resolved turn, got {replies:?}");
        };
        assert_eq!(*resolved as usize, turn + 1);
        broadcast(&replies, &mut [&mut first, &mut second]);

        let truth = session.engine().clone_state();
        assert_eq!(first.engine().clone_state(), truth);
        assert_eq!(second.engine().clone_state(), truth);
        assert!(!first.playback().is_empty());
    }

    // The rat near the top corridor has been seen by now.
    let crypt = first.engine().level();
    assert_eq!(crypt.tile(Coord::new(7, 1)).unwrap().state, TileState::Highlighted);
    assert!(crypt.mobs.iter().any(|m| m.char_spotted()));
}

#[test]
fn mirror_rejects_what_the_server_rejects() {
    let config = bundled_config();
    let mut session = MatchSession::from_config(&config).unwrap();
    let mirror = join(&mut session, &config, "knight");
    let hero = mirror.hero().unwrap();

    let into_wall = OrderRequest::move_to(hero, Coord::new(0, 1));
    let local = mirror.prevalidate(&into_wall);
    assert!(!local.is_valid());

    let replies = session.handle(ClientMessage::SubmitOrder { order: into_wall });
    let [ServerMessage::OrderRejected { reason, .. }] = replies.as_slice() else {
        panic!("expected a rejection, got {replies:?}");
    };
    assert_eq!(Some(reason.clone()), local.reason());
}

#[test]
fn json_lines_drive_the_session() {
    let config = bundled_config();
    let mut session = MatchSession::from_config(&config).unwrap();

    let join = client_message_from_json(r#"{"type":"Join","template":"knight"}"#).unwrap();
    let replies = session.handle(join);
    let json = server_message_to_json(&replies[0]).unwrap();
    assert!(json.starts_with(r#"{"type":"Joined""#));

    let order = client_message_from_json(
        r#"{"type":"SubmitOrder","order":{"command":"move","source":{"guid":99},"target":{"x":2,"y":1}}}"#,
    )
    .unwrap();
    let replies = session.handle(order);
    let json = server_message_to_json(&replies[0]).unwrap();
    assert!(json.contains("invalid hero"));
}
