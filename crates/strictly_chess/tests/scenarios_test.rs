//! End-to-end scenarios for the clock, arbiter, history cursor and bot.

use rand::SeedableRng;
use rand::rngs::StdRng;
use strictly_chess::{
    Actor, BotProfile, ClockSignal, GameMode, GameOutcome, GameSession, MoveRejection,
    RulesEngine, Side, TimeControl,
};

fn versus_bot(elo: u32) -> GameMode {
    GameMode::VersusBot {
        bot: BotProfile::with_strength(elo),
    }
}

#[test]
fn test_one_minute_clock_flags_white_once() {
    let mut session = GameSession::new(
        "scenario-a",
        GameMode::HotSeat,
        TimeControl::new(1, 0).unwrap(),
    );
    session.start();

    let mut timeouts = 0;
    for _ in 0..60 {
        if let Some(ClockSignal::Timeout(side)) = session.tick() {
            assert_eq!(side, Side::White);
            timeouts += 1;
        }
    }
    for _ in 0..5 {
        assert_eq!(session.tick(), None);
    }

    assert_eq!(timeouts, 1);
    assert_eq!(session.clock().white_remaining(), 0);
    assert_eq!(session.clock().black_remaining(), 60);
    assert_eq!(
        session.outcome(),
        Some(GameOutcome::Timeout {
            flagged: Side::White
        })
    );
}

#[test]
fn test_illegal_pawn_jump_is_rejected() {
    let mut session = GameSession::new("scenario-b", GameMode::HotSeat, TimeControl::default());
    session.start();
    let result = session.attempt_move(Actor::Local, "e2e5".parse().unwrap());
    assert!(matches!(result, Err(MoveRejection::IllegalMove { .. })));
    assert!(session.rules().moves().is_empty());
}

#[test]
fn test_scrub_back_and_forward_after_e4() {
    let mut session = GameSession::new("scenario-c", GameMode::HotSeat, TimeControl::default());
    session.start();
    session
        .attempt_move(Actor::Local, "e2e4".parse().unwrap())
        .unwrap();
    let after_e4 = session.rules().snapshot();

    assert!(session.step_back());
    assert_eq!(
        session.cursor().displayed(session.rules()),
        RulesEngine::new().snapshot()
    );

    assert!(session.step_forward());
    assert_eq!(session.cursor().displayed(session.rules()), after_e4);
    assert!(session.cursor().is_live());

    assert!(!session.step_forward());
    assert!(session.cursor().is_live());
}

#[test]
fn test_strongest_bot_always_takes_hanging_queen() {
    for seed in 0..25 {
        let mut session = GameSession::restore(
            "scenario-d",
            versus_bot(3000),
            TimeControl::default(),
            &["e2e4", "g7g6", "d1f3", "a7a6"],
            600,
            600,
        )
        .unwrap();
        assert_eq!(session.start(), None);

        let applied = session
            .attempt_move(Actor::Local, "f3h5".parse().unwrap())
            .unwrap();
        let ticket = applied.bot_ticket.expect("bot should be scheduled");

        let mut rng = StdRng::seed_from_u64(seed);
        let reply = session.run_bot(ticket, &mut rng).unwrap().unwrap();
        assert_eq!(reply.played.uci(), "g6h5", "seed {}", seed);
        assert_eq!(reply.actor, Actor::Bot);
        assert_eq!(reply.played.san(), "gxh5");
    }
}

#[test]
fn test_online_black_cannot_move_white_piece() {
    let mode = GameMode::Online {
        game_id: "scenario-e".to_string(),
        local: Side::Black,
    };
    let mut session = GameSession::new("scenario-e", mode, TimeControl::default());
    session.start();
    let before = session.rules().fen();

    let result = session.attempt_move(Actor::Local, "e2e4".parse().unwrap());
    assert_eq!(
        result,
        Err(MoveRejection::OutOfTurn {
            seat: Side::Black,
            to_move: Side::White
        })
    );
    assert_eq!(session.rules().fen(), before);
    assert!(session.rules().moves().is_empty());
}
