//! End-to-end pipeline tests: submission -> storage -> standings.

use tally::{
    RequestContext, Scoreboard, Storage, TeamSubmission, ValidationError, ServiceError,
};

struct Fixture {
    storage: Storage,
    group_id: String,
    mode_id: String,
}

fn fixture(members: &[(&str, &str)]) -> Fixture {
    let storage = Storage::open_in_memory().unwrap();
    let group = storage.create_group("Game Night", "alice").unwrap();
    for &(player_id, name) in members {
        storage.add_member(&group.id, player_id, Some(name)).unwrap();
    }
    let mode = storage.create_game_mode(&group.id, "Ping Pong").unwrap();
    Fixture {
        storage,
        group_id: group.id,
        mode_id: mode.id,
    }
}

fn teams(specs: &[(&[&str], &str)]) -> Vec<TeamSubmission> {
    specs
        .iter()
        .enumerate()
        .map(|(i, (players, score))| TeamSubmission::new(i as u32 + 1, players, score))
        .collect()
}

#[test]
fn test_empty_group_shows_all_members_at_rank_one() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let board = Scoreboard::new(&mut fx.storage);

    let standings = board.standings(&fx.group_id).unwrap();
    assert_eq!(standings.len(), 2);
    for s in &standings {
        assert_eq!((s.wins, s.total_points, s.rank), (0, 0.0, 1));
    }
}

#[test]
fn test_single_match_produces_winner_and_runner_up() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("alice");

    board
        .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "21"), (&["bob"], "15")]))
        .unwrap();

    let standings = board.standings(&fx.group_id).unwrap();
    assert_eq!(standings[0].display_name, "Alice");
    assert_eq!((standings[0].wins, standings[0].total_points, standings[0].rank), (1, 21.0, 1));
    assert_eq!(standings[1].display_name, "Bob");
    assert_eq!((standings[1].wins, standings[1].total_points, standings[1].rank), (0, 15.0, 2));
}

#[test]
fn test_drawn_match_gives_both_teams_the_win() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("alice");

    let record = board
        .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "10"), (&["bob"], "10")]))
        .unwrap();
    assert_eq!(record.winning_teams(), vec![1, 2]);

    let standings = board.standings(&fx.group_id).unwrap();
    for s in &standings {
        assert_eq!((s.wins, s.total_points, s.rank), (1, 10.0, 1));
    }
}

#[test]
fn test_points_split_players_tied_on_wins() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("alice");

    // Alice beats Carol, then loses to Bob: one win each for Alice and
    // Bob, with Alice ahead on points (26 vs 21).
    board
        .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "21"), (&["carol"], "15")]))
        .unwrap();
    board
        .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "5"), (&["bob"], "21")]))
        .unwrap();

    let standings = board.standings(&fx.group_id).unwrap();
    assert_eq!(standings[0].display_name, "Alice");
    assert_eq!((standings[0].wins, standings[0].total_points), (1, 26.0));
    assert_eq!(standings[1].display_name, "Bob");
    assert_eq!((standings[1].wins, standings[1].total_points), (1, 21.0));
    assert_eq!(standings[2].display_name, "Carol");
    assert_eq!((standings[2].wins, standings[2].total_points), (0, 15.0));
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[1].rank, 2);
    assert_eq!(standings[2].rank, 3);
}

#[test]
fn test_team_play_credits_every_member() {
    let mut fx = fixture(&[
        ("alice", "Alice"),
        ("bob", "Bob"),
        ("carol", "Carol"),
        ("dave", "Dave"),
    ]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("alice");

    board
        .submit_match(
            &ctx,
            &fx.mode_id,
            &teams(&[(&["alice", "bob"], "5"), (&["carol", "dave"], "3")]),
        )
        .unwrap();

    let standings = board.standings(&fx.group_id).unwrap();
    for name in ["Alice", "Bob"] {
        let s = standings.iter().find(|s| s.display_name == name).unwrap();
        assert_eq!((s.wins, s.total_points, s.rank), (1, 5.0, 1));
    }
    for name in ["Carol", "Dave"] {
        let s = standings.iter().find(|s| s.display_name == name).unwrap();
        assert_eq!((s.wins, s.total_points, s.rank), (0, 3.0, 3));
    }
}

#[test]
fn test_removed_member_disappears_from_standings() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let ctx = RequestContext::new("alice");

    {
        let mut board = Scoreboard::new(&mut fx.storage);
        board
            .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "21"), (&["bob"], "15")]))
            .unwrap();
    }
    fx.storage.remove_member(&fx.group_id, "bob").unwrap();

    let board = Scoreboard::new(&mut fx.storage);
    let standings = board.standings(&fx.group_id).unwrap();
    assert_eq!(standings.len(), 1);
    assert_eq!(standings[0].display_name, "Alice");
    // Alice's stats still include the match bob played in.
    assert_eq!((standings[0].wins, standings[0].total_points), (1, 21.0));
}

#[test]
fn test_deleting_a_game_mode_removes_its_matches_from_the_board() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let ctx = RequestContext::new("alice");
    let other_mode = fx.storage.create_game_mode(&fx.group_id, "Foosball").unwrap();

    {
        let mut board = Scoreboard::new(&mut fx.storage);
        board
            .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "21"), (&["bob"], "15")]))
            .unwrap();
        board
            .submit_match(&ctx, &other_mode.id, &teams(&[(&["bob"], "5"), (&["alice"], "2")]))
            .unwrap();
    }
    fx.storage.delete_game_mode(&other_mode.id).unwrap();

    let board = Scoreboard::new(&mut fx.storage);
    assert_eq!(board.recent_matches(&fx.group_id).unwrap().len(), 1);
    let standings = board.standings(&fx.group_id).unwrap();
    let bob = standings.iter().find(|s| s.display_name == "Bob").unwrap();
    // Bob's foosball win no longer counts.
    assert_eq!((bob.wins, bob.total_points), (0, 15.0));
}

#[test]
fn test_standings_are_stable_across_reads() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("carol");

    board
        .submit_match(
            &ctx,
            &fx.mode_id,
            &teams(&[(&["alice"], "7"), (&["bob"], "7"), (&["carol"], "2")]),
        )
        .unwrap();

    let first = board.standings(&fx.group_id).unwrap();
    let second = board.standings(&fx.group_id).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rejected_submissions_leave_no_trace() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("alice");

    let cases: Vec<(Vec<TeamSubmission>, ValidationError)> = vec![
        (
            teams(&[(&["alice"], "21")]),
            ValidationError::NoTeams { got: 1 },
        ),
        (
            teams(&[(&[""], "21"), (&["bob"], "15")]),
            ValidationError::EmptyTeam { team: 1 },
        ),
        (
            teams(&[(&["alice"], "lots"), (&["bob"], "15")]),
            ValidationError::InvalidScore {
                team: 1,
                raw: "lots".to_string(),
            },
        ),
    ];

    for (submission, expected) in cases {
        match board.submit_match(&ctx, &fx.mode_id, &submission) {
            Err(ServiceError::Validation(err)) => assert_eq!(err, expected),
            other => panic!("expected validation failure, got {:?}", other.map(|r| r.id)),
        }
    }
    assert!(board.recent_matches(&fx.group_id).unwrap().is_empty());
}

#[test]
fn test_fractional_scores_flow_through_the_pipeline() {
    let mut fx = fixture(&[("alice", "Alice"), ("bob", "Bob")]);
    let mut board = Scoreboard::new(&mut fx.storage);
    let ctx = RequestContext::new("alice");

    board
        .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "2.5"), (&["bob"], "1.5")]))
        .unwrap();
    board
        .submit_match(&ctx, &fx.mode_id, &teams(&[(&["alice"], "0.5"), (&["bob"], "3.5")]))
        .unwrap();

    let standings = board.standings(&fx.group_id).unwrap();
    let alice = standings.iter().find(|s| s.display_name == "Alice").unwrap();
    let bob = standings.iter().find(|s| s.display_name == "Bob").unwrap();
    assert_eq!((alice.wins, alice.total_points), (1, 3.0));
    assert_eq!((bob.wins, bob.total_points), (1, 5.0));
    assert_eq!(bob.rank, 1);
    assert_eq!(alice.rank, 2);
}
