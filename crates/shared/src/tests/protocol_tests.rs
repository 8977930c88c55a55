use super::*;
use crate::domain::Direction;
use serde_json::json;

fn me() -> PlayerId {
    PlayerId::new("p-red")
}

fn trial_json() -> serde_json::Value {
    json!({
        "type": "trial_start",
        "payload": {
            "trial_index": 0,
            "trials_total": 3,
            "board_size": 4,
            "start_positions": { "R": [0, 0], "B": [3, 3] },
            "target": [2, 1],
            "capturer": "R",
            "turn": "R",
            "role_assignment": { "R": "p-red", "B": "p-blue" }
        }
    })
}

#[test]
fn trial_start_parses_and_resolves_my_role() {
    let event: ServerEvent = serde_json::from_value(trial_json()).expect("parse");
    let ServerEvent::TrialStart(start) = event else {
        panic!("expected trial start");
    };
    let trial = start.validate(&me()).expect("valid trial");

    assert_eq!(trial.view.size, 4);
    assert_eq!(trial.view.my_role, Role::R);
    assert_eq!(trial.view.positions.r, Some(Cell::new(0, 0)));
    assert_eq!(trial.view.positions.b, Some(Cell::new(3, 3)));
    assert_eq!(trial.view.target, Some(Cell::new(2, 1)));
    assert_eq!(trial.trials_total, Some(3));
    assert!(trial.rejections.is_empty());

    let blue = start.validate(&PlayerId::new("p-blue")).expect("blue");
    assert_eq!(blue.view.my_role, Role::B);
}

#[test]
fn trial_start_without_my_assignment_is_rejected() {
    let ServerEvent::TrialStart(start) = serde_json::from_value(trial_json()).expect("parse")
    else {
        panic!("expected trial start");
    };
    let err = start
        .validate(&PlayerId::new("spectator"))
        .expect_err("no role for spectator");
    assert_eq!(err, ValidationError::UnassignedPlayer("spectator".into()));
}

#[test]
fn trial_start_rejects_board_size_out_of_range() {
    for size in [-1, 0, 1, i64::from(MAX_BOARD_SIZE) + 1] {
        assert_eq!(parse_board_size(size), Err(ValidationError::BoardSize(size)));
    }
    assert_eq!(parse_board_size(4), Ok(4));
}

#[test]
fn trial_start_drops_colliding_start_positions() {
    let mut raw = trial_json();
    raw["payload"]["start_positions"] = json!({ "R": [1, 1], "B": [1, 1] });
    let ServerEvent::TrialStart(start) = serde_json::from_value(raw).expect("parse") else {
        panic!("expected trial start");
    };
    let trial = start.validate(&me()).expect("trial still installs");
    assert_eq!(trial.view.positions, Positions::default());
    assert_eq!(trial.rejections.len(), 1);
    assert_eq!(trial.rejections[0].field, UpdateField::Positions);
}

#[test]
fn trial_start_keeps_the_valid_piece_when_the_other_is_off_board() {
    let mut raw = trial_json();
    raw["payload"]["start_positions"] = json!({ "R": [0, 0], "B": [9, 3] });
    let ServerEvent::TrialStart(start) = serde_json::from_value(raw).expect("parse") else {
        panic!("expected trial start");
    };
    let trial = start.validate(&me()).expect("trial");
    assert_eq!(trial.view.positions.r, Some(Cell::new(0, 0)));
    assert_eq!(trial.view.positions.b, None);
}

#[test]
fn board_update_accepts_star_alias_and_partial_fields() {
    let event: ServerEvent = serde_json::from_value(json!({
        "type": "board_update",
        "payload": { "star": [1, 2] }
    }))
    .expect("parse");
    let ServerEvent::BoardUpdate(update) = event else {
        panic!("expected board update");
    };
    let validated = update.validate(4);
    assert_eq!(validated.patch.target, Some(Cell::new(1, 2)));
    assert_eq!(validated.patch.positions, None);
    assert_eq!(validated.patch.turn, None);
    assert!(!validated.terminal);
}

#[test]
fn board_update_rejects_only_the_bad_field() {
    let update = BoardUpdate {
        positions: Some(WirePositions {
            r: Some(vec![4, 0]),
            b: None,
        }),
        target: Some(vec![0, 1, 2]),
        turn: Some("B".into()),
        winner: None,
    };
    let validated = update.validate(4);
    assert_eq!(validated.patch.positions, None);
    assert_eq!(validated.patch.target, None);
    assert_eq!(validated.patch.turn, Some(Role::B));

    let fields: Vec<_> = validated.rejections.iter().map(|r| r.field).collect();
    assert_eq!(fields, vec![UpdateField::Positions, UpdateField::Target]);
}

#[test]
fn board_update_with_unknown_role_rejects_turn_only() {
    let update = BoardUpdate {
        turn: Some("G".into()),
        ..BoardUpdate::default()
    };
    let validated = update.validate(4);
    assert!(validated.patch.is_empty());
    assert_eq!(
        validated.rejections,
        vec![FieldRejection::new(
            UpdateField::Turn,
            ValidationError::UnknownRole("G".into())
        )]
    );
}

#[test]
fn role_spelling_is_the_same_for_every_field() {
    let update = BoardUpdate {
        turn: Some("b".into()),
        ..BoardUpdate::default()
    };
    let validated = update.validate(4);
    assert!(validated.patch.is_empty());
    assert_eq!(
        validated.rejections,
        vec![FieldRejection::new(
            UpdateField::Turn,
            ValidationError::UnknownRole("b".into())
        )]
    );

    let mut lowercase_turn = trial_json();
    lowercase_turn["payload"]["turn"] = json!("r");
    assert!(serde_json::from_value::<ServerEvent>(lowercase_turn).is_err());

    for role in Role::ALL {
        let via_serde: Role = serde_json::from_value(json!(role.as_str())).expect("serde role");
        assert_eq!(role.as_str().parse::<Role>(), Ok(via_serde));
    }
}

#[test]
fn any_winner_marks_update_terminal() {
    let update = BoardUpdate {
        winner: Some("???".into()),
        ..BoardUpdate::default()
    };
    let validated = update.validate(4);
    assert!(validated.terminal);
    assert_eq!(validated.winner, None);

    let update = BoardUpdate {
        winner: Some("R".into()),
        ..BoardUpdate::default()
    };
    assert_eq!(update.validate(4).winner, Some(Role::R));
}

#[test]
fn move_request_serializes_with_tagged_payload() {
    let request = ClientRequest::Move {
        room_code: RoomCode::new("ab12"),
        player_id: me(),
        role: Role::R,
        delta: Delta::new(1, 0).expect("unit delta"),
    };
    let value = serde_json::to_value(&request).expect("serialize");
    assert_eq!(
        value,
        json!({
            "type": "move",
            "payload": {
                "room_code": "AB12",
                "player_id": "p-red",
                "role": "R",
                "delta": { "dx": 1, "dy": 0 }
            }
        })
    );
}

#[test]
fn delta_rejects_diagonal_and_long_steps() {
    assert!(Delta::new(1, 1).is_err());
    assert!(Delta::new(0, 0).is_err());
    assert!(Delta::new(2, 0).is_err());
    assert!(serde_json::from_value::<Delta>(json!({ "dx": -1, "dy": -1 })).is_err());
}

#[test]
fn cell_offset_stays_inside_board() {
    let corner = Cell::new(0, 0);
    assert_eq!(corner.offset(Direction::Left.delta(), 4), None);
    assert_eq!(corner.offset(Direction::Up.delta(), 4), None);
    assert_eq!(
        corner.offset(Direction::Right.delta(), 4),
        Some(Cell::new(1, 0))
    );
    assert_eq!(Cell::new(3, 3).offset(Direction::Down.delta(), 4), None);
}

#[test]
fn game_over_keeps_results_opaque() {
    let event: ServerEvent = serde_json::from_value(json!({
        "type": "game_over",
        "payload": { "results": { "scores": [2, 1] } }
    }))
    .expect("parse");
    assert_eq!(
        event,
        ServerEvent::GameOver {
            results: json!({ "scores": [2, 1] })
        }
    );
}
