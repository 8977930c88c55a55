use super::*;
use shared::domain::{Positions, PositionsPatch, Role};

fn base_view() -> BoardView {
    BoardView {
        size: 4,
        positions: Positions::new(Some(Cell::new(1, 1)), Some(Cell::new(3, 3))),
        target: Some(Cell::new(2, 1)),
        capturer: Role::R,
        turn: Role::R,
        my_role: Role::R,
    }
}

fn store_with(view: BoardView) -> ViewStore {
    let mut store = ViewStore::new();
    store.replace(view);
    store
}

#[test]
fn merge_before_trial_start_is_ignored() {
    let mut store = ViewStore::new();
    let patch = BoardPatch {
        turn: Some(Role::B),
        ..BoardPatch::default()
    };
    assert!(store.merge(&patch).is_none());
    assert!(store.snapshot().is_none());
}

#[test]
fn turn_only_patch_preserves_positions() {
    let mut store = store_with(base_view());
    let patch = BoardPatch {
        turn: Some(Role::B),
        ..BoardPatch::default()
    };
    let outcome = store.merge(&patch).expect("active trial");

    let snapshot = store.snapshot().expect("view");
    assert_eq!(snapshot.positions.r, Some(Cell::new(1, 1)));
    assert_eq!(snapshot.positions.b, Some(Cell::new(3, 3)));
    assert_eq!(snapshot.target, Some(Cell::new(2, 1)));
    assert_eq!(snapshot.turn, Role::B);
    assert!(outcome.changed());
    assert!(outcome.rejections.is_empty());
}

#[test]
fn snapshot_is_independent_of_later_merges() {
    let mut store = store_with(base_view());
    let before = store.snapshot().expect("view");
    store.merge(&BoardPatch {
        positions: Some(PositionsPatch {
            r: Some(Cell::new(1, 0)),
            b: None,
        }),
        ..BoardPatch::default()
    });
    assert_eq!(before.positions.r, Some(Cell::new(1, 1)));
    assert_eq!(
        store.snapshot().expect("view").positions.r,
        Some(Cell::new(1, 0))
    );
}

#[test]
fn applying_same_patch_twice_is_idempotent() {
    let patch = BoardPatch {
        positions: Some(PositionsPatch {
            r: Some(Cell::new(1, 0)),
            b: None,
        }),
        target: None,
        turn: Some(Role::B),
    };
    let mut once = store_with(base_view());
    once.merge(&patch);
    let mut twice = store_with(base_view());
    twice.merge(&patch);
    let second = twice.merge(&patch).expect("active trial");

    assert_eq!(once.snapshot(), twice.snapshot());
    assert!(!second.changed());
}

#[test]
fn colliding_positions_are_rejected_and_prior_kept() {
    let mut store = store_with(base_view());
    let outcome = store
        .merge(&BoardPatch {
            positions: Some(PositionsPatch {
                r: Some(Cell::new(3, 3)),
                b: None,
            }),
            turn: Some(Role::B),
            ..BoardPatch::default()
        })
        .expect("active trial");

    let snapshot = store.snapshot().expect("view");
    assert_eq!(snapshot.positions, base_view().positions);
    assert_eq!(snapshot.turn, Role::B);
    assert_eq!(outcome.rejections.len(), 1);
    assert_eq!(outcome.rejections[0].field, UpdateField::Positions);
    assert!(!snapshot.positions.collides());
}

#[test]
fn swap_of_both_pieces_lands_in_one_write() {
    let mut store = store_with(base_view());
    let outcome = store
        .merge(&BoardPatch {
            positions: Some(PositionsPatch {
                r: Some(Cell::new(3, 3)),
                b: Some(Cell::new(1, 1)),
            }),
            ..BoardPatch::default()
        })
        .expect("active trial");
    assert!(outcome.rejections.is_empty());
    let snapshot = store.snapshot().expect("view");
    assert_eq!(snapshot.positions.r, Some(Cell::new(3, 3)));
    assert_eq!(snapshot.positions.b, Some(Cell::new(1, 1)));
}

#[test]
fn off_board_fields_are_rejected_individually() {
    let mut store = store_with(base_view());
    let outcome = store
        .merge(&BoardPatch {
            positions: Some(PositionsPatch {
                r: None,
                b: Some(Cell::new(4, 0)),
            }),
            target: Some(Cell::new(0, 9)),
            turn: Some(Role::B),
        })
        .expect("active trial");

    let fields: Vec<_> = outcome.rejections.iter().map(|r| r.field).collect();
    assert_eq!(fields, vec![UpdateField::Positions, UpdateField::Target]);
    let snapshot = store.snapshot().expect("view");
    assert_eq!(snapshot.positions, base_view().positions);
    assert_eq!(snapshot.target, base_view().target);
    assert_eq!(snapshot.turn, Role::B);
}

#[test]
fn replace_discards_previous_trial_wholesale() {
    let mut store = store_with(base_view());
    let next = BoardView {
        size: 6,
        positions: Positions::new(Some(Cell::new(5, 5)), None),
        target: None,
        capturer: Role::B,
        turn: Role::B,
        my_role: Role::B,
    };
    let displaced = store.replace(next.clone());
    assert_eq!(displaced, Some(base_view()));
    assert_eq!(store.snapshot(), Some(next));
}
