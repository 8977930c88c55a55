use shared::{
    domain::{BoardPatch, BoardView, Cell},
    error::ValidationError,
    protocol::{FieldRejection, UpdateField},
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub previous: BoardView,
    pub current: BoardView,
    pub rejections: Vec<FieldRejection>,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Default)]
pub struct ViewStore {
    view: Option<BoardView>,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<BoardView> {
        self.view.clone()
    }

    pub fn has_trial(&self) -> bool {
        self.view.is_some()
    }

    pub fn replace(&mut self, full: BoardView) -> Option<BoardView> {
        self.view.replace(full)
    }

    /// Applies each present field of `patch`, last writer wins. A field that would break
    /// the board invariants is dropped and the stored value kept.
    pub fn merge(&mut self, patch: &BoardPatch) -> Option<MergeOutcome> {
        let Some(current) = self.view.as_ref() else {
            warn!("board update arrived before any trial start; ignoring");
            return None;
        };
        let previous = current.clone();
        let mut next = current.clone();
        let mut rejections = Vec::new();

        if let Some(positions) = patch.positions {
            let candidate = positions.apply_to(previous.positions);
            let off_board = [candidate.r, candidate.b]
                .into_iter()
                .flatten()
                .find(|cell| !cell.in_bounds(previous.size));
            match (off_board, candidate.r) {
                (Some(cell), _) => rejections.push(FieldRejection::new(
                    UpdateField::Positions,
                    out_of_bounds(cell, previous.size),
                )),
                (None, Some(r)) if candidate.collides() => rejections.push(FieldRejection::new(
                    UpdateField::Positions,
                    ValidationError::Collision { x: r.x, y: r.y },
                )),
                // Both roles land in one write.
                _ => next.positions = candidate,
            }
        }

        if let Some(target) = patch.target {
            if target.in_bounds(previous.size) {
                next.target = Some(target);
            } else {
                rejections.push(FieldRejection::new(
                    UpdateField::Target,
                    out_of_bounds(target, previous.size),
                ));
            }
        }

        if let Some(turn) = patch.turn {
            next.turn = turn;
        }

        for rejection in &rejections {
            warn!(
                field = ?rejection.field,
                error = %rejection.error,
                "rejected board update field; keeping last known value"
            );
        }

        self.view = Some(next.clone());
        Some(MergeOutcome {
            previous,
            current: next,
            rejections,
        })
    }
}

fn out_of_bounds(cell: Cell, size: u32) -> ValidationError {
    ValidationError::OutOfBounds {
        x: i64::from(cell.x),
        y: i64::from(cell.y),
        size,
    }
}

#[cfg(test)]
#[path = "tests/view_store_tests.rs"]
mod tests;
