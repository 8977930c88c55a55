use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        BoardPatch, BoardView, Cell, Delta, PlayerId, Positions, PositionsPatch, Role, RoomCode,
    },
    error::{ApiError, ValidationError},
};

pub const MIN_BOARD_SIZE: u32 = 2;
pub const MAX_BOARD_SIZE: u32 = 64;

/// `[x, y]` as sent by the authority. Kept loose so a bad coordinate only costs its own field.
pub type WireCell = Vec<i64>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePositions {
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub r: Option<WireCell>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<WireCell>,
}

impl WirePositions {
    pub fn from_positions(positions: Positions) -> Self {
        Self {
            r: positions.r.map(wire_cell),
            b: positions.b.map(wire_cell),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub r: Option<PlayerId>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<PlayerId>,
}

impl RoleAssignment {
    pub fn role_of(&self, player_id: &PlayerId) -> Option<Role> {
        if self.r.as_ref() == Some(player_id) {
            Some(Role::R)
        } else if self.b.as_ref() == Some(player_id) {
            Some(Role::B)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialStart {
    pub trial_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials_total: Option<u32>,
    pub board_size: i64,
    #[serde(default)]
    pub start_positions: WirePositions,
    #[serde(default, alias = "star", skip_serializing_if = "Option::is_none")]
    pub target: Option<WireCell>,
    pub capturer: Role,
    pub turn: Role,
    pub role_assignment: RoleAssignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<WirePositions>,
    #[serde(default, alias = "star", skip_serializing_if = "Option::is_none")]
    pub target: Option<WireCell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialEndReason {
    Captured,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
    TrialStart(TrialStart),
    BoardUpdate(BoardUpdate),
    TrialEnd {
        trial_index: u32,
        reason: TrialEndReason,
    },
    GameOver {
        #[serde(default)]
        results: serde_json::Value,
    },
    Error(ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientRequest {
    JoinGame {
        room_code: RoomCode,
        player_id: PlayerId,
        username: String,
    },
    Move {
        room_code: RoomCode,
        player_id: PlayerId,
        role: Role,
        delta: Delta,
    },
    RequestLiveState {
        room_code: RoomCode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    Positions,
    Target,
    Turn,
    Winner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRejection {
    pub field: UpdateField,
    pub error: ValidationError,
}

impl FieldRejection {
    pub fn new(field: UpdateField, error: ValidationError) -> Self {
        Self { field, error }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrial {
    pub trial_index: u32,
    pub trials_total: Option<u32>,
    pub deadline_ts: Option<DateTime<Utc>>,
    pub view: BoardView,
    pub rejections: Vec<FieldRejection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedUpdate {
    pub patch: BoardPatch,
    /// Set whenever the authority sent a `winner`, even one we could not parse.
    pub terminal: bool,
    pub winner: Option<Role>,
    pub rejections: Vec<FieldRejection>,
}

pub fn wire_cell(cell: Cell) -> WireCell {
    vec![i64::from(cell.x), i64::from(cell.y)]
}

pub fn parse_cell(raw: &[i64], size: u32) -> Result<Cell, ValidationError> {
    let [x, y] = raw else {
        return Err(ValidationError::CoordinateArity {
            coords: raw.to_vec(),
        });
    };
    let in_range = |v: i64| v >= 0 && v < i64::from(size);
    if !in_range(*x) || !in_range(*y) {
        return Err(ValidationError::OutOfBounds {
            x: *x,
            y: *y,
            size,
        });
    }
    // Both values are in [0, size) and size fits in u32.
    Ok(Cell::new(*x as u32, *y as u32))
}

pub fn parse_board_size(raw: i64) -> Result<u32, ValidationError> {
    match u32::try_from(raw) {
        Ok(size) if (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) => Ok(size),
        _ => Err(ValidationError::BoardSize(raw)),
    }
}

fn parse_optional_cell(
    raw: Option<&WireCell>,
    size: u32,
) -> Result<Option<Cell>, ValidationError> {
    raw.map(|coords| parse_cell(coords, size)).transpose()
}

impl TrialStart {
    /// Builds the full replacement view for `me`. Only the board size and the role
    /// assignment are fatal; a bad coordinate leaves that field absent.
    pub fn validate(&self, me: &PlayerId) -> Result<ValidatedTrial, ValidationError> {
        let size = parse_board_size(self.board_size)?;
        let my_role = self
            .role_assignment
            .role_of(me)
            .ok_or_else(|| ValidationError::UnassignedPlayer(me.to_string()))?;

        let mut rejections = Vec::new();
        let r = parse_optional_cell(self.start_positions.r.as_ref(), size);
        let b = parse_optional_cell(self.start_positions.b.as_ref(), size);
        let positions = match (r, b) {
            (Ok(r), Ok(b)) => {
                let positions = Positions::new(r, b);
                if let (true, Some(cell)) = (positions.collides(), positions.r) {
                    rejections.push(FieldRejection::new(
                        UpdateField::Positions,
                        ValidationError::Collision {
                            x: cell.x,
                            y: cell.y,
                        },
                    ));
                    Positions::default()
                } else {
                    positions
                }
            }
            (r, b) => {
                let mut kept = Positions::default();
                match r {
                    Ok(cell) => kept.r = cell,
                    Err(err) => rejections.push(FieldRejection::new(UpdateField::Positions, err)),
                }
                match b {
                    Ok(cell) => kept.b = cell,
                    Err(err) => rejections.push(FieldRejection::new(UpdateField::Positions, err)),
                }
                kept
            }
        };

        let target = match parse_optional_cell(self.target.as_ref(), size) {
            Ok(target) => target,
            Err(err) => {
                rejections.push(FieldRejection::new(UpdateField::Target, err));
                None
            }
        };

        Ok(ValidatedTrial {
            trial_index: self.trial_index,
            trials_total: self.trials_total,
            deadline_ts: self.deadline_ts,
            view: BoardView {
                size,
                positions,
                target,
                capturer: self.capturer,
                turn: self.turn,
                my_role,
            },
            rejections,
        })
    }
}

impl BoardUpdate {
    /// Checks every present field against a board of `size`. A rejected field is
    /// dropped from the patch; the remaining fields still apply.
    pub fn validate(&self, size: u32) -> ValidatedUpdate {
        let mut out = ValidatedUpdate::default();

        if let Some(wire) = &self.positions {
            let r = parse_optional_cell(wire.r.as_ref(), size);
            let b = parse_optional_cell(wire.b.as_ref(), size);
            match (r, b) {
                (Ok(r), Ok(b)) if r.is_some() || b.is_some() => {
                    out.patch.positions = Some(PositionsPatch { r, b });
                }
                (Ok(_), Ok(_)) => {}
                (Err(err), _) | (_, Err(err)) => out
                    .rejections
                    .push(FieldRejection::new(UpdateField::Positions, err)),
            }
        }

        match parse_optional_cell(self.target.as_ref(), size) {
            Ok(target) => out.patch.target = target,
            Err(err) => out
                .rejections
                .push(FieldRejection::new(UpdateField::Target, err)),
        }

        if let Some(raw) = &self.turn {
            match raw.parse::<Role>() {
                Ok(role) => out.patch.turn = Some(role),
                Err(err) => out
                    .rejections
                    .push(FieldRejection::new(UpdateField::Turn, err)),
            }
        }

        if let Some(raw) = &self.winner {
            out.terminal = true;
            match raw.parse::<Role>() {
                Ok(role) => out.winner = Some(role),
                Err(err) => out
                    .rejections
                    .push(FieldRejection::new(UpdateField::Winner, err)),
            }
        }

        out
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
