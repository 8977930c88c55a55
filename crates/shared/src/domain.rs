use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(PlayerId);
id_newtype!(RoomCode);

impl PlayerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }
}

impl RoomCode {
    /// Room codes are case-insensitive on the authority side; keep them upper-cased.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    R,
    B,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::R, Role::B];

    pub fn opponent(self) -> Role {
        match self {
            Role::R => Role::B,
            Role::B => Role::R,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::R => "R",
            Role::B => "B",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Same spelling serde accepts for `Role`: exactly `R` or `B`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R" => Ok(Role::R),
            "B" => Ok(Role::B),
            other => Err(ValidationError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(self, size: u32) -> bool {
        self.x < size && self.y < size
    }

    /// Destination after applying `delta`, or `None` once it leaves `[0, size)²`.
    pub fn offset(self, delta: Delta, size: u32) -> Option<Cell> {
        let x = self.x.checked_add_signed(delta.dx)?;
        let y = self.y.checked_add_signed(delta.dy)?;
        let next = Cell::new(x, y);
        next.in_bounds(size).then_some(next)
    }

    pub fn is_dark(self) -> bool {
        (self.x + self.y) % 2 == 1
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDelta", into = "RawDelta")]
pub struct Delta {
    dx: i32,
    dy: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawDelta {
    dx: i32,
    dy: i32,
}

impl Delta {
    pub fn new(dx: i32, dy: i32) -> Result<Self, ValidationError> {
        match (dx, dy) {
            (-1 | 1, 0) | (0, -1 | 1) => Ok(Self { dx, dy }),
            _ => Err(ValidationError::InvalidDelta { dx, dy }),
        }
    }

    pub fn dx(self) -> i32 {
        self.dx
    }

    pub fn dy(self) -> i32 {
        self.dy
    }
}

impl TryFrom<RawDelta> for Delta {
    type Error = ValidationError;

    fn try_from(raw: RawDelta) -> Result<Self, Self::Error> {
        Delta::new(raw.dx, raw.dy)
    }
}

impl From<Delta> for RawDelta {
    fn from(delta: Delta) -> Self {
        RawDelta {
            dx: delta.dx,
            dy: delta.dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> Delta {
        match self {
            Direction::Up => Delta { dx: 0, dy: -1 },
            Direction::Down => Delta { dx: 0, dy: 1 },
            Direction::Left => Delta { dx: -1, dy: 0 },
            Direction::Right => Delta { dx: 1, dy: 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Positions {
    pub r: Option<Cell>,
    pub b: Option<Cell>,
}

impl Positions {
    pub fn new(r: Option<Cell>, b: Option<Cell>) -> Self {
        Self { r, b }
    }

    pub fn get(&self, role: Role) -> Option<Cell> {
        match role {
            Role::R => self.r,
            Role::B => self.b,
        }
    }

    pub fn occupant(&self, cell: Cell) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| self.get(*role) == Some(cell))
    }

    pub fn collides(&self) -> bool {
        matches!((self.r, self.b), (Some(r), Some(b)) if r == b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub size: u32,
    pub positions: Positions,
    pub target: Option<Cell>,
    pub capturer: Role,
    pub turn: Role,
    pub my_role: Role,
}

impl BoardView {
    pub fn is_my_turn(&self) -> bool {
        self.turn == self.my_role
    }

    pub fn my_position(&self) -> Option<Cell> {
        self.positions.get(self.my_role)
    }

    pub fn opponent_position(&self) -> Option<Cell> {
        self.positions.get(self.my_role.opponent())
    }

    pub fn i_am_capturer(&self) -> bool {
        self.capturer == self.my_role
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub role: Role,
    pub delta: Delta,
}

/// Replacement for both piece slots. `None` keeps the stored value for that role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionsPatch {
    pub r: Option<Cell>,
    pub b: Option<Cell>,
}

impl PositionsPatch {
    pub fn apply_to(&self, current: Positions) -> Positions {
        Positions {
            r: self.r.or(current.r),
            b: self.b.or(current.b),
        }
    }
}

/// Field-level update of a [`BoardView`]; absent fields mean "unchanged", never "cleared".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardPatch {
    pub positions: Option<PositionsPatch>,
    pub target: Option<Cell>,
    pub turn: Option<Role>,
}

impl BoardPatch {
    pub fn is_empty(&self) -> bool {
        self.positions.is_none() && self.target.is_none() && self.turn.is_none()
    }
}
