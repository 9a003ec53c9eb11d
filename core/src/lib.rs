#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the invaders engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the session executes
//! those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values for systems to react to deterministically. Read access
//! goes through immutable snapshot types defined here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier assigned to a placed shape.
///
/// The variant carries the shape's category, so resolution code dispatches
/// on structure rather than parsing identifier text. The derived ordering is
/// load-bearing: enemies sort by `(line, slot)`, which determines the
/// left-most and right-most member of a formation row and the front line
/// targeted for enemy fire.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ShapeId {
    /// The single player-controlled tank.
    Tank,
    /// A formation enemy, addressed by row and column within the wave.
    Enemy {
        /// Formation row, 0 at the top.
        line: u8,
        /// Position within the row, 0 at the left.
        slot: u8,
    },
    /// A bullet fired by the tank, numbered by a per-session serial.
    PlayerBullet(u32),
    /// A bullet fired by an enemy, numbered by a per-session serial.
    EnemyBullet(u32),
    /// A destructible base, numbered left to right.
    Base(u8),
    /// The bonus ship crossing the top of the canvas.
    BonusShip(u32),
}

impl ShapeId {
    /// Category the identifier belongs to.
    #[must_use]
    pub const fn category(&self) -> ShapeCategory {
        match self {
            Self::Tank => ShapeCategory::Tank,
            Self::Enemy { .. } => ShapeCategory::Enemy,
            Self::PlayerBullet(_) => ShapeCategory::PlayerBullet,
            Self::EnemyBullet(_) => ShapeCategory::EnemyBullet,
            Self::Base(_) => ShapeCategory::Base,
            Self::BonusShip(_) => ShapeCategory::BonusShip,
        }
    }

    /// Reports whether the identifier names either kind of bullet.
    #[must_use]
    pub const fn is_bullet(&self) -> bool {
        matches!(self, Self::PlayerBullet(_) | Self::EnemyBullet(_))
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tank => write!(f, "tank"),
            Self::Enemy { line, slot } => write!(f, "enemy_line_{line}_id_{slot}"),
            Self::PlayerBullet(serial) => write!(f, "bullet_{serial}"),
            Self::EnemyBullet(serial) => write!(f, "enemyBullet_{serial}"),
            Self::Base(index) => write!(f, "base_{index}"),
            Self::BonusShip(serial) => write!(f, "bonusShip_{serial}"),
        }
    }
}

/// Category of a placed shape, derived from its identifier variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeCategory {
    /// The player-controlled tank.
    Tank,
    /// A formation enemy.
    Enemy,
    /// A bullet travelling upward, fired by the tank.
    PlayerBullet,
    /// A bullet travelling downward, fired by an enemy.
    EnemyBullet,
    /// A destructible base.
    Base,
    /// The bonus ship.
    BonusShip,
}

impl ShapeCategory {
    /// Canvas cell code rendered for this category.
    ///
    /// Zero is reserved for empty cells.
    #[must_use]
    pub const fn cell_code(self) -> u8 {
        match self {
            Self::Tank => 1,
            Self::Enemy => 2,
            Self::PlayerBullet => 3,
            Self::Base => 4,
            Self::EnemyBullet => 5,
            Self::BonusShip => 6,
        }
    }
}

/// Location of a single canvas cell expressed as column and row coordinates.
///
/// Coordinates are signed: shape origins travel through negative columns
/// and rows while sliding onto or off the canvas.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPoint {
    column: i32,
    row: i32,
}

impl GridPoint {
    /// Creates a new canvas coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the point shifted one cell in the provided direction.
    #[must_use]
    pub const fn translated(self, direction: Direction) -> Self {
        let (column_delta, row_delta) = direction.offset();
        Self {
            column: self.column + column_delta,
            row: self.row + row_delta,
        }
    }
}

/// Horizontal movement directions available to the tank and the formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lateral {
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

/// Unit movement directions on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
}

impl Direction {
    /// Unit vector for the direction as `(column delta, row delta)`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

impl From<Lateral> for Direction {
    fn from(lateral: Lateral) -> Self {
        match lateral {
            Lateral::Left => Self::Left,
            Lateral::Right => Self::Right,
        }
    }
}

/// Collision kinds a shape tests for while moving.
///
/// Kinds absent from the mask are not tested, which lets masked shapes
/// slide off the canvas: bullets pass the top and the floor, the bonus
/// ship crosses both walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionMask {
    left_wall: bool,
    right_wall: bool,
    floor: bool,
    shapes: bool,
}

impl CollisionMask {
    /// Mask testing every collision kind.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            left_wall: true,
            right_wall: true,
            floor: true,
            shapes: true,
        }
    }

    /// Mask testing only collisions with other shapes.
    #[must_use]
    pub const fn shapes_only() -> Self {
        Self {
            left_wall: false,
            right_wall: false,
            floor: false,
            shapes: true,
        }
    }

    /// Reports whether the mask tests the left wall.
    #[must_use]
    pub const fn tests_left_wall(&self) -> bool {
        self.left_wall
    }

    /// Reports whether the mask tests the right wall.
    #[must_use]
    pub const fn tests_right_wall(&self) -> bool {
        self.right_wall
    }

    /// Reports whether the mask tests the floor.
    #[must_use]
    pub const fn tests_floor(&self) -> bool {
        self.floor
    }

    /// Reports whether the mask tests other shapes.
    #[must_use]
    pub const fn tests_shapes(&self) -> bool {
        self.shapes
    }
}

/// Outcome of a shape's most recent aborted move attempt.
///
/// Aborted moves are first-class state consumed by the collision resolver
/// and the formation controller, never errors: each tick deliberately
/// attempts moves that are expected to fail at walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    /// A cell would have crossed the left canvas edge.
    LeftWall,
    /// A cell would have crossed the right canvas edge.
    RightWall,
    /// A cell would have crossed the bottom canvas edge.
    Floor,
    /// A cell would have entered another live shape.
    Shape {
        /// Identifier of the shape that was struck.
        id: ShapeId,
        /// Absolute canvas coordinate of the struck cell.
        at: GridPoint,
        /// The struck cell expressed in the struck shape's matrix
        /// coordinates.
        relative: GridPoint,
    },
}

/// Kinds of transient visual effects raised by the collision resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// An enemy was destroyed.
    EnemyExplosion,
    /// The tank was destroyed.
    TankExplosion,
    /// A base cell was knocked out.
    BaseHit,
    /// The bonus ship was destroyed.
    BonusShipExplosion,
}

/// Transient, position-keyed marker consumed by a presentation layer.
///
/// Repeated hits at the same cell coalesce to the most recent kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectEvent {
    /// Canvas coordinate the effect plays at.
    pub at: GridPoint,
    /// Kind of effect to play.
    pub kind: EffectKind,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Steps the tank one cell left or right.
    MoveTank {
        /// Direction of travel for the attempted step.
        direction: Lateral,
    },
    /// Spawns a player bullet above the tank. Fire-rate limiting is the
    /// pacing system's concern; the session always obeys.
    FireTank,
    /// Advances every bullet one cell, culls shapes that left the canvas,
    /// and runs the collision resolver.
    TickParticles,
    /// Advances the current formation row and updates the formation
    /// direction state machine.
    TickFormation,
    /// Selects a front-line enemy and spawns a downward bullet below it.
    TickEnemyFire,
    /// Moves the bonus ship right, or spawns one when none is live.
    TickBonusShip,
    /// Rebuilds the initial registry and zeroes all session progress.
    Reset,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The score changed after a kill.
    ScoreChanged {
        /// Total score after the change.
        score: u32,
    },
    /// The tank was hit and the remaining lives changed.
    LivesChanged {
        /// Remaining lives after the change.
        lives: u8,
    },
    /// The last life was lost; the session is over until reset.
    GameOver,
    /// A formation enemy was destroyed by a bullet.
    EnemyDestroyed {
        /// Identifier of the destroyed enemy.
        id: ShapeId,
        /// Origin the enemy occupied when destroyed.
        at: GridPoint,
    },
    /// The bonus ship was destroyed by a bullet.
    BonusShipDestroyed {
        /// Identifier of the destroyed ship.
        id: ShapeId,
        /// Origin the ship occupied when destroyed.
        at: GridPoint,
    },
    /// A base lost one matrix cell to a bullet.
    BaseDamaged {
        /// Identifier of the damaged base.
        id: ShapeId,
        /// Absolute coordinate of the knocked-out cell.
        at: GridPoint,
    },
    /// The tank was destroyed; a fresh tank respawns immediately.
    TankDestroyed {
        /// Origin the tank occupied when destroyed.
        at: GridPoint,
    },
    /// The formation's horizontal direction flipped at a wall.
    FormationReversed {
        /// Direction the formation travels from the next tick on.
        next: Lateral,
    },
    /// The session was rebuilt to its initial state.
    SessionReset,
}

/// Errors surfaced when registering a shape on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum AddShapeError {
    /// A shape with the same identifier is already registered. This is a
    /// programming error and is always surfaced to the caller.
    #[error("shape `{0}` is already registered")]
    DuplicateId(ShapeId),
    /// No cell of the shape lands on the canvas at its initial origin.
    /// Spawns hitting this are dropped silently by convention.
    #[error("shape `{0}` has no cell on the canvas")]
    OutOfBounds(ShapeId),
}

/// Immutable representation of a single shape's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeSnapshot {
    /// Unique identifier assigned to the shape.
    pub id: ShapeId,
    /// Category derived from the identifier.
    pub category: ShapeCategory,
    /// Top-left anchor of the shape in canvas coordinates.
    pub origin: GridPoint,
    /// Local material matrix; zero cells are empty.
    pub matrix: Vec<Vec<u8>>,
    /// Outcome of the most recent aborted move attempt, if any.
    pub last_contact: Option<Contact>,
}

/// Read-only snapshot describing shapes, ordered by identifier.
#[derive(Clone, Debug, Default)]
pub struct ShapeView {
    snapshots: Vec<ShapeSnapshot>,
}

impl ShapeView {
    /// Creates a new view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ShapeSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &ShapeSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ShapeSnapshot> {
        self.snapshots
    }
}
