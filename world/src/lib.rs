#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the invaders engine.
//!
//! A [`Session`] owns the shape registry, the rasterized canvas, and all
//! game progress (score, lives, formation state, pending effects).
//! Adapters and systems mutate it exclusively through [`apply`], which
//! executes a [`Command`] and broadcasts [`Event`] values; read access goes
//! through the [`query`] module. The session is synchronous and
//! cadence-agnostic: callers decide when each tick command fires.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use invaders_core::{
    AddShapeError, CollisionMask, Command, Contact, Direction, EffectEvent, EffectKind, Event,
    GridPoint, Lateral, ShapeCategory, ShapeId,
};

mod grid;
mod shapes;

pub use grid::Canvas;
pub use shapes::Shape;

use shapes::ShapeRegistry;

const DEFAULT_SCALE: u32 = 80;
const DEFAULT_RNG_SEED: u64 = 0x7c39_b1a4_02ef_5d11;

const STARTING_LIVES: u8 = 3;
const ENEMY_KILL_SCORE: u32 = 50;
const BONUS_KILL_SCORE: u32 = 250;

const FORMATION_ROWS: u8 = 5;
const ENEMIES_PER_ROW: u8 = 9;
const BASE_COUNT: u8 = 4;
const BONUS_ENTRY_ROW: i32 = 10;

/// Construction-time configuration for a session.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    scale: u32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with an explicit canvas side length and
    /// enemy-fire RNG seed.
    #[must_use]
    pub const fn new(scale: u32, rng_seed: u64) -> Self {
        Self { scale, rng_seed }
    }

    /// Side length of the square canvas, in cells.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.scale
    }

    /// Seed for the enemy-fire selection RNG.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE, DEFAULT_RNG_SEED)
    }
}

/// Represents one complete run of the game, from spawn to game over.
#[derive(Debug)]
pub struct Session {
    config: Config,
    shapes: ShapeRegistry,
    effects: BTreeMap<GridPoint, EffectKind>,
    score: u32,
    lives: u8,
    game_over: bool,
    formation_cursor: u8,
    formation_direction: Lateral,
    next_particle: u32,
    rng: ChaCha8Rng,
}

impl Session {
    /// Creates a session populated with the initial roster: the tank, the
    /// enemy formation, and the bases.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut session = Self {
            config,
            shapes: ShapeRegistry::default(),
            effects: BTreeMap::new(),
            score: 0,
            lives: STARTING_LIVES,
            game_over: false,
            formation_cursor: FORMATION_ROWS - 1,
            formation_direction: Lateral::Right,
            next_particle: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed()),
        };
        session.rebuild();
        session
    }

    /// Registers a shape on the canvas.
    ///
    /// Fails with [`AddShapeError::DuplicateId`] when the identifier is
    /// taken and with [`AddShapeError::OutOfBounds`] when no cell lands on
    /// the canvas. Overlap with existing shapes is permitted: spawns may
    /// materialize inside other shapes and resolve on the next collision
    /// pass.
    pub fn add_to_canvas(&mut self, shape: Shape) -> Result<(), AddShapeError> {
        let scale = self.config.scale();
        if !shape.covers_canvas(scale, scale) {
            return Err(AddShapeError::OutOfBounds(shape.id()));
        }
        self.shapes.insert(shape)
    }

    /// Removes and returns the shape with the provided identifier.
    pub fn remove_from_canvas(&mut self, id: ShapeId) -> Option<Shape> {
        self.shapes.remove(id)
    }

    /// Returns the accumulated effects in position order and clears the
    /// buffer. Effects coalesce by position while buffered, so repeated
    /// hits at one cell yield a single entry.
    pub fn drain_effects(&mut self) -> Vec<EffectEvent> {
        let drained = std::mem::take(&mut self.effects);
        drained
            .into_iter()
            .map(|(at, kind)| EffectEvent { at, kind })
            .collect()
    }

    fn rebuild(&mut self) {
        self.shapes.clear();
        self.effects.clear();
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.game_over = false;
        self.formation_cursor = FORMATION_ROWS - 1;
        self.formation_direction = Lateral::Right;
        self.next_particle = 0;
        self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed());

        let scale = self.config.scale();
        self.spawn(tank_shape(scale));
        for enemy in enemy_shapes() {
            self.spawn(enemy);
        }
        for base in base_shapes(scale) {
            self.spawn(base);
        }
    }

    /// Registers a shape fire-and-forget: placements with no canvas cell
    /// drop silently, duplicate identifiers indicate a serial-allocation
    /// bug and trip a debug assertion.
    fn spawn(&mut self, shape: Shape) {
        match self.add_to_canvas(shape) {
            Ok(()) | Err(AddShapeError::OutOfBounds(_)) => {}
            Err(AddShapeError::DuplicateId(id)) => {
                debug_assert!(false, "spawned shape `{id}` is already registered");
            }
        }
    }

    fn next_serial(&mut self) -> u32 {
        let serial = self.next_particle;
        self.next_particle = self.next_particle.wrapping_add(1);
        serial
    }

    fn move_tank(&mut self, direction: Lateral) {
        let scale = self.config.scale();
        self.shapes
            .attempt_move(ShapeId::Tank, direction.into(), scale, scale);
    }

    fn fire_tank(&mut self) {
        let Some(tank) = self.shapes.get(ShapeId::Tank) else {
            return;
        };
        let origin = GridPoint::new(
            tank.origin().column() + 2,
            self.config.scale() as i32 - 5,
        );
        let serial = self.next_serial();
        self.spawn(player_bullet_shape(serial, origin));
    }

    fn tick_particles(&mut self, out_events: &mut Vec<Event>) {
        let scale = self.config.scale();
        for id in self.shapes.ids_in_category(ShapeCategory::PlayerBullet) {
            self.shapes.attempt_move(id, Direction::Up, scale, scale);
        }
        for id in self.shapes.ids_in_category(ShapeCategory::EnemyBullet) {
            self.shapes.attempt_move(id, Direction::Down, scale, scale);
        }
        self.cull_out_of_bounds();
        self.resolve_bullet_hits(out_events);
    }

    fn cull_out_of_bounds(&mut self) {
        let scale = self.config.scale();
        let doomed: Vec<ShapeId> = self
            .shapes
            .iter()
            .filter(|shape| !shape.covers_canvas(scale, scale))
            .map(Shape::id)
            .collect();
        for id in doomed {
            let _ = self.shapes.remove(id);
        }
    }

    fn resolve_bullet_hits(&mut self, out_events: &mut Vec<Event>) {
        let pending: Vec<ShapeId> = self
            .shapes
            .iter()
            .filter(|shape| shape.id().is_bullet() && shape.last_contact().is_some())
            .map(Shape::id)
            .collect();

        for id in pending {
            // A bullet collected here may already be gone: an earlier
            // bullet in the same pass can strike it.
            let Some(bullet) = self.shapes.get(id) else {
                continue;
            };
            match bullet.last_contact() {
                Some(Contact::Shape { id: target, at, relative }) => {
                    self.resolve_shape_hit(target, at, relative, out_events);
                    let _ = self.shapes.remove(id);
                }
                Some(_) => {
                    let _ = self.shapes.remove(id);
                }
                None => {}
            }
        }
    }

    fn resolve_shape_hit(
        &mut self,
        target: ShapeId,
        at: GridPoint,
        relative: GridPoint,
        out_events: &mut Vec<Event>,
    ) {
        let Some(struck) = self.shapes.get(target) else {
            return;
        };
        let origin = struck.origin();

        match target.category() {
            ShapeCategory::PlayerBullet | ShapeCategory::EnemyBullet => {
                let _ = self.shapes.remove(target);
            }
            ShapeCategory::Enemy => {
                let _ = self.shapes.remove(target);
                self.raise_effect(origin, EffectKind::EnemyExplosion);
                self.award(ENEMY_KILL_SCORE, out_events);
                out_events.push(Event::EnemyDestroyed { id: target, at: origin });
            }
            ShapeCategory::BonusShip => {
                let _ = self.shapes.remove(target);
                self.raise_effect(origin, EffectKind::BonusShipExplosion);
                self.award(BONUS_KILL_SCORE, out_events);
                out_events.push(Event::BonusShipDestroyed { id: target, at: origin });
            }
            ShapeCategory::Tank => {
                self.raise_effect(origin, EffectKind::TankExplosion);
                self.lives = self.lives.saturating_sub(1);
                out_events.push(Event::LivesChanged { lives: self.lives });
                if self.lives == 0 && !self.game_over {
                    self.game_over = true;
                    out_events.push(Event::GameOver);
                }
                let _ = self.shapes.remove(target);
                out_events.push(Event::TankDestroyed { at: origin });
                // The tank respawns at the default origin even on the
                // final life; the pacing layer stops ticking instead.
                self.spawn(tank_shape(self.config.scale()));
            }
            ShapeCategory::Base => {
                if self.shapes.clear_shape_cell(target, relative) {
                    self.raise_effect(at, EffectKind::BaseHit);
                    out_events.push(Event::BaseDamaged { id: target, at });
                }
                let blank = self.shapes.get(target).map_or(false, Shape::is_blank);
                if blank {
                    let _ = self.shapes.remove(target);
                }
            }
        }
    }

    fn tick_formation(&mut self, out_events: &mut Vec<Event>) {
        let scale = self.config.scale();
        let row = self.formation_cursor;
        let members: Vec<ShapeId> = self
            .shapes
            .ids_in_category(ShapeCategory::Enemy)
            .into_iter()
            .filter(|id| matches!(id, ShapeId::Enemy { line, .. } if *line == row))
            .collect();

        let mut step: Direction = self.formation_direction.into();
        let mut next = self.formation_direction;

        if let Some(&first) = members.first() {
            if self.contact_of(first) == Some(Contact::LeftWall) {
                step = Direction::Down;
                next = Lateral::Right;
            }
        }
        if let Some(&last) = members.last() {
            if self.contact_of(last) == Some(Contact::RightWall) {
                step = Direction::Down;
                next = Lateral::Left;
            }
        }

        if next != self.formation_direction {
            out_events.push(Event::FormationReversed { next });
        }

        for id in &members {
            self.shapes.attempt_move(*id, step, scale, scale);
        }
        self.formation_direction = next;
        self.formation_cursor = if row == 0 { FORMATION_ROWS - 1 } else { row - 1 };
    }

    fn contact_of(&self, id: ShapeId) -> Option<Contact> {
        self.shapes.get(id).and_then(|shape| shape.last_contact())
    }

    fn tick_enemy_fire(&mut self) {
        let enemies = self.shapes.ids_in_category(ShapeCategory::Enemy);
        let Some(&last) = enemies.last() else {
            return;
        };
        let ShapeId::Enemy { line: front, .. } = last else {
            return;
        };

        let front_line: Vec<ShapeId> = enemies
            .into_iter()
            .filter(|id| matches!(id, ShapeId::Enemy { line, .. } if *line == front))
            .collect();
        let chosen = front_line[self.rng.gen_range(0..front_line.len())];

        let Some(shooter) = self.shapes.get(chosen) else {
            return;
        };
        let origin = GridPoint::new(
            shooter.origin().column() + 1,
            shooter.origin().row() + 2,
        );
        let serial = self.next_serial();
        self.spawn(enemy_bullet_shape(serial, origin));
    }

    fn tick_bonus_ship(&mut self) {
        let scale = self.config.scale();
        let ships = self.shapes.ids_in_category(ShapeCategory::BonusShip);
        match ships.first() {
            Some(&id) => self.shapes.attempt_move(id, Direction::Right, scale, scale),
            None => {
                let serial = self.next_serial();
                self.spawn(bonus_ship_shape(serial));
            }
        }
    }

    fn award(&mut self, points: u32, out_events: &mut Vec<Event>) {
        self.score = self.score.saturating_add(points);
        out_events.push(Event::ScoreChanged { score: self.score });
    }

    fn raise_effect(&mut self, at: GridPoint, kind: EffectKind) {
        let _ = self.effects.insert(at, kind);
    }
}

/// Applies the provided command to the session, mutating state
/// deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::MoveTank { direction } => session.move_tank(direction),
        Command::FireTank => session.fire_tank(),
        Command::TickParticles => session.tick_particles(out_events),
        Command::TickFormation => session.tick_formation(out_events),
        Command::TickEnemyFire => session.tick_enemy_fire(),
        Command::TickBonusShip => session.tick_bonus_ship(),
        Command::Reset => {
            session.rebuild();
            out_events.push(Event::SessionReset);
        }
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use invaders_core::{ShapeCategory, ShapeSnapshot, ShapeView};

    use super::{Canvas, Session, Shape};

    /// Rasterizes the live shapes into a fresh canvas of material codes.
    #[must_use]
    pub fn canvas(session: &Session) -> Canvas {
        let (columns, rows) = dimensions(session);
        Canvas::rasterize(columns, rows, session.shapes.iter())
    }

    /// Canvas dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(session: &Session) -> (u32, u32) {
        let scale = session.config.scale();
        (scale, scale)
    }

    /// Accumulated score.
    #[must_use]
    pub fn score(session: &Session) -> u32 {
        session.score
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(session: &Session) -> u8 {
        session.lives
    }

    /// Reports whether the last life has been lost.
    #[must_use]
    pub fn is_over(session: &Session) -> bool {
        session.game_over
    }

    /// Captures a read-only view of every live shape, ordered by
    /// identifier.
    #[must_use]
    pub fn shape_view(session: &Session) -> ShapeView {
        let mut snapshots = Vec::with_capacity(session.shapes.len());
        for shape in session.shapes.iter() {
            snapshots.push(snapshot_of(shape));
        }
        ShapeView::from_snapshots(snapshots)
    }

    /// Snapshots of the live shapes in one category, ordered by
    /// identifier.
    #[must_use]
    pub fn shapes_in_category(session: &Session, category: ShapeCategory) -> Vec<ShapeSnapshot> {
        let mut snapshots: Vec<ShapeSnapshot> = session
            .shapes
            .iter()
            .filter(|shape| shape.category() == category)
            .map(snapshot_of)
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    fn snapshot_of(shape: &Shape) -> ShapeSnapshot {
        ShapeSnapshot {
            id: shape.id(),
            category: shape.category(),
            origin: shape.origin(),
            matrix: shape.matrix().to_vec(),
            last_contact: shape.last_contact(),
        }
    }
}

fn tank_shape(scale: u32) -> Shape {
    let matrix = vec![
        vec![0, 0, 1, 0, 0],
        vec![1, 1, 1, 1, 1],
        vec![1, 1, 1, 1, 1],
    ];
    let origin = GridPoint::new(scale as i32 / 2, scale as i32 - matrix.len() as i32);
    Shape::new(ShapeId::Tank, matrix, origin, CollisionMask::all())
}

fn enemy_shapes() -> Vec<Shape> {
    let mut shapes = Vec::with_capacity(usize::from(FORMATION_ROWS) * usize::from(ENEMIES_PER_ROW));
    for line in 0..FORMATION_ROWS {
        let row = i32::from(line) * 6 + 10;
        for slot in 0..ENEMIES_PER_ROW {
            let matrix = vec![vec![2, 2, 2], vec![2, 2, 2]];
            let width = matrix[0].len() as i32;
            let column = width + i32::from(slot) * (width + 4);
            shapes.push(Shape::new(
                ShapeId::Enemy { line, slot },
                matrix,
                GridPoint::new(column, row),
                CollisionMask::all(),
            ));
        }
    }
    shapes
}

fn base_shapes(scale: u32) -> Vec<Shape> {
    let mut shapes = Vec::with_capacity(usize::from(BASE_COUNT));
    for index in 0..BASE_COUNT {
        let matrix = vec![
            vec![4, 4, 4, 4, 4, 4, 4],
            vec![4, 4, 4, 4, 4, 4, 4],
            vec![4, 4, 4, 4, 4, 4, 4],
            vec![4, 4, 0, 0, 0, 4, 4],
            vec![4, 4, 0, 0, 0, 4, 4],
        ];
        let width = matrix[0].len() as i32;
        let height = matrix.len() as i32;
        let column = width + i32::from(index) * (width + 12);
        let row = scale as i32 - height * 3;
        shapes.push(Shape::new(
            ShapeId::Base(index),
            matrix,
            GridPoint::new(column, row),
            CollisionMask::shapes_only(),
        ));
    }
    shapes
}

fn player_bullet_shape(serial: u32, origin: GridPoint) -> Shape {
    Shape::new(
        ShapeId::PlayerBullet(serial),
        vec![vec![3], vec![3]],
        origin,
        CollisionMask::shapes_only(),
    )
}

fn enemy_bullet_shape(serial: u32, origin: GridPoint) -> Shape {
    Shape::new(
        ShapeId::EnemyBullet(serial),
        vec![vec![5]],
        origin,
        CollisionMask::shapes_only(),
    )
}

fn bonus_ship_shape(serial: u32) -> Shape {
    let matrix = vec![vec![6, 6, 6, 6, 6], vec![6, 6, 6, 6, 6]];
    // Entry origin keeps exactly one column on-canvas so registration
    // succeeds; the ship slides in from the left edge.
    let column = 1 - matrix[0].len() as i32;
    Shape::new(
        ShapeId::BonusShip(serial),
        matrix,
        GridPoint::new(column, BONUS_ENTRY_ROW),
        CollisionMask::shapes_only(),
    )
}
