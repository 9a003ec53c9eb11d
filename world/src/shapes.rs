//! Shape storage and the placement/movement engine.

use invaders_core::{
    AddShapeError, CollisionMask, Contact, Direction, GridPoint, ShapeCategory, ShapeId,
};

/// A placed entity: a local material matrix anchored on the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    id: ShapeId,
    matrix: Vec<Vec<u8>>,
    origin: GridPoint,
    mask: CollisionMask,
    last_contact: Option<Contact>,
}

impl Shape {
    /// Creates a new shape from a rectangular material matrix.
    #[must_use]
    pub fn new(id: ShapeId, matrix: Vec<Vec<u8>>, origin: GridPoint, mask: CollisionMask) -> Self {
        debug_assert!(!matrix.is_empty(), "shape matrix must have rows");
        debug_assert!(
            matrix.iter().all(|row| row.len() == matrix[0].len()),
            "shape matrix must be rectangular"
        );
        Self {
            id,
            matrix,
            origin,
            mask,
            last_contact: None,
        }
    }

    /// Identifier assigned to the shape.
    #[must_use]
    pub const fn id(&self) -> ShapeId {
        self.id
    }

    /// Category derived from the identifier.
    #[must_use]
    pub const fn category(&self) -> ShapeCategory {
        self.id.category()
    }

    /// Top-left anchor in canvas coordinates.
    #[must_use]
    pub const fn origin(&self) -> GridPoint {
        self.origin
    }

    /// The local material matrix.
    #[must_use]
    pub fn matrix(&self) -> &[Vec<u8>] {
        &self.matrix
    }

    /// Collision kinds tested while this shape moves.
    #[must_use]
    pub const fn mask(&self) -> CollisionMask {
        self.mask
    }

    /// Outcome of the most recent aborted move attempt, if any.
    #[must_use]
    pub const fn last_contact(&self) -> Option<Contact> {
        self.last_contact
    }

    /// Reports whether every matrix cell is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.matrix.iter().flatten().all(|&cell| cell == 0)
    }

    /// Reports whether any nonzero cell rasterizes onto a canvas of the
    /// provided dimensions.
    #[must_use]
    pub fn covers_canvas(&self, columns: u32, rows: u32) -> bool {
        self.cells().any(|(cell, _)| on_canvas(cell, columns, rows))
    }

    /// Iterator over nonzero cells as `(absolute coordinate, code)` pairs.
    pub(crate) fn cells(&self) -> impl Iterator<Item = (GridPoint, u8)> + '_ {
        let origin = self.origin;
        self.matrix.iter().enumerate().flat_map(move |(row, line)| {
            line.iter()
                .enumerate()
                .filter(|(_, &code)| code != 0)
                .map(move |(column, &code)| {
                    let cell =
                        GridPoint::new(origin.column() + column as i32, origin.row() + row as i32);
                    (cell, code)
                })
        })
    }

    /// Reports whether a nonzero cell of this shape sits at the absolute
    /// coordinate.
    pub(crate) fn occupies(&self, cell: GridPoint) -> bool {
        self.code_at(cell).is_some()
    }

    /// Nonzero material code at the absolute coordinate, if any.
    fn code_at(&self, cell: GridPoint) -> Option<u8> {
        let row = usize::try_from(cell.row() - self.origin.row()).ok()?;
        let column = usize::try_from(cell.column() - self.origin.column()).ok()?;
        match self.matrix.get(row).and_then(|line| line.get(column)) {
            Some(&code) if code != 0 => Some(code),
            _ => None,
        }
    }

    /// Zeroes the matrix cell at matrix-local coordinates. Returns false
    /// when the coordinate lies outside the matrix.
    pub(crate) fn clear_cell(&mut self, relative: GridPoint) -> bool {
        let (Ok(row), Ok(column)) = (
            usize::try_from(relative.row()),
            usize::try_from(relative.column()),
        ) else {
            return false;
        };
        match self.matrix.get_mut(row).and_then(|line| line.get_mut(column)) {
            Some(cell) => {
                *cell = 0;
                true
            }
            None => false,
        }
    }
}

fn on_canvas(cell: GridPoint, columns: u32, rows: u32) -> bool {
    cell.column() >= 0
        && cell.row() >= 0
        && (cell.column() as u32) < columns
        && (cell.row() as u32) < rows
}

/// Owns every live shape in registration order.
///
/// Registration order is the rasterization tie-break: when two shapes
/// transiently overlap a cell, the later-registered shape's code wins.
/// The order survives removals.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShapeRegistry {
    shapes: Vec<Shape>,
}

impl ShapeRegistry {
    /// Registers a shape, rejecting duplicate identifiers.
    pub(crate) fn insert(&mut self, shape: Shape) -> Result<(), AddShapeError> {
        if self.shapes.iter().any(|existing| existing.id == shape.id) {
            return Err(AddShapeError::DuplicateId(shape.id));
        }
        self.shapes.push(shape);
        Ok(())
    }

    /// Removes and returns the shape with the provided identifier.
    pub(crate) fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.shapes.iter().position(|shape| shape.id == id)?;
        Some(self.shapes.remove(index))
    }

    /// Looks up a shape by identifier.
    pub(crate) fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id == id)
    }

    fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|shape| shape.id == id)
    }

    /// Iterator over all shapes in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// Number of live shapes.
    pub(crate) fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Removes every shape.
    pub(crate) fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Identifiers of every shape in the category, sorted by identifier.
    pub(crate) fn ids_in_category(&self, category: ShapeCategory) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self
            .shapes
            .iter()
            .filter(|shape| shape.category() == category)
            .map(|shape| shape.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Zeroes one cell of a registered shape's matrix in place.
    pub(crate) fn clear_shape_cell(&mut self, id: ShapeId, relative: GridPoint) -> bool {
        self.get_mut(id)
            .map_or(false, |shape| shape.clear_cell(relative))
    }

    /// Attempts to step a shape one cell in the provided direction.
    ///
    /// The candidate origin is tested cell by cell in row-major order:
    /// walls and the floor first, then other live shapes, each only when
    /// the shape's mask lists the kind. The first collision aborts the
    /// move and is recorded on the shape; a clean pass commits the new
    /// origin and clears the recorded contact. Off-canvas candidate cells
    /// never collide with other shapes, since only rasterized cells exist
    /// to collide with.
    pub(crate) fn attempt_move(&mut self, id: ShapeId, direction: Direction, columns: u32, rows: u32) {
        let Some(index) = self.shapes.iter().position(|shape| shape.id == id) else {
            return;
        };

        let contact = {
            let shape = &self.shapes[index];
            let candidate = shape.origin.translated(direction);
            let moved = Shape {
                origin: candidate,
                ..shape.clone()
            };
            self.first_contact(index, &moved, columns, rows)
        };

        let shape = &mut self.shapes[index];
        match contact {
            Some(contact) => shape.last_contact = Some(contact),
            None => {
                shape.origin = shape.origin.translated(direction);
                shape.last_contact = None;
            }
        }
    }

    fn first_contact(
        &self,
        moving_index: usize,
        moved: &Shape,
        columns: u32,
        rows: u32,
    ) -> Option<Contact> {
        let mask = moved.mask;
        for (cell, _) in moved.cells() {
            if cell.column() < 0 && mask.tests_left_wall() {
                return Some(Contact::LeftWall);
            }
            if cell.column() >= 0 && cell.column() as u32 >= columns && mask.tests_right_wall() {
                return Some(Contact::RightWall);
            }
            if cell.row() >= 0 && cell.row() as u32 >= rows && mask.tests_floor() {
                return Some(Contact::Floor);
            }
            if !mask.tests_shapes() || !on_canvas(cell, columns, rows) {
                continue;
            }
            for (other_index, other) in self.shapes.iter().enumerate() {
                if other_index == moving_index || !other.occupies(cell) {
                    continue;
                }
                let relative = GridPoint::new(
                    cell.column() - other.origin.column(),
                    cell.row() - other.origin.row(),
                );
                return Some(Contact::Shape {
                    id: other.id,
                    at: cell,
                    relative,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Shape, ShapeRegistry};
    use invaders_core::{
        AddShapeError, CollisionMask, Contact, Direction, GridPoint, ShapeId,
    };

    fn block(id: ShapeId, origin: GridPoint) -> Shape {
        Shape::new(id, vec![vec![9, 9], vec![9, 9]], origin, CollisionMask::all())
    }

    #[test]
    fn duplicate_identifiers_are_rejected() {
        let mut registry = ShapeRegistry::default();
        registry
            .insert(block(ShapeId::Base(0), GridPoint::new(1, 1)))
            .expect("first registration succeeds");
        let error = registry
            .insert(block(ShapeId::Base(0), GridPoint::new(5, 5)))
            .expect_err("second registration is rejected");
        assert_eq!(error, AddShapeError::DuplicateId(ShapeId::Base(0)));
    }

    #[test]
    fn clean_move_commits_and_clears_contact() {
        let mut registry = ShapeRegistry::default();
        registry
            .insert(block(ShapeId::Base(0), GridPoint::new(0, 0)))
            .expect("registration succeeds");

        registry.attempt_move(ShapeId::Base(0), Direction::Left, 10, 10);
        let shape = registry.get(ShapeId::Base(0)).expect("shape exists");
        assert_eq!(shape.last_contact(), Some(Contact::LeftWall));
        assert_eq!(shape.origin(), GridPoint::new(0, 0));

        registry.attempt_move(ShapeId::Base(0), Direction::Right, 10, 10);
        let shape = registry.get(ShapeId::Base(0)).expect("shape exists");
        assert_eq!(shape.last_contact(), None);
        assert_eq!(shape.origin(), GridPoint::new(1, 0));
    }

    #[test]
    fn shape_contact_records_target_and_relative_cell() {
        let mut registry = ShapeRegistry::default();
        registry
            .insert(block(ShapeId::Base(0), GridPoint::new(0, 0)))
            .expect("registration succeeds");
        registry
            .insert(block(ShapeId::Base(1), GridPoint::new(3, 0)))
            .expect("registration succeeds");

        registry.attempt_move(ShapeId::Base(0), Direction::Right, 10, 10);
        let shape = registry.get(ShapeId::Base(0)).expect("shape exists");
        assert_eq!(
            shape.last_contact(),
            Some(Contact::Shape {
                id: ShapeId::Base(1),
                at: GridPoint::new(3, 0),
                relative: GridPoint::new(0, 0),
            })
        );
        assert_eq!(shape.origin(), GridPoint::new(0, 0));
    }

    #[test]
    fn masked_shapes_slide_past_walls() {
        let mut registry = ShapeRegistry::default();
        let ship = Shape::new(
            ShapeId::BonusShip(0),
            vec![vec![6, 6, 6]],
            GridPoint::new(-2, 0),
            CollisionMask::shapes_only(),
        );
        registry.insert(ship).expect("registration succeeds");

        registry.attempt_move(ShapeId::BonusShip(0), Direction::Left, 10, 10);
        let shape = registry.get(ShapeId::BonusShip(0)).expect("shape exists");
        assert_eq!(shape.origin(), GridPoint::new(-3, 0));
        assert_eq!(shape.last_contact(), None);
    }

    #[test]
    fn zero_cells_never_collide() {
        let mut registry = ShapeRegistry::default();
        let hollow = Shape::new(
            ShapeId::Base(0),
            vec![vec![0, 4], vec![0, 4]],
            GridPoint::new(0, 0),
            CollisionMask::all(),
        );
        registry.insert(hollow).expect("registration succeeds");
        registry
            .insert(block(ShapeId::Base(1), GridPoint::new(3, 0)))
            .expect("registration succeeds");

        // The hollow column at local column 0 passes over nothing.
        registry.attempt_move(ShapeId::Base(0), Direction::Left, 10, 10);
        let shape = registry.get(ShapeId::Base(0)).expect("shape exists");
        assert_eq!(shape.origin(), GridPoint::new(-1, 0));
    }
}
