/// Tile grid geometry: world units, cell mapping, rectangles.
///
/// World space is y-up: row 0 is the bottom floor row of the room and the
/// door sits in the top wall. The renderer flips y when drawing.
///
/// Every tile is `TILE_SIZE` world units square. A cell maps to the world
/// position of its center:
///
///   position = coord * TILE_SIZE + TILE_SIZE / 2

/// Edge length of one tile in world units.
pub const TILE_SIZE: f32 = 16.0;

/// Room extents in tiles (interior cells, walls excluded).
pub const ROOM_COLS: i32 = 10;
pub const ROOM_ROWS: i32 = 7;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }

    /// Linear interpolation: t = 0 → self, t = 1 → to.
    pub fn lerp(self, to: Vec2, t: f32) -> Vec2 {
        self.add(to.sub(self).scale(t))
    }
}

/// Integer tile coordinate (col, row). May lie outside the room
/// (walls at -1 / ROOM_COLS, grass backdrop further out).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Cell { col, row }
    }

    pub fn center(self) -> Vec2 {
        cell_to_world(self.col, self.row)
    }
}

/// Map a cell to the world position of its center.
#[inline]
pub fn cell_to_world(col: i32, row: i32) -> Vec2 {
    Vec2::new(
        col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
    )
}

/// The cell containing a world position.
#[inline]
pub fn world_to_cell(p: Vec2) -> Cell {
    Cell::new(
        (p.x / TILE_SIZE).floor() as i32,
        (p.y / TILE_SIZE).floor() as i32,
    )
}

/// World-space size of the room interior.
pub fn room_size() -> Vec2 {
    Vec2::new(ROOM_COLS as f32 * TILE_SIZE, ROOM_ROWS as f32 * TILE_SIZE)
}

/// Axis-aligned rectangle, `min` inclusive and `max` exclusive.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size.scale(0.5);
        Rect { min: center.sub(half), max: center.add(half) }
    }

    /// Point test used for hit testing. Half-open so a point on a shared
    /// edge belongs to exactly one of two neighbouring tiles.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Strict overlap. Rectangles that only share an edge do not intersect,
    /// so standing next to a prop is not the same as standing on it.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_rect(col: i32, row: i32) -> Rect {
        Rect::centered(cell_to_world(col, row), Vec2::new(TILE_SIZE, TILE_SIZE))
    }

    #[test]
    fn cell_maps_to_tile_center() {
        assert_eq!(cell_to_world(0, 0), Vec2::new(8.0, 8.0));
        assert_eq!(cell_to_world(5, 7), Vec2::new(88.0, 120.0));
        assert_eq!(cell_to_world(-1, -1), Vec2::new(-8.0, -8.0));
    }

    #[test]
    fn world_to_cell_inverts_mapping() {
        for &(c, r) in &[(0, 0), (5, 3), (-1, 7), (-18, -15), (9, 6)] {
            assert_eq!(world_to_cell(cell_to_world(c, r)), Cell::new(c, r));
        }
    }

    #[test]
    fn world_to_cell_floors_negative_coordinates() {
        assert_eq!(world_to_cell(Vec2::new(-0.5, -0.5)), Cell::new(-1, -1));
        assert_eq!(world_to_cell(Vec2::new(15.9, 0.0)), Cell::new(0, 0));
        assert_eq!(world_to_cell(Vec2::new(16.0, 0.0)), Cell::new(1, 0));
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = tile_rect(0, 0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(15.99, 15.99)));
        assert!(!r.contains(Vec2::new(16.0, 8.0)));
        assert!(!r.contains(Vec2::new(8.0, -0.01)));
    }

    #[test]
    fn neighbouring_tiles_do_not_intersect() {
        let a = tile_rect(2, 2);
        assert!(!a.intersects(&tile_rect(3, 2)));
        assert!(!a.intersects(&tile_rect(2, 3)));
        assert!(!a.intersects(&tile_rect(3, 3)));
        assert!(a.intersects(&tile_rect(2, 2)));
    }

    #[test]
    fn partial_overlap_intersects() {
        let a = tile_rect(2, 2);
        let b = Rect::centered(cell_to_world(2, 2).add(Vec2::new(10.0, 4.0)), Vec2::new(16.0, 16.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Vec2::new(24.0, 56.0);
        let b = Vec2::new(88.0, 120.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(56.0, 88.0));
    }

    #[test]
    fn room_size_in_world_units() {
        assert_eq!(room_size(), Vec2::new(160.0, 112.0));
    }
}
