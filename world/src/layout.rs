//! Coordinate system shared by grid storage, searches, and adapters.

use glam::Vec2;
use hex_battle_core::{HexCoord, HexDirection};

use crate::GridError;

const SQRT_3: f32 = 1.732_050_8;
const DEFAULT_WIDTH: u32 = 8;
const DEFAULT_HEIGHT: u32 = 8;
const DEFAULT_TILE_SIZE: f32 = 1.0;
// Rounded axial components stay well inside `i32` after the cube correction.
const AXIAL_LIMIT: f32 = (i32::MAX / 4) as f32;

/// Dimensions and geometry of a pointy-top, odd-row-shifted hex grid.
///
/// The layout is the single authority for converting between hex
/// coordinates, linear tile indices (`index = y * width + x`), and continuous
/// world-space positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexLayout {
    width: u32,
    height: u32,
    tile_size: f32,
}

impl HexLayout {
    /// Creates a layout, rejecting empty grids and degenerate tile sizes.
    pub fn new(width: u32, height: u32, tile_size: f32) -> Result<Self, GridError> {
        if width == 0 || height == 0 || i32::try_from(width).is_err() || i32::try_from(height).is_err()
        {
            return Err(GridError::InvalidDimensions { width, height });
        }
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(GridError::InvalidTileSize(tile_size));
        }

        Ok(Self {
            width,
            height,
            tile_size,
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Distance from a tile centre to its corners, in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Total number of tiles in the grid.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Horizontal and vertical spacing between neighbouring tile centres.
    #[must_use]
    pub fn tile_offsets(&self) -> Vec2 {
        Vec2::new(SQRT_3 * self.tile_size, 1.5 * self.tile_size)
    }

    /// Bounds check only; obstacles are not considered.
    #[must_use]
    pub fn is_valid_coord(&self, coord: HexCoord) -> bool {
        coord.x() >= 0
            && coord.y() >= 0
            && (coord.x() as u32) < self.width
            && (coord.y() as u32) < self.height
    }

    /// Linear index of a coordinate, if it lies within the grid.
    #[must_use]
    pub fn coord_to_index(&self, coord: HexCoord) -> Option<usize> {
        if !self.is_valid_coord(coord) {
            return None;
        }
        Some(coord.y() as usize * self.width as usize + coord.x() as usize)
    }

    /// Coordinate stored at a linear index, if the index lies within the grid.
    #[must_use]
    pub fn index_to_coord(&self, index: usize) -> Option<HexCoord> {
        if index >= self.tile_count() {
            return None;
        }
        let width = self.width as usize;
        let x = i32::try_from(index % width).ok()?;
        let y = i32::try_from(index / width).ok()?;
        Some(HexCoord::new(x, y))
    }

    /// Neighbouring coordinate in the given direction, if it lies within the grid.
    #[must_use]
    pub fn get_neighbor_coord(&self, coord: HexCoord, direction: HexDirection) -> Option<HexCoord> {
        let neighbor = coord.checked_neighbor(direction)?;
        self.is_valid_coord(neighbor).then_some(neighbor)
    }

    /// World-space centre of a tile.
    ///
    /// Defined for every coordinate, including ones outside the grid, so the
    /// mapping stays continuous across the border.
    #[must_use]
    pub fn coord_to_world_position(&self, coord: HexCoord) -> Vec2 {
        let offsets = self.tile_offsets();
        let shift = if coord.is_odd_row() { 0.5 } else { 0.0 };
        Vec2::new(
            offsets.x * (coord.x() as f32 + shift),
            offsets.y * coord.y() as f32,
        )
    }

    /// World-space centre of the tile at a linear index.
    #[must_use]
    pub fn index_to_world_position(&self, index: usize) -> Option<Vec2> {
        self.index_to_coord(index)
            .map(|coord| self.coord_to_world_position(coord))
    }

    /// Coordinate of the hexagon containing a world-space position.
    ///
    /// The result is not bounds checked. Non-finite positions map to
    /// [`HexCoord::OFF_GRID`]; positions beyond the `i32` range are clamped
    /// and land off the grid.
    #[must_use]
    pub fn world_position_to_coord(&self, position: Vec2) -> HexCoord {
        let q = (SQRT_3 / 3.0 * position.x - position.y / 3.0) / self.tile_size;
        let r = (2.0 / 3.0 * position.y) / self.tile_size;
        if !q.is_finite() || !r.is_finite() {
            return HexCoord::OFF_GRID;
        }
        let (q, r) = cube_round(
            q.clamp(-AXIAL_LIMIT, AXIAL_LIMIT),
            r.clamp(-AXIAL_LIMIT, AXIAL_LIMIT),
        );
        HexCoord::from_axial(q, r)
    }
}

impl Default for HexLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

fn cube_round(q: f32, r: f32) -> (i32, i32) {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }

    (rq as i32, rr as i32)
}
