//! Dense tile storage, the adjacency cache derived from it, and the effect overlay.

use std::borrow::Cow;

use hex_battle_core::{HexCoord, HexDirection, Path, Tile, TileEffect, MAX_NEIGHBORS};

use crate::{flowfield, layout::HexLayout, pathfinding, GridError};

/// Per-tile adjacency captured at the last rebuild.
///
/// Each tile stores one slot per [`HexDirection`]; a slot holds the index of
/// the neighbour in that direction when the neighbour was in bounds and
/// passable, and [`EdgeTable::no_neighbor`] otherwise. The table is a cache:
/// it does not follow later tile writes until rebuilt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeTable {
    slots: Vec<[usize; MAX_NEIGHBORS]>,
    open: Vec<bool>,
}

impl EdgeTable {
    fn build(layout: &HexLayout, tiles: &[Tile]) -> Self {
        let sentinel = tiles.len();
        let mut slots = vec![[sentinel; MAX_NEIGHBORS]; tiles.len()];
        let open = tiles.iter().map(|tile| !tile.is_obstacle()).collect();

        for (index, entry) in slots.iter_mut().enumerate() {
            let Some(coord) = layout.index_to_coord(index) else {
                continue;
            };
            for direction in HexDirection::ALL {
                let neighbor = layout
                    .get_neighbor_coord(coord, direction)
                    .and_then(|neighbor| layout.coord_to_index(neighbor));
                if let Some(neighbor) = neighbor {
                    if !tiles[neighbor].is_obstacle() {
                        entry[direction.index()] = neighbor;
                    }
                }
            }
        }

        Self { slots, open }
    }

    /// Sentinel stored in slots without a neighbour; equals the tile count.
    #[must_use]
    pub fn no_neighbor(&self) -> usize {
        self.slots.len()
    }

    /// Number of tiles covered by the table.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.slots.len()
    }

    /// Raw per-direction slots of a tile.
    #[must_use]
    pub fn slots(&self, index: usize) -> Option<&[usize; MAX_NEIGHBORS]> {
        self.slots.get(index)
    }

    /// Reports whether the tile was passable when the table was built.
    #[must_use]
    pub fn is_open(&self, index: usize) -> bool {
        self.open.get(index).copied().unwrap_or(false)
    }

    /// Passable neighbours adjacent to a tile, regardless of the tile's own state.
    ///
    /// Searches expand their origin through this view so an actor standing on
    /// its own occupied tile can still leave it.
    pub fn exits(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let sentinel = self.no_neighbor();
        self.slots
            .get(index)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&neighbor| neighbor < sentinel)
    }

    /// Outgoing edges of a tile; impassable tiles have none.
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let open = self.is_open(index);
        self.exits(index).filter(move |_| open)
    }
}

/// Battle grid: tiles, their adjacency cache, and the highlight overlay.
#[derive(Clone, Debug)]
pub struct HexGrid {
    layout: HexLayout,
    tiles: Vec<Tile>,
    edges: EdgeTable,
    dirty: bool,
}

impl HexGrid {
    /// Creates a fully walkable grid with an up-to-date edge table.
    #[must_use]
    pub fn new(layout: HexLayout) -> Self {
        let tiles = vec![Tile::default(); layout.tile_count()];
        let edges = EdgeTable::build(&layout, &tiles);
        Self {
            layout,
            tiles,
            edges,
            dirty: false,
        }
    }

    /// Coordinate system of the grid.
    #[must_use]
    pub const fn layout(&self) -> &HexLayout {
        &self.layout
    }

    /// Tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at a coordinate, if it lies within the grid.
    #[must_use]
    pub fn tile_at(&self, coord: HexCoord) -> Option<&Tile> {
        self.layout
            .coord_to_index(coord)
            .and_then(|index| self.tiles.get(index))
    }

    /// Bounds check only; obstacles are not considered.
    #[must_use]
    pub fn is_valid_coord(&self, coord: HexCoord) -> bool {
        self.layout.is_valid_coord(coord)
    }

    /// Reports whether the tile blocks traversal; off-grid coordinates count as blocked.
    #[must_use]
    pub fn is_tile_obstacle(&self, coord: HexCoord) -> bool {
        self.tile_at(coord).map_or(true, Tile::is_obstacle)
    }

    /// Writes a tile's movement cost and marks the edge table stale.
    pub fn set_movement_cost(&mut self, coord: HexCoord, cost: u16) -> Result<(), GridError> {
        let index = self
            .layout
            .coord_to_index(coord)
            .ok_or(GridError::OutOfBounds(coord))?;
        if self.tiles[index].movement_cost != cost {
            self.tiles[index].movement_cost = cost;
            self.dirty = true;
        }
        Ok(())
    }

    /// Rebuilds the edge table from the current movement costs. O(tiles * 6).
    pub fn update_edges(&mut self) {
        self.edges = EdgeTable::build(&self.layout, &self.tiles);
        self.dirty = false;
    }

    /// Rebuilds the edge table only if a movement cost changed since the last rebuild.
    ///
    /// Returns whether a rebuild happened.
    pub fn ensure_edges(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        tracing::debug!("rebuilding stale edge table");
        self.update_edges();
        true
    }

    /// Reports whether tile writes happened since the last rebuild.
    #[must_use]
    pub const fn edges_are_stale(&self) -> bool {
        self.dirty
    }

    /// The cached edge table as of the last rebuild, which may be stale.
    #[must_use]
    pub const fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    /// Edge table reflecting the current tiles.
    ///
    /// Borrows the cache when it is current and builds a temporary table
    /// otherwise, so read-only queries never observe a stale graph.
    #[must_use]
    pub fn current_edges(&self) -> Cow<'_, EdgeTable> {
        if self.dirty {
            Cow::Owned(EdgeTable::build(&self.layout, &self.tiles))
        } else {
            Cow::Borrowed(&self.edges)
        }
    }

    /// Shortest route between two coordinates over the current adjacency.
    #[must_use]
    pub fn path_find(&self, start: HexCoord, goal: HexCoord) -> Path {
        pathfinding::find_path(&self.layout, &self.current_edges(), start, goal)
    }

    /// Fills `buffer` with tile distances from `origin`.
    pub fn generate_flowfield(&self, origin: HexCoord, buffer: &mut [u32]) -> Result<(), GridError> {
        flowfield::generate(&self.layout, &self.current_edges(), origin, buffer)
    }

    /// Distance stored for a coordinate in a previously generated buffer.
    #[must_use]
    pub fn flowfield_distance(&self, coord: HexCoord, buffer: &[u32]) -> u32 {
        flowfield::distance(&self.layout, coord, buffer)
    }

    /// Attaches a highlight to a tile. Returns whether the tile changed.
    pub fn set_tile_effect(&mut self, coord: HexCoord, effect: TileEffect) -> Result<bool, GridError> {
        let index = self
            .layout
            .coord_to_index(coord)
            .ok_or(GridError::OutOfBounds(coord))?;
        let tile = &mut self.tiles[index];
        let changed = tile.effect != effect;
        tile.effect = effect;
        Ok(changed)
    }

    /// Removes any highlight from a tile. Returns whether the tile changed.
    pub fn clear_tile_effect(&mut self, coord: HexCoord) -> Result<bool, GridError> {
        self.set_tile_effect(coord, TileEffect::None)
    }

    /// Removes a highlight from every tile carrying it and returns how many changed.
    pub fn clear_tile_effect_of_kind(&mut self, effect: TileEffect) -> usize {
        if effect == TileEffect::None {
            return 0;
        }
        let mut cleared = 0;
        for tile in self.tiles.iter_mut().filter(|tile| tile.effect == effect) {
            tile.effect = TileEffect::None;
            cleared += 1;
        }
        cleared
    }

    /// Replaces the movement-range highlight with the tiles `1..=budget` steps from `origin`.
    ///
    /// Returns the highlighted coordinates in index order.
    pub fn highlight_reachable(&mut self, origin: HexCoord, budget: u32) -> Vec<HexCoord> {
        let _ = self.ensure_edges();
        let mut distances = vec![0; self.layout.tile_count()];
        let mut highlighted = Vec::new();
        let _ = self.clear_tile_effect_of_kind(TileEffect::MoveableArea);

        if flowfield::generate(&self.layout, &self.edges, origin, &mut distances).is_err() {
            return highlighted;
        }

        for (index, distance) in distances.iter().copied().enumerate() {
            if distance == 0 || distance > budget {
                continue;
            }
            let Some(coord) = self.layout.index_to_coord(index) else {
                continue;
            };
            self.tiles[index].effect = TileEffect::MoveableArea;
            highlighted.push(coord);
        }

        highlighted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_battle_core::MOVEMENT_COST_MAX;

    fn grid(width: u32, height: u32) -> HexGrid {
        HexGrid::new(HexLayout::new(width, height, 1.0).expect("valid layout"))
    }

    #[test]
    fn interior_tile_has_six_edges() {
        let grid = grid(5, 5);
        let index = grid
            .layout()
            .coord_to_index(HexCoord::new(2, 2))
            .expect("in bounds");
        assert_eq!(grid.edges().neighbors(index).count(), 6);
    }

    #[test]
    fn impassable_tile_is_cut_out_of_the_graph() {
        let mut grid = grid(5, 5);
        let blocked = HexCoord::new(2, 2);
        grid.set_movement_cost(blocked, MOVEMENT_COST_MAX)
            .expect("in bounds");
        grid.update_edges();

        let blocked_index = grid.layout().coord_to_index(blocked).expect("in bounds");
        let edges = grid.edges();
        assert_eq!(edges.neighbors(blocked_index).count(), 0);
        for index in 0..edges.tile_count() {
            assert!(
                edges.exits(index).all(|neighbor| neighbor != blocked_index),
                "tile {index} still leads into the blocked tile",
            );
        }
        assert_eq!(edges.exits(blocked_index).count(), 6);
    }

    #[test]
    fn missing_neighbours_use_the_tile_count_sentinel() {
        let grid = grid(3, 3);
        let slots = grid.edges().slots(0).expect("tile exists");
        assert_eq!(grid.edges().no_neighbor(), 9);
        assert_eq!(
            slots.iter().filter(|&&slot| slot == 9).count(),
            4,
            "corner tile has only two neighbours",
        );
    }

    #[test]
    fn movement_cost_writes_mark_edges_stale_until_rebuilt() {
        let mut grid = grid(4, 4);
        assert!(!grid.edges_are_stale());

        grid.set_movement_cost(HexCoord::new(1, 1), MOVEMENT_COST_MAX)
            .expect("in bounds");
        assert!(grid.edges_are_stale());
        assert!(matches!(grid.current_edges(), Cow::Owned(_)));

        assert!(grid.ensure_edges());
        assert!(!grid.edges_are_stale());
        assert!(!grid.ensure_edges());
    }

    #[test]
    fn queries_see_writes_before_rebuild() {
        let mut grid = grid(3, 1);
        grid.set_movement_cost(HexCoord::new(1, 0), MOVEMENT_COST_MAX)
            .expect("in bounds");

        let path = grid.path_find(HexCoord::new(0, 0), HexCoord::new(2, 0));
        assert!(!path.is_ok());
    }

    #[test]
    fn unchanged_cost_does_not_mark_stale() {
        let mut grid = grid(4, 4);
        grid.set_movement_cost(HexCoord::new(1, 1), 1).expect("in bounds");
        assert!(!grid.edges_are_stale());
    }

    #[test]
    fn out_of_bounds_writes_are_rejected() {
        let mut grid = grid(4, 4);
        let coord = HexCoord::new(4, 0);
        assert_eq!(
            grid.set_movement_cost(coord, 3),
            Err(GridError::OutOfBounds(coord))
        );
        assert_eq!(
            grid.set_tile_effect(coord, TileEffect::Attackable),
            Err(GridError::OutOfBounds(coord))
        );
        assert!(grid.is_tile_obstacle(coord));
    }

    #[test]
    fn effect_writes_leave_the_edge_table_current() {
        let mut grid = grid(4, 4);
        let coord = HexCoord::new(1, 1);
        assert_eq!(grid.set_tile_effect(coord, TileEffect::Attackable), Ok(true));
        assert_eq!(grid.clear_tile_effect(coord), Ok(true));
        let _ = grid.set_tile_effect(coord, TileEffect::MoveableArea);
        assert_eq!(grid.clear_tile_effect_of_kind(TileEffect::MoveableArea), 1);
        assert!(!grid.edges_are_stale());

        grid.set_movement_cost(coord, 4).expect("in bounds");
        assert!(grid.edges_are_stale());
    }

    #[test]
    fn clearing_an_effect_kind_is_idempotent() {
        let mut grid = grid(4, 4);
        let _ = grid
            .set_tile_effect(HexCoord::new(0, 0), TileEffect::MoveableArea)
            .expect("in bounds");
        let _ = grid
            .set_tile_effect(HexCoord::new(1, 0), TileEffect::MoveableArea)
            .expect("in bounds");
        let _ = grid
            .set_tile_effect(HexCoord::new(2, 0), TileEffect::Attackable)
            .expect("in bounds");

        assert_eq!(grid.clear_tile_effect_of_kind(TileEffect::MoveableArea), 2);
        let once = grid.tiles().to_vec();
        assert_eq!(grid.clear_tile_effect_of_kind(TileEffect::MoveableArea), 0);
        assert_eq!(grid.tiles(), once.as_slice());
        assert_eq!(
            grid.tile_at(HexCoord::new(2, 0)).map(|tile| tile.effect),
            Some(TileEffect::Attackable)
        );
    }

    #[test]
    fn highlight_marks_exactly_the_budgeted_ring() {
        let mut grid = grid(7, 7);
        let origin = HexCoord::new(3, 3);
        grid.set_movement_cost(origin, MOVEMENT_COST_MAX)
            .expect("in bounds");
        let _ = grid
            .set_tile_effect(HexCoord::new(0, 0), TileEffect::MoveableArea)
            .expect("in bounds");

        let highlighted = grid.highlight_reachable(origin, 2);

        let mut distances = vec![0; grid.layout().tile_count()];
        grid.generate_flowfield(origin, &mut distances)
            .expect("buffer sized");
        for (index, tile) in grid.tiles().iter().enumerate() {
            let distance = distances[index];
            let expected = (1..=2).contains(&distance);
            assert_eq!(tile.effect == TileEffect::MoveableArea, expected, "tile {index}");
        }
        assert_eq!(highlighted.len(), 6 + 12);
        assert!(!highlighted.contains(&origin));
    }

    #[test]
    fn zero_budget_highlights_nothing() {
        let mut grid = grid(4, 4);
        assert!(grid.highlight_reachable(HexCoord::new(1, 1), 0).is_empty());
        assert!(grid
            .tiles()
            .iter()
            .all(|tile| tile.effect == TileEffect::None));
    }
}
