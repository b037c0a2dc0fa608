//! Single-source reachability distances used for movement-range queries.

use std::collections::VecDeque;

use hex_battle_core::{HexCoord, UNREACHABLE};

use crate::{grid::EdgeTable, layout::HexLayout, GridError};

/// Fills `buffer` with breadth-first distances from `origin` over the edge table.
///
/// The buffer must hold exactly one slot per tile. The origin receives `0`,
/// every tile connected to it receives its step count, and every other tile
/// receives [`UNREACHABLE`]. An off-grid origin leaves the whole buffer
/// unreachable.
pub(crate) fn generate(
    layout: &HexLayout,
    edges: &EdgeTable,
    origin: HexCoord,
    buffer: &mut [u32],
) -> Result<(), GridError> {
    let expected = layout.tile_count();
    if buffer.len() != expected {
        return Err(GridError::FlowFieldSize {
            expected,
            actual: buffer.len(),
        });
    }

    buffer.fill(UNREACHABLE);

    let Some(origin_index) = layout.coord_to_index(origin) else {
        return Ok(());
    };

    let mut queue = VecDeque::new();
    buffer[origin_index] = 0;
    queue.push_back(origin_index);

    while let Some(current) = queue.pop_front() {
        if current != origin_index && !edges.is_open(current) {
            continue;
        }

        let next_distance = buffer[current].saturating_add(1);
        for neighbor in edges.exits(current) {
            if buffer[neighbor] <= next_distance {
                continue;
            }
            buffer[neighbor] = next_distance;
            queue.push_back(neighbor);
        }
    }

    Ok(())
}

/// Distance captured for a coordinate, or [`UNREACHABLE`] when it lies off the grid.
pub(crate) fn distance(layout: &HexLayout, coord: HexCoord, buffer: &[u32]) -> u32 {
    layout
        .coord_to_index(coord)
        .and_then(|index| buffer.get(index).copied())
        .unwrap_or(UNREACHABLE)
}

#[cfg(test)]
mod tests {
    use hex_battle_core::{HexDirection, MOVEMENT_COST_MAX};

    use crate::grid::HexGrid;

    use super::*;

    fn grid(width: u32, height: u32) -> HexGrid {
        HexGrid::new(HexLayout::new(width, height, 1.0).expect("valid layout"))
    }

    fn field(grid: &HexGrid, origin: HexCoord) -> Vec<u32> {
        let mut buffer = vec![0; grid.layout().tile_count()];
        grid.generate_flowfield(origin, &mut buffer)
            .expect("buffer sized");
        buffer
    }

    #[test]
    fn origin_is_zero_and_neighbours_are_one() {
        let grid = grid(5, 5);
        let origin = HexCoord::new(2, 2);
        let buffer = field(&grid, origin);

        assert_eq!(grid.flowfield_distance(origin, &buffer), 0);
        for direction in HexDirection::ALL {
            let neighbor = origin.neighbor(direction);
            assert_eq!(grid.flowfield_distance(neighbor, &buffer), 1);
        }
    }

    #[test]
    fn distances_match_hex_distance_on_open_grid() {
        let grid = grid(6, 5);
        let origin = HexCoord::new(1, 3);
        let buffer = field(&grid, origin);
        for (index, distance) in buffer.iter().enumerate() {
            let coord = grid.layout().index_to_coord(index).expect("in range");
            assert_eq!(*distance, origin.hex_distance(coord));
        }
    }

    #[test]
    fn distances_never_drop_by_more_than_one_across_an_edge() {
        let mut grid = grid(6, 6);
        for coord in [HexCoord::new(2, 1), HexCoord::new(2, 2), HexCoord::new(3, 3)] {
            grid.set_movement_cost(coord, MOVEMENT_COST_MAX)
                .expect("in bounds");
        }
        grid.update_edges();
        let buffer = field(&grid, HexCoord::new(0, 2));

        let edges = grid.edges();
        for index in 0..edges.tile_count() {
            if buffer[index] == UNREACHABLE {
                continue;
            }
            for neighbor in edges.neighbors(index) {
                assert!(buffer[neighbor] <= buffer[index] + 1);
            }
        }
    }

    #[test]
    fn disconnected_tiles_are_unreachable() {
        let mut grid = grid(5, 3);
        for y in 0..3 {
            grid.set_movement_cost(HexCoord::new(2, y), MOVEMENT_COST_MAX)
                .expect("in bounds");
        }
        let buffer = field(&grid, HexCoord::new(0, 1));

        assert_eq!(grid.flowfield_distance(HexCoord::new(4, 1), &buffer), UNREACHABLE);
        assert_eq!(grid.flowfield_distance(HexCoord::new(2, 1), &buffer), UNREACHABLE);
        assert_eq!(grid.flowfield_distance(HexCoord::new(1, 1), &buffer), 1);
    }

    #[test]
    fn off_grid_lookups_are_unreachable() {
        let grid = grid(3, 3);
        let buffer = field(&grid, HexCoord::new(-1, 0));
        assert!(buffer.iter().all(|&distance| distance == UNREACHABLE));
        assert_eq!(grid.flowfield_distance(HexCoord::new(9, 9), &buffer), UNREACHABLE);
    }

    #[test]
    fn mis_sized_buffers_are_rejected() {
        let grid = grid(3, 3);
        let mut buffer = vec![0; 4];
        assert_eq!(
            grid.generate_flowfield(HexCoord::new(0, 0), &mut buffer),
            Err(GridError::FlowFieldSize {
                expected: 9,
                actual: 4
            })
        );
    }
}
