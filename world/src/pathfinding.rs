//! Breadth-first route search over the edge table.

use std::collections::VecDeque;

use hex_battle_core::{HexCoord, Path};

use crate::{grid::EdgeTable, layout::HexLayout};

const UNVISITED: usize = usize::MAX;

/// Finds the shortest route from `start` to `goal`.
///
/// Every edge has the same weight, so breadth-first order yields shortest
/// routes. Neighbours are expanded in canonical direction order, which makes
/// the choice between equally short routes deterministic.
pub(crate) fn find_path(
    layout: &HexLayout,
    edges: &EdgeTable,
    start: HexCoord,
    goal: HexCoord,
) -> Path {
    if start == goal {
        return Path::found(start, goal, Vec::new());
    }

    let (Some(start_index), Some(goal_index)) =
        (layout.coord_to_index(start), layout.coord_to_index(goal))
    else {
        return Path::no_path(start, goal);
    };

    let mut came_from = vec![UNVISITED; edges.tile_count()];
    let mut queue = VecDeque::new();
    came_from[start_index] = start_index;
    queue.push_back(start_index);

    while let Some(current) = queue.pop_front() {
        if current == goal_index {
            break;
        }

        // The origin may be occupied by the mover itself.
        if current != start_index && !edges.is_open(current) {
            continue;
        }

        for next in edges.exits(current) {
            if came_from[next] != UNVISITED {
                continue;
            }
            came_from[next] = current;
            queue.push_back(next);
        }
    }

    if came_from[goal_index] == UNVISITED {
        return Path::no_path(start, goal);
    }

    let mut tiles = Vec::new();
    let mut cursor = goal_index;
    while cursor != start_index {
        tiles.push(cursor);
        cursor = came_from[cursor];
    }
    tiles.reverse();

    Path::found(start, goal, tiles)
}
