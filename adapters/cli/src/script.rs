//! Scripted stand-in for a human player.

use hex_battle_core::HexCoord;
use hex_battle_world::{query, World};

/// Picks the reachable tile farthest from the player within `budget`.
///
/// Ties go to the lowest tile index. Returns `None` when the player is
/// missing, the budget is spent, or every neighbour is blocked.
pub(crate) fn farthest_reachable(world: &World, budget: u32) -> Option<HexCoord> {
    let player = query::player(world)?;
    let distances = query::flowfield(world, player.coord);

    let mut best: Option<(usize, u32)> = None;
    for (index, distance) in distances.iter().copied().enumerate() {
        if distance == 0 || distance > budget {
            continue;
        }
        if best.map_or(true, |(_, farthest)| distance > farthest) {
            best = Some((index, distance));
        }
    }

    best.and_then(|(index, _)| query::layout(world).index_to_coord(index))
}
