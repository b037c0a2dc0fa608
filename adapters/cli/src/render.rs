//! Plain-text rendering of the battle grid.

use std::fmt::Write as _;

use hex_battle_core::{ActorKind, HexCoord, TileEffect};
use hex_battle_world::{query, World};

/// Renders the grid with one character per tile.
///
/// Odd rows are indented by one column so neighbouring rows interlock the
/// way the hexagons do. `@` marks the player, `E` a non-player actor, `#`
/// an obstacle, `*` a tile within movement range, and `.` an empty tile.
pub(crate) fn ascii_map(world: &World) -> String {
    let layout = query::layout(world);
    let actors = query::actor_view(world).into_vec();
    let mut map = String::new();

    for y in 0..layout.height() {
        let y = y as i32;
        if y & 1 == 1 {
            map.push(' ');
        }
        for x in 0..layout.width() {
            let coord = HexCoord::new(x as i32, y);
            if x > 0 {
                map.push(' ');
            }
            let symbol = match actors.iter().find(|actor| actor.coord == coord) {
                Some(actor) if actor.kind == ActorKind::Player => '@',
                Some(_) => 'E',
                None => tile_symbol(world, coord),
            };
            map.push(symbol);
        }
        let _ = writeln!(map);
    }

    map
}

fn tile_symbol(world: &World, coord: HexCoord) -> char {
    match query::tile_at(world, coord) {
        Some(tile) if tile.is_obstacle() => '#',
        Some(tile) if tile.effect == TileEffect::MoveableArea => '*',
        _ => '.',
    }
}
