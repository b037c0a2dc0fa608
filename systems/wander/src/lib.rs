#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Non-player movement: every NPC steps onto a uniformly chosen free neighbour.

use arrayvec::ArrayVec;
use hex_battle_core::{ActorKind, Command, HexCoord, HexDirection, TileEffect, MAX_NEIGHBORS};
use hex_battle_world::{query, World};
use rand::{seq::SliceRandom, Rng};

/// Neighbouring tiles an actor could step onto.
pub type Candidates = ArrayVec<HexCoord, MAX_NEIGHBORS>;

/// Outcome of choosing a single step for an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepChoice {
    /// The actor should step onto the provided tile.
    Step(HexCoord),
    /// Every neighbour is off the grid or obstructed.
    NoMoveAvailable,
}

/// Lists the in-bounds neighbours of `from` that `is_blocked` does not reject,
/// in canonical direction order.
pub fn candidate_steps<F>(world: &World, from: HexCoord, is_blocked: F) -> Candidates
where
    F: Fn(HexCoord) -> bool,
{
    let layout = query::layout(world);
    HexDirection::ALL
        .iter()
        .filter_map(|direction| layout.get_neighbor_coord(from, *direction))
        .filter(|coord| !is_blocked(*coord))
        .collect()
}

/// Picks one candidate uniformly at random.
pub fn choose_step<R>(candidates: &[HexCoord], rng: &mut R) -> StepChoice
where
    R: Rng + ?Sized,
{
    candidates
        .choose(rng)
        .map_or(StepChoice::NoMoveAvailable, |coord| StepChoice::Step(*coord))
}

/// Plans one step for every non-player actor.
///
/// Actors are planned in identifier order against a single world snapshot.
/// Tiles vacated by earlier actors become available to later ones and tiles
/// claimed by earlier actors are withheld, so the emitted commands stay valid
/// when applied in order.
#[derive(Debug, Default)]
pub struct Wander {
    claimed: Vec<HexCoord>,
    vacated: Vec<HexCoord>,
}

impl Wander {
    /// Emits a `MoveActor` command for every NPC that has somewhere to go.
    pub fn plan<R>(&mut self, world: &World, rng: &mut R, out: &mut Vec<Command>)
    where
        R: Rng + ?Sized,
    {
        self.claimed.clear();
        self.vacated.clear();

        let actors = query::actor_view(world);
        for npc in actors.of_kind(ActorKind::Npc) {
            let candidates = candidate_steps(world, npc.coord, |coord| self.is_blocked(world, coord));

            match choose_step(&candidates, rng) {
                StepChoice::Step(goal) => {
                    tracing::debug!(actor = npc.id.get(), from = ?npc.coord, to = ?goal, "npc step planned");
                    self.claimed.push(goal);
                    self.vacated.push(npc.coord);
                    out.push(Command::MoveActor {
                        actor: npc.id,
                        goal,
                        tag: Some(TileEffect::Attackable),
                    });
                }
                StepChoice::NoMoveAvailable => {
                    tracing::warn!(actor = npc.id.get(), at = ?npc.coord, "npc has no free neighbour");
                }
            }
        }
    }

    fn is_blocked(&self, world: &World, coord: HexCoord) -> bool {
        if self.claimed.contains(&coord) {
            return true;
        }
        query::is_tile_obstacle(world, coord) && !self.vacated.contains(&coord)
    }
}
