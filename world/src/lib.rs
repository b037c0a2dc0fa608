#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state: the hex grid, its actors, and the card hand.

mod flowfield;
mod grid;
mod layout;
mod pathfinding;

use hex_battle_core::{
    ActorId, ActorKind, CardKind, Command, Event, HexCoord, MoveError, PlacementError, TileEffect,
    DEFAULT_MOVEMENT_COST, MOVEMENT_COST_MAX,
};

pub use grid::{EdgeTable, HexGrid};
pub use layout::HexLayout;

/// Failures reported by grid operations that take caller-supplied input.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum GridError {
    /// The grid would contain no tiles or too many to address.
    #[error("grid dimensions {width}x{height} are not usable")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// The tile size is not a positive finite number.
    #[error("tile size {0} must be positive and finite")]
    InvalidTileSize(f32),
    /// The coordinate lies outside the grid.
    #[error("coordinate {0:?} is outside the grid")]
    OutOfBounds(HexCoord),
    /// A flow-field buffer does not hold one slot per tile.
    #[error("flow-field buffer holds {actual} slots but the grid has {expected} tiles")]
    FlowFieldSize {
        /// Number of tiles in the grid.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
}

#[derive(Clone, Copy, Debug)]
struct Actor {
    id: ActorId,
    kind: ActorKind,
    coord: HexCoord,
}

/// Represents the authoritative battle session state.
#[derive(Debug)]
pub struct World {
    grid: HexGrid,
    actors: Vec<Actor>,
    hand: Vec<CardKind>,
    next_actor_id: u32,
}

impl World {
    /// Creates a world with an empty, fully walkable default grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(HexLayout::default())
    }

    /// Creates a world with an empty, fully walkable grid of the given layout.
    #[must_use]
    pub fn with_layout(layout: HexLayout) -> Self {
        Self {
            grid: HexGrid::new(layout),
            actors: Vec::new(),
            hand: Vec::new(),
            next_actor_id: 0,
        }
    }

    fn actor_mut(&mut self, actor: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|candidate| candidate.id == actor)
    }

    fn place_actor(&mut self, kind: ActorKind, coord: HexCoord, out_events: &mut Vec<Event>) {
        if !self.grid.is_valid_coord(coord) {
            out_events.push(Event::ActorPlacementRejected {
                kind,
                coord,
                reason: PlacementError::OutOfBounds,
            });
            return;
        }
        if self.grid.is_tile_obstacle(coord) {
            out_events.push(Event::ActorPlacementRejected {
                kind,
                coord,
                reason: PlacementError::Occupied,
            });
            return;
        }

        if self.grid.set_movement_cost(coord, MOVEMENT_COST_MAX).is_err() {
            return;
        }
        self.grid.update_edges();

        let id = ActorId::new(self.next_actor_id);
        self.next_actor_id = self.next_actor_id.saturating_add(1);
        self.actors.push(Actor { id, kind, coord });
        tracing::debug!(actor = id.get(), ?kind, ?coord, "actor placed");
        out_events.push(Event::ActorPlaced {
            actor: id,
            kind,
            coord,
        });
    }

    fn move_actor(
        &mut self,
        actor: ActorId,
        goal: HexCoord,
        tag: Option<TileEffect>,
        out_events: &mut Vec<Event>,
    ) {
        let reject = |reason: MoveError, out_events: &mut Vec<Event>| {
            tracing::warn!(actor = actor.get(), ?goal, ?reason, "move rejected");
            out_events.push(Event::MoveRejected {
                actor,
                goal,
                reason,
            });
        };

        let Some(from) = self.actor_mut(actor).map(|entry| entry.coord) else {
            reject(MoveError::UnknownActor, out_events);
            return;
        };
        if !self.grid.is_valid_coord(goal) {
            reject(MoveError::OutOfBounds, out_events);
            return;
        }
        if goal == from {
            reject(MoveError::AlreadyThere, out_events);
            return;
        }
        if self.grid.is_tile_obstacle(goal) {
            reject(MoveError::Obstructed, out_events);
            return;
        }

        let _ = self.grid.ensure_edges();
        let path = self.grid.path_find(from, goal);
        if !path.is_ok() {
            reject(MoveError::NoPath, out_events);
            return;
        }

        // Both writes land before the single rebuild observed by later queries.
        if self.grid.set_movement_cost(goal, MOVEMENT_COST_MAX).is_err()
            || self.grid.set_movement_cost(from, DEFAULT_MOVEMENT_COST).is_err()
        {
            return;
        }
        self.grid.update_edges();

        if let Some(effect) = tag {
            if matches!(self.grid.set_tile_effect(goal, effect), Ok(true)) {
                out_events.push(Event::TileEffectChanged {
                    coord: goal,
                    effect,
                });
            }
            if matches!(self.grid.clear_tile_effect(from), Ok(true)) {
                out_events.push(Event::TileEffectChanged {
                    coord: from,
                    effect: TileEffect::None,
                });
            }
        }

        if let Some(entry) = self.actor_mut(actor) {
            entry.coord = goal;
        }
        tracing::debug!(
            actor = actor.get(),
            ?from,
            to = ?goal,
            steps = path.distance_in_tiles(),
            "actor moved"
        );
        out_events.push(Event::ActorMoved {
            actor,
            from,
            to: goal,
            path,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid {
            width,
            height,
            tile_size,
        } => match HexLayout::new(width, height, tile_size) {
            Ok(layout) => {
                *world = World::with_layout(layout);
                out_events.push(Event::GridConfigured { width, height });
            }
            Err(error) => {
                tracing::warn!(%error, "grid configuration ignored");
            }
        },
        Command::SetMovementCost { coord, cost } => {
            match world.grid.set_movement_cost(coord, cost) {
                Ok(()) => out_events.push(Event::MovementCostChanged { coord, cost }),
                Err(error) => tracing::warn!(%error, "movement cost write ignored"),
            }
        }
        Command::RebuildEdges => {
            world.grid.update_edges();
            out_events.push(Event::EdgesRebuilt);
        }
        Command::SetTileEffect { coord, effect } => {
            if matches!(world.grid.set_tile_effect(coord, effect), Ok(true)) {
                out_events.push(Event::TileEffectChanged { coord, effect });
            }
        }
        Command::ClearTileEffect { coord } => {
            if matches!(world.grid.clear_tile_effect(coord), Ok(true)) {
                out_events.push(Event::TileEffectChanged {
                    coord,
                    effect: TileEffect::None,
                });
            }
        }
        Command::ClearTileEffectOfKind { effect } => {
            let count = world.grid.clear_tile_effect_of_kind(effect);
            if count > 0 {
                out_events.push(Event::TileEffectsCleared { effect, count });
            }
        }
        Command::PlaceActor { kind, coord } => world.place_actor(kind, coord, out_events),
        Command::MoveActor { actor, goal, tag } => world.move_actor(actor, goal, tag, out_events),
        Command::HighlightReachable { origin, budget } => {
            let tiles = world.grid.highlight_reachable(origin, budget);
            tracing::debug!(?origin, budget, reachable = tiles.len(), "movement range highlighted");
            out_events.push(Event::ReachableHighlighted {
                origin,
                budget,
                tiles,
            });
        }
        Command::DrawCard { card } => {
            world.hand.push(card);
            out_events.push(Event::CardDrawn {
                card,
                hand_size: world.hand.len(),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use hex_battle_core::{ActorId, ActorKind, CardKind, HexCoord, Path, Tile, UNREACHABLE};

    use super::{GridError, HexGrid, HexLayout, World};

    /// Provides read-only access to the battle grid.
    #[must_use]
    pub fn grid(world: &World) -> &HexGrid {
        &world.grid
    }

    /// Provides read-only access to the grid's coordinate system.
    #[must_use]
    pub fn layout(world: &World) -> &HexLayout {
        world.grid.layout()
    }

    /// Tile at a coordinate, if it lies within the grid.
    #[must_use]
    pub fn tile_at(world: &World, coord: HexCoord) -> Option<&Tile> {
        world.grid.tile_at(coord)
    }

    /// Bounds check only; obstacles are not considered.
    #[must_use]
    pub fn is_valid_coord(world: &World, coord: HexCoord) -> bool {
        world.grid.is_valid_coord(coord)
    }

    /// Reports whether the tile blocks traversal.
    #[must_use]
    pub fn is_tile_obstacle(world: &World, coord: HexCoord) -> bool {
        world.grid.is_tile_obstacle(coord)
    }

    /// Shortest route between two coordinates.
    #[must_use]
    pub fn path_find(world: &World, start: HexCoord, goal: HexCoord) -> Path {
        world.grid.path_find(start, goal)
    }

    /// Distances from `origin` to every tile, in index order.
    #[must_use]
    pub fn flowfield(world: &World, origin: HexCoord) -> Vec<u32> {
        let mut buffer = vec![UNREACHABLE; world.grid.layout().tile_count()];
        if let Err(error) = world.grid.generate_flowfield(origin, &mut buffer) {
            tracing::warn!(%error, "flow field not generated");
        }
        buffer
    }

    /// Fills a caller-provided buffer with distances from `origin`.
    pub fn generate_flowfield(
        world: &World,
        origin: HexCoord,
        buffer: &mut [u32],
    ) -> Result<(), GridError> {
        world.grid.generate_flowfield(origin, buffer)
    }

    /// Captures a read-only view of the actors in the battle.
    #[must_use]
    pub fn actor_view(world: &World) -> ActorView {
        let mut snapshots: Vec<ActorSnapshot> = world
            .actors
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id,
                kind: actor.kind,
                coord: actor.coord,
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        ActorView { snapshots }
    }

    /// Snapshot of a single actor.
    #[must_use]
    pub fn actor(world: &World, actor: ActorId) -> Option<ActorSnapshot> {
        actor_view(world)
            .into_vec()
            .into_iter()
            .find(|snapshot| snapshot.id == actor)
    }

    /// Snapshot of the first player-controlled actor.
    #[must_use]
    pub fn player(world: &World) -> Option<ActorSnapshot> {
        actor_view(world)
            .into_vec()
            .into_iter()
            .find(|snapshot| snapshot.kind == ActorKind::Player)
    }

    /// Cards currently held, in draw order.
    #[must_use]
    pub fn hand(world: &World) -> &[CardKind] {
        &world.hand
    }

    /// Read-only snapshot describing all actors in deterministic order.
    #[derive(Clone, Debug, Default)]
    pub struct ActorView {
        snapshots: Vec<ActorSnapshot>,
    }

    impl ActorView {
        /// Iterator over the captured actor snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &ActorSnapshot> {
            self.snapshots.iter()
        }

        /// Iterator over actors of a single kind.
        pub fn of_kind(&self, kind: ActorKind) -> impl Iterator<Item = &ActorSnapshot> {
            self.snapshots
                .iter()
                .filter(move |snapshot| snapshot.kind == kind)
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ActorSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single actor's state used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ActorSnapshot {
        /// Identifier assigned to the actor.
        pub id: ActorId,
        /// Side the actor fights for.
        pub kind: ActorKind,
        /// Tile the actor occupies.
        pub coord: HexCoord,
    }
}
