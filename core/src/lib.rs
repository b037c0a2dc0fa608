#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the hex battle engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative battle world, and pure systems. Systems submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing
//! what actually changed. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use serde::{Deserialize, Serialize};

/// Movement cost that marks a tile as impassable or occupied.
pub const MOVEMENT_COST_MAX: u16 = u16::MAX;

/// Movement cost assigned to ordinary walkable tiles.
pub const DEFAULT_MOVEMENT_COST: u16 = 1;

/// Number of neighbours surrounding a hexagonal tile.
pub const MAX_NEIGHBORS: usize = 6;

/// Flow-field distance stored for tiles that cannot be reached from the origin.
pub const UNREACHABLE: u32 = u32::MAX;

/// Cards the battle draws into the hand at the start of each round.
pub const DEFAULT_HAND_SIZE: usize = 5;

/// Tiles the player may travel during a single turn unless configured otherwise.
pub const DEFAULT_MOVEMENT_PER_TURN: u32 = 2;

/// Address of a tile in the offset hex grid.
///
/// `x` selects the column and `y` the row. Odd rows sit half a tile further
/// east than even rows. A coordinate is not guaranteed to lie inside any grid;
/// validity is decided by the grid that interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    x: i32,
    y: i32,
}

impl HexCoord {
    /// Coordinate that lies outside every grid.
    ///
    /// Returned by conversions whose input has no sensible tile.
    pub const OFF_GRID: Self = Self::new(i32::MIN, i32::MIN);

    /// Creates a new hex coordinate from a column and a row.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Reports whether the coordinate sits on a shifted (odd) row.
    #[must_use]
    pub const fn is_odd_row(&self) -> bool {
        self.y & 1 == 1
    }

    /// Returns the coordinate adjacent to `self` in the provided direction.
    ///
    /// The result may lie outside any grid. Steps past the `i32` range stay
    /// pinned at the boundary.
    #[must_use]
    pub const fn neighbor(self, direction: HexDirection) -> Self {
        let (dx, dy) = direction.offset(self.is_odd_row());
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Adjacent coordinate, or `None` when the step leaves the `i32` range.
    #[must_use]
    pub const fn checked_neighbor(self, direction: HexDirection) -> Option<Self> {
        let (dx, dy) = direction.offset(self.is_odd_row());
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => Some(Self::new(x, y)),
            _ => None,
        }
    }

    /// Enumerates all six neighbouring coordinates in canonical direction order.
    #[must_use]
    pub fn neighbors(self) -> [HexCoord; MAX_NEIGHBORS] {
        HexDirection::ALL.map(|direction| self.neighbor(direction))
    }

    /// Counts the number of tile steps between two coordinates on an open grid.
    ///
    /// Saturates at `u32::MAX`.
    #[must_use]
    pub fn hex_distance(self, other: HexCoord) -> u32 {
        let (aq, ar) = self.to_axial();
        let (bq, br) = other.to_axial();
        let dq = i64::from(aq) - i64::from(bq);
        let dr = i64::from(ar) - i64::from(br);
        let ds = -dq - dr;
        let steps = dq
            .unsigned_abs()
            .max(dr.unsigned_abs())
            .max(ds.unsigned_abs());
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Converts the offset coordinate into axial `(q, r)` form.
    ///
    /// `q` saturates at the `i32` range.
    #[must_use]
    pub const fn to_axial(self) -> (i32, i32) {
        let q = self.x.saturating_sub((self.y - (self.y & 1)) / 2);
        (q, self.y)
    }

    /// Converts an axial `(q, r)` pair back into an offset coordinate.
    ///
    /// The column saturates at the `i32` range.
    #[must_use]
    pub const fn from_axial(q: i32, r: i32) -> Self {
        Self::new(q.saturating_add((r - (r & 1)) / 2), r)
    }
}

/// The six directions leading out of a pointy-top hexagon.
///
/// Variants are declared in canonical order; [`HexDirection::ALL`] and
/// [`HexDirection::index`] follow the same numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HexDirection {
    /// Movement toward increasing column indices along the same row.
    East,
    /// Movement toward the upper-right neighbour.
    NorthEast,
    /// Movement toward the upper-left neighbour.
    NorthWest,
    /// Movement toward decreasing column indices along the same row.
    West,
    /// Movement toward the lower-left neighbour.
    SouthWest,
    /// Movement toward the lower-right neighbour.
    SouthEast,
}

impl HexDirection {
    /// All directions in canonical order.
    pub const ALL: [HexDirection; MAX_NEIGHBORS] = [
        Self::East,
        Self::NorthEast,
        Self::NorthWest,
        Self::West,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Position of the direction within [`HexDirection::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::East => 0,
            Self::NorthEast => 1,
            Self::NorthWest => 2,
            Self::West => 3,
            Self::SouthWest => 4,
            Self::SouthEast => 5,
        }
    }

    /// Resolves a direction from an arbitrary index, wrapping modulo six.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % MAX_NEIGHBORS]
    }

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    /// Column and row delta for this direction.
    ///
    /// Odd rows are shifted east, so diagonal steps depend on the parity of
    /// the row the step starts from.
    #[must_use]
    pub const fn offset(self, odd_row: bool) -> (i32, i32) {
        match (self, odd_row) {
            (Self::East, _) => (1, 0),
            (Self::West, _) => (-1, 0),
            (Self::NorthEast, false) => (0, -1),
            (Self::NorthWest, false) => (-1, -1),
            (Self::SouthWest, false) => (-1, 1),
            (Self::SouthEast, false) => (0, 1),
            (Self::NorthEast, true) => (1, -1),
            (Self::NorthWest, true) => (0, -1),
            (Self::SouthWest, true) => (0, 1),
            (Self::SouthEast, true) => (1, 1),
        }
    }
}

/// Transient tag attached to a tile for highlighting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileEffect {
    /// The tile carries no highlight.
    #[default]
    None,
    /// The tile lies within the active actor's movement range.
    MoveableArea,
    /// The tile holds an actor that may be attacked.
    Attackable,
}

/// A single cell of the battle grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Cost of entering the tile; [`MOVEMENT_COST_MAX`] marks it impassable.
    pub movement_cost: u16,
    /// Highlight currently attached to the tile.
    pub effect: TileEffect,
}

impl Tile {
    /// Reports whether the tile blocks traversal.
    #[must_use]
    pub const fn is_obstacle(&self) -> bool {
        self.movement_cost >= MOVEMENT_COST_MAX
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            movement_cost: DEFAULT_MOVEMENT_COST,
            effect: TileEffect::None,
        }
    }
}

/// Unique identifier assigned to an actor by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Side an actor fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    /// The actor controlled through player input.
    Player,
    /// An actor driven by the battle's movement AI.
    Npc,
}

/// Cards that may be drawn into the player's hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    /// Melee attacks inflict burning.
    IgniteWeapon,
    /// Gain armor.
    Defend,
    /// Restore health.
    Meal,
    /// Weaken an enemy over time.
    Corruption,
    /// Conjure a random weapon.
    RandomWeapon,
}

impl CardKind {
    /// Every card kind in draw-table order.
    pub const ALL: [CardKind; 5] = [
        Self::IgniteWeapon,
        Self::Defend,
        Self::Meal,
        Self::Corruption,
        Self::RandomWeapon,
    ];
}

/// Phases the battle cycles through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// The battle has been set up but no round has started.
    BattleBegin,
    /// A new round starts and resources are refilled.
    RoundBegin,
    /// The player's turn is being prepared.
    TurnPlayerBegin,
    /// The player may issue moves until ending the turn.
    TurnPlayerInProgress,
    /// The player's turn is being torn down.
    TurnPlayerEnd,
    /// Non-player actors decide and commit their moves.
    TurnEntityBegin,
    /// Non-player actors finish acting.
    TurnEntityInProgress,
    /// The non-player turn is being torn down.
    TurnEntityEnd,
    /// The round is complete.
    RoundEnd,
    /// The battle is over; no further transitions exist.
    BattleEnd,
}

impl Phase {
    /// Reports whether the phase waits for player input instead of advancing on its own.
    #[must_use]
    pub const fn awaits_player(self) -> bool {
        matches!(self, Self::TurnPlayerInProgress)
    }

    /// Reports whether the phase is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::BattleEnd)
    }
}

/// Outcome of a path query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathResult {
    /// A route was found.
    Ok,
    /// No route exists in the current adjacency graph, or an endpoint is invalid.
    NoPath,
}

/// Ordered route between two coordinates.
///
/// The tile sequence starts with the first step after `start` and ends with
/// `goal`. A path whose result is [`PathResult::NoPath`] carries no tiles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    start: HexCoord,
    goal: HexCoord,
    tiles: Vec<usize>,
    result: PathResult,
}

impl Path {
    /// Creates a successful path from the provided tile indices.
    #[must_use]
    pub fn found(start: HexCoord, goal: HexCoord, tiles: Vec<usize>) -> Self {
        Self {
            start,
            goal,
            tiles,
            result: PathResult::Ok,
        }
    }

    /// Creates a failed path that carries no tiles.
    #[must_use]
    pub fn no_path(start: HexCoord, goal: HexCoord) -> Self {
        Self {
            start,
            goal,
            tiles: Vec::new(),
            result: PathResult::NoPath,
        }
    }

    /// Coordinate the route starts from.
    #[must_use]
    pub const fn start(&self) -> HexCoord {
        self.start
    }

    /// Coordinate the route ends at.
    #[must_use]
    pub const fn goal(&self) -> HexCoord {
        self.goal
    }

    /// Outcome of the query that produced the path.
    #[must_use]
    pub const fn result(&self) -> PathResult {
        self.result
    }

    /// Reports whether the query found a route.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result == PathResult::Ok
    }

    /// Number of steps along the route.
    #[must_use]
    pub fn distance_in_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Tile index reached after `step + 1` steps.
    #[must_use]
    pub fn path_at(&self, step: usize) -> Option<usize> {
        self.tiles.get(step).copied()
    }

    /// Ordered tile indices of the route.
    #[must_use]
    pub fn tiles(&self) -> &[usize] {
        &self.tiles
    }
}

/// Reasons a movement command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveError {
    /// No actor with the provided identifier exists.
    UnknownActor,
    /// The requested destination lies outside the grid.
    OutOfBounds,
    /// The requested destination is the actor's current tile.
    AlreadyThere,
    /// The requested destination is impassable or occupied.
    Obstructed,
    /// No route connects the actor to the destination.
    NoPath,
}

/// Reasons an actor placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested tile lies outside the grid.
    OutOfBounds,
    /// The requested tile is impassable or already occupied.
    Occupied,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid with a fresh, fully walkable one of the given size.
    ConfigureGrid {
        /// Number of tile columns.
        width: u32,
        /// Number of tile rows.
        height: u32,
        /// Distance from a tile centre to any of its corners, in world units.
        tile_size: f32,
    },
    /// Writes the movement cost of a single tile and schedules an edge rebuild.
    SetMovementCost {
        /// Tile to update.
        coord: HexCoord,
        /// New movement cost.
        cost: u16,
    },
    /// Forces an immediate rebuild of the adjacency cache.
    RebuildEdges,
    /// Tags a tile with a highlight.
    SetTileEffect {
        /// Tile to tag.
        coord: HexCoord,
        /// Highlight to attach.
        effect: TileEffect,
    },
    /// Removes any highlight from a tile.
    ClearTileEffect {
        /// Tile to clear.
        coord: HexCoord,
    },
    /// Removes a highlight from every tile currently carrying it.
    ClearTileEffectOfKind {
        /// Highlight to remove.
        effect: TileEffect,
    },
    /// Places a new actor on a free tile, marking the tile occupied.
    PlaceActor {
        /// Side the actor fights for.
        kind: ActorKind,
        /// Tile the actor should occupy.
        coord: HexCoord,
    },
    /// Moves an actor along the shortest route to the goal.
    MoveActor {
        /// Actor to move.
        actor: ActorId,
        /// Destination tile.
        goal: HexCoord,
        /// Highlight that follows the actor: set on the goal and cleared from the origin.
        tag: Option<TileEffect>,
    },
    /// Recomputes the movement-range highlight around an origin.
    HighlightReachable {
        /// Tile the range is measured from.
        origin: HexCoord,
        /// Maximum distance, in tiles, that should be highlighted.
        budget: u32,
    },
    /// Adds a card to the hand.
    DrawCard {
        /// Card to add.
        card: CardKind,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the grid was replaced.
    GridConfigured {
        /// Number of tile columns.
        width: u32,
        /// Number of tile rows.
        height: u32,
    },
    /// Confirms that a tile's movement cost changed.
    MovementCostChanged {
        /// Tile that changed.
        coord: HexCoord,
        /// Cost now stored on the tile.
        cost: u16,
    },
    /// Announces that the adjacency cache now reflects the grid.
    EdgesRebuilt,
    /// Confirms that a tile's highlight changed.
    TileEffectChanged {
        /// Tile that changed.
        coord: HexCoord,
        /// Highlight now attached to the tile.
        effect: TileEffect,
    },
    /// Confirms that a highlight was removed across the grid.
    TileEffectsCleared {
        /// Highlight that was removed.
        effect: TileEffect,
        /// Number of tiles that carried it.
        count: usize,
    },
    /// Confirms that an actor entered the battle.
    ActorPlaced {
        /// Identifier assigned to the actor.
        actor: ActorId,
        /// Side the actor fights for.
        kind: ActorKind,
        /// Tile the actor occupies.
        coord: HexCoord,
    },
    /// Reports that an actor placement was rejected.
    ActorPlacementRejected {
        /// Side requested for the actor.
        kind: ActorKind,
        /// Tile requested for the actor.
        coord: HexCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that an actor moved and transferred its occupancy.
    ActorMoved {
        /// Actor that moved.
        actor: ActorId,
        /// Tile the actor left.
        from: HexCoord,
        /// Tile the actor now occupies.
        to: HexCoord,
        /// Route the actor travelled.
        path: Path,
    },
    /// Reports that a movement command was rejected.
    MoveRejected {
        /// Actor that was asked to move.
        actor: ActorId,
        /// Destination that was requested.
        goal: HexCoord,
        /// Specific reason the move failed.
        reason: MoveError,
    },
    /// Confirms that the movement-range highlight was recomputed.
    ReachableHighlighted {
        /// Tile the range was measured from.
        origin: HexCoord,
        /// Maximum highlighted distance.
        budget: u32,
        /// Tiles now tagged as moveable, in index order.
        tiles: Vec<HexCoord>,
    },
    /// Confirms that a card was added to the hand.
    CardDrawn {
        /// Card that was drawn.
        card: CardKind,
        /// Number of cards held after the draw.
        hand_size: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        ActorId, HexCoord, HexDirection, Path, PathResult, Tile, TileEffect, MOVEMENT_COST_MAX,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn grid_values_round_trip_through_bincode() {
        assert_round_trip(&HexCoord::new(-1, 7));
        assert_round_trip(&ActorId::new(42));
        assert_round_trip(&Tile {
            movement_cost: MOVEMENT_COST_MAX,
            effect: TileEffect::Attackable,
        });
        assert_round_trip(&Path::found(
            HexCoord::new(0, 0),
            HexCoord::new(1, 1),
            vec![1, 9],
        ));
    }

    #[test]
    fn neighbor_offsets_depend_on_row_parity() {
        let even = HexCoord::new(2, 2);
        assert_eq!(even.neighbor(HexDirection::NorthEast), HexCoord::new(2, 1));
        assert_eq!(even.neighbor(HexDirection::NorthWest), HexCoord::new(1, 1));
        assert_eq!(even.neighbor(HexDirection::SouthEast), HexCoord::new(2, 3));

        let odd = HexCoord::new(2, 3);
        assert_eq!(odd.neighbor(HexDirection::NorthEast), HexCoord::new(3, 2));
        assert_eq!(odd.neighbor(HexDirection::NorthWest), HexCoord::new(2, 2));
        assert_eq!(odd.neighbor(HexDirection::SouthWest), HexCoord::new(2, 4));
    }

    #[test]
    fn opposite_directions_lead_back() {
        for coord in [HexCoord::new(3, 4), HexCoord::new(3, 5)] {
            for direction in HexDirection::ALL {
                let there = coord.neighbor(direction);
                assert_eq!(there.neighbor(direction.opposite()), coord);
            }
        }
    }

    #[test]
    fn every_neighbor_is_one_step_away() {
        for coord in [HexCoord::new(0, 0), HexCoord::new(4, 3)] {
            for neighbor in coord.neighbors() {
                assert_eq!(coord.hex_distance(neighbor), 1);
            }
        }
        assert_eq!(HexCoord::new(0, 0).hex_distance(HexCoord::new(3, 0)), 3);
    }

    #[test]
    fn axial_conversion_is_bijective() {
        for y in -3..6 {
            for x in -3..6 {
                let coord = HexCoord::new(x, y);
                let (q, r) = coord.to_axial();
                assert_eq!(HexCoord::from_axial(q, r), coord);
            }
        }
    }

    #[test]
    fn arithmetic_at_the_i32_limits_does_not_overflow() {
        let edge = HexCoord::new(i32::MAX, 0);
        assert_eq!(edge.checked_neighbor(HexDirection::East), None);
        assert_eq!(edge.neighbor(HexDirection::East), edge);
        assert_eq!(
            edge.checked_neighbor(HexDirection::West),
            Some(HexCoord::new(i32::MAX - 1, 0))
        );

        let far_corner = HexCoord::new(i32::MIN, i32::MIN);
        assert_eq!(far_corner.neighbor(HexDirection::NorthWest), far_corner);
        assert_eq!(far_corner.hex_distance(HexCoord::new(i32::MAX, i32::MAX)), u32::MAX);
        let (q, r) = HexCoord::new(i32::MIN, i32::MAX).to_axial();
        assert_eq!((q, r), (i32::MIN, i32::MAX));
        assert_eq!(HexCoord::from_axial(i32::MAX, i32::MAX).x(), i32::MAX);
    }

    #[test]
    fn direction_index_wraps() {
        assert_eq!(HexDirection::from_index(7), HexDirection::NorthEast);
        assert_eq!(HexDirection::East.opposite(), HexDirection::West);
        assert_eq!(HexDirection::NorthEast.opposite(), HexDirection::SouthWest);
    }

    #[test]
    fn failed_path_has_no_tiles() {
        let path = Path::no_path(HexCoord::new(0, 0), HexCoord::new(5, 5));
        assert_eq!(path.result(), PathResult::NoPath);
        assert_eq!(path.distance_in_tiles(), 0);
        assert_eq!(path.path_at(0), None);
    }
}
