#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn sequencing for a battle.
//!
//! The state machine is a pure function from the current [`TurnState`] and a
//! [`TurnInput`] to the next state plus the world commands that realise it.
//! [`Battle`] owns a world, a state, and a seeded random generator and applies
//! those commands in order.

mod battle;
mod config;

use hex_battle_core::{
    CardKind, Command, HexCoord, Phase, TileEffect, DEFAULT_HAND_SIZE, DEFAULT_MOVEMENT_PER_TURN,
};
use hex_battle_system_wander::Wander;
use hex_battle_world::{query, World};
use rand::{seq::SliceRandom, Rng};

pub use battle::Battle;
pub use config::{BattleConfig, ConfigError};

/// Per-battle limits consulted by the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnRules {
    movement_per_turn: u32,
    hand_size: usize,
}

impl TurnRules {
    /// Creates rules using the provided movement allowance and hand size.
    #[must_use]
    pub const fn new(movement_per_turn: u32, hand_size: usize) -> Self {
        Self {
            movement_per_turn,
            hand_size,
        }
    }

    /// Tiles the player may travel per turn.
    #[must_use]
    pub const fn movement_per_turn(&self) -> u32 {
        self.movement_per_turn
    }

    /// Cards held after a refill.
    #[must_use]
    pub const fn hand_size(&self) -> usize {
        self.hand_size
    }
}

impl Default for TurnRules {
    fn default() -> Self {
        Self::new(DEFAULT_MOVEMENT_PER_TURN, DEFAULT_HAND_SIZE)
    }
}

/// Snapshot of the turn machine between transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnState {
    /// Phase the battle is in.
    pub phase: Phase,
    /// Tiles the player may still travel this turn.
    pub movement_budget: u32,
    /// Completed rounds.
    pub round: u32,
    /// Destination of the player's last committed move this turn.
    pub move_goal: Option<HexCoord>,
}

impl TurnState {
    /// State of a battle that has been set up but not started.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::BattleBegin,
            movement_budget: 0,
            round: 0,
            move_goal: None,
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs that drive the turn machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnInput {
    /// Runs the automatic work of the current phase and moves on.
    Advance,
    /// Player gesture that started on `start` and was released on `end`.
    AttemptMove {
        /// Tile under the pointer when the gesture began.
        start: HexCoord,
        /// Tile under the pointer when the gesture ended.
        end: HexCoord,
    },
    /// Player gives up the rest of the turn.
    EndTurn,
    /// Ends the battle from any non-terminal phase.
    Conclude,
}

/// Next state plus the commands that must be applied to reach it.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// State after the input has been handled.
    pub state: TurnState,
    /// World commands to apply, in order.
    pub effects: Vec<Command>,
}

/// Reasons an input leaves the turn machine where it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurnRejection {
    /// The input is not accepted in the current phase.
    #[error("input is not accepted during {0:?}")]
    WrongPhase(Phase),
    /// The phase waits for a player decision and cannot advance on its own.
    #[error("the player has not ended the turn yet")]
    AwaitingPlayer,
    /// The battle is over.
    #[error("the battle has ended")]
    BattleOver,
    /// The gesture did not start and end on the same tile.
    #[error("gesture started on {start:?} but ended on {end:?}")]
    GestureMismatch {
        /// Tile the gesture started on.
        start: HexCoord,
        /// Tile the gesture ended on.
        end: HexCoord,
    },
    /// The selected tile lies outside the grid.
    #[error("tile {0:?} is outside the grid")]
    InvalidTile(HexCoord),
    /// No player actor is present.
    #[error("no player actor in the battle")]
    NoPlayer,
    /// No route leads from the player to the selected tile.
    #[error("no route to {0:?}")]
    NoPath(HexCoord),
    /// The route is empty or longer than the remaining budget.
    #[error("route of {distance} tiles does not fit the remaining budget of {budget}")]
    OutOfBudget {
        /// Length of the route.
        distance: u32,
        /// Remaining movement budget.
        budget: u32,
    },
}

/// Computes the next turn state for an input without touching the world.
///
/// Randomness is drawn only from `rng`. On rejection the caller keeps its
/// current state and applies nothing.
pub fn transition<R>(
    state: TurnState,
    input: TurnInput,
    rules: &TurnRules,
    world: &World,
    rng: &mut R,
) -> Result<Transition, TurnRejection>
where
    R: Rng + ?Sized,
{
    if state.phase.is_terminal() {
        return Err(TurnRejection::BattleOver);
    }

    let transition = match input {
        TurnInput::Advance => advance(state, rules, world, rng)?,
        TurnInput::AttemptMove { start, end } => attempt_move(state, start, end, world)?,
        TurnInput::EndTurn => {
            if state.phase != Phase::TurnPlayerInProgress {
                return Err(TurnRejection::WrongPhase(state.phase));
            }
            Transition {
                state: TurnState {
                    phase: Phase::TurnPlayerEnd,
                    ..state
                },
                effects: Vec::new(),
            }
        }
        TurnInput::Conclude => Transition {
            state: TurnState {
                phase: Phase::BattleEnd,
                ..state
            },
            effects: vec![Command::ClearTileEffectOfKind {
                effect: TileEffect::MoveableArea,
            }],
        },
    };

    if transition.state.phase != state.phase {
        tracing::debug!(
            from = ?state.phase,
            to = ?transition.state.phase,
            round = transition.state.round,
            "phase changed"
        );
    }
    Ok(transition)
}

fn advance<R>(
    state: TurnState,
    rules: &TurnRules,
    world: &World,
    rng: &mut R,
) -> Result<Transition, TurnRejection>
where
    R: Rng + ?Sized,
{
    let mut effects = Vec::new();
    let next = match state.phase {
        Phase::BattleBegin => TurnState {
            phase: Phase::RoundBegin,
            ..state
        },
        Phase::RoundBegin => {
            let missing = rules.hand_size.saturating_sub(query::hand(world).len());
            for _ in 0..missing {
                if let Some(card) = CardKind::ALL.choose(rng) {
                    effects.push(Command::DrawCard { card: *card });
                }
            }
            TurnState {
                phase: Phase::TurnPlayerBegin,
                ..state
            }
        }
        Phase::TurnPlayerBegin => {
            let budget = rules.movement_per_turn;
            if let Some(player) = query::player(world) {
                effects.push(Command::HighlightReachable {
                    origin: player.coord,
                    budget,
                });
            }
            TurnState {
                phase: Phase::TurnPlayerInProgress,
                movement_budget: budget,
                move_goal: None,
                ..state
            }
        }
        Phase::TurnPlayerInProgress => return Err(TurnRejection::AwaitingPlayer),
        Phase::TurnPlayerEnd => {
            if let Some(coord) = state.move_goal {
                effects.push(Command::ClearTileEffect { coord });
            }
            effects.push(Command::ClearTileEffectOfKind {
                effect: TileEffect::MoveableArea,
            });
            TurnState {
                phase: Phase::TurnEntityBegin,
                move_goal: None,
                ..state
            }
        }
        Phase::TurnEntityBegin => {
            Wander::default().plan(world, rng, &mut effects);
            TurnState {
                phase: Phase::TurnEntityInProgress,
                ..state
            }
        }
        Phase::TurnEntityInProgress => TurnState {
            phase: Phase::TurnEntityEnd,
            ..state
        },
        Phase::TurnEntityEnd => TurnState {
            phase: Phase::RoundEnd,
            ..state
        },
        Phase::RoundEnd => TurnState {
            phase: Phase::RoundBegin,
            round: state.round.saturating_add(1),
            ..state
        },
        Phase::BattleEnd => return Err(TurnRejection::BattleOver),
    };

    Ok(Transition {
        state: next,
        effects,
    })
}

fn attempt_move(
    state: TurnState,
    start: HexCoord,
    end: HexCoord,
    world: &World,
) -> Result<Transition, TurnRejection> {
    if state.phase != Phase::TurnPlayerInProgress {
        return Err(TurnRejection::WrongPhase(state.phase));
    }
    if start != end {
        return Err(TurnRejection::GestureMismatch { start, end });
    }
    if !query::is_valid_coord(world, end) {
        return Err(TurnRejection::InvalidTile(end));
    }
    let player = query::player(world).ok_or(TurnRejection::NoPlayer)?;

    let path = query::path_find(world, player.coord, end);
    if !path.is_ok() {
        return Err(TurnRejection::NoPath(end));
    }
    let distance = u32::try_from(path.distance_in_tiles()).unwrap_or(u32::MAX);
    if distance == 0 || distance > state.movement_budget {
        return Err(TurnRejection::OutOfBudget {
            distance,
            budget: state.movement_budget,
        });
    }

    let remaining = state.movement_budget - distance;
    Ok(Transition {
        state: TurnState {
            movement_budget: remaining,
            move_goal: Some(end),
            ..state
        },
        effects: vec![
            Command::MoveActor {
                actor: player.id,
                goal: end,
                tag: None,
            },
            Command::HighlightReachable {
                origin: end,
                budget: remaining,
            },
        ],
    })
}
