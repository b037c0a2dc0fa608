//! Battle session: one world, one turn machine, one random stream.

use hex_battle_core::{ActorKind, Command, Event, HexCoord, Phase, MOVEMENT_COST_MAX};
use hex_battle_world::{self as world, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{transition, BattleConfig, ConfigError, TurnInput, TurnRejection, TurnRules, TurnState};

/// Owns every piece of mutable battle state.
///
/// Inputs are resolved by the pure transition function and the resulting
/// commands are applied to the world in order. Rejected inputs leave the
/// session untouched.
#[derive(Debug)]
pub struct Battle {
    world: World,
    state: TurnState,
    rules: TurnRules,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Battle {
    /// Sets up the grid, scenery, and actors described by `config`.
    ///
    /// Returns the session together with the events produced during setup.
    pub fn new(config: &BattleConfig) -> Result<(Self, Vec<Event>), ConfigError> {
        let layout = config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        tracing::info!(seed, width = layout.width(), height = layout.height(), "battle created");

        let mut battle = Self {
            world: World::with_layout(layout),
            state: TurnState::new(),
            rules: config.rules(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        };

        let mut commands = Vec::new();
        for coord in &config.obstacles {
            commands.push(Command::SetMovementCost {
                coord: *coord,
                cost: MOVEMENT_COST_MAX,
            });
        }
        commands.push(Command::PlaceActor {
            kind: ActorKind::Player,
            coord: config.player,
        });
        for coord in &config.npcs {
            commands.push(Command::PlaceActor {
                kind: ActorKind::Npc,
                coord: *coord,
            });
        }
        commands.push(Command::RebuildEdges);

        let events = battle.apply_all(commands);
        Ok((battle, events))
    }

    /// Read-only access to the battle world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Current turn state.
    #[must_use]
    pub const fn state(&self) -> &TurnState {
        &self.state
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Turn limits in force.
    #[must_use]
    pub const fn rules(&self) -> &TurnRules {
        &self.rules
    }

    /// Seed the random stream was created from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Handles a single input.
    pub fn submit(&mut self, input: TurnInput) -> Result<Vec<Event>, TurnRejection> {
        let next = transition(self.state, input, &self.rules, &self.world, &mut self.rng)
            .map_err(|rejection| {
                tracing::debug!(?input, %rejection, "input rejected");
                rejection
            })?;
        self.state = next.state;
        Ok(self.apply_all(next.effects))
    }

    /// Runs the automatic work of the current phase.
    pub fn advance(&mut self) -> Result<Vec<Event>, TurnRejection> {
        self.submit(TurnInput::Advance)
    }

    /// Advances through automatic phases until the player must act or the battle ends.
    pub fn advance_to_player(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while !self.state.phase.awaits_player() && !self.state.phase.is_terminal() {
            match self.advance() {
                Ok(batch) => events.extend(batch),
                Err(_) => break,
            }
        }
        events
    }

    /// Player gesture from `start` to `end`.
    pub fn attempt_move(
        &mut self,
        start: HexCoord,
        end: HexCoord,
    ) -> Result<Vec<Event>, TurnRejection> {
        self.submit(TurnInput::AttemptMove { start, end })
    }

    /// Ends the player's turn.
    pub fn end_turn(&mut self) -> Result<Vec<Event>, TurnRejection> {
        self.submit(TurnInput::EndTurn)
    }

    /// Ends the battle.
    pub fn conclude(&mut self) -> Result<Vec<Event>, TurnRejection> {
        self.submit(TurnInput::Conclude)
    }

    fn apply_all(&mut self, commands: Vec<Command>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use hex_battle_core::TileEffect;
    use hex_battle_world::query;

    use super::*;

    fn seeded() -> Battle {
        let config = BattleConfig {
            seed: Some(17),
            ..BattleConfig::default()
        };
        Battle::new(&config).expect("default layout is valid").0
    }

    #[test]
    fn setup_places_scenery_and_actors() {
        let battle = seeded();
        let world = battle.world();
        assert!(query::is_tile_obstacle(world, HexCoord::new(3, 4)));
        assert!(query::is_tile_obstacle(world, HexCoord::new(3, 3)));
        assert_eq!(
            query::player(world).map(|player| player.coord),
            Some(HexCoord::new(2, 5))
        );
        assert!(!query::grid(world).edges_are_stale());
        assert_eq!(battle.phase(), Phase::BattleBegin);
    }

    #[test]
    fn first_player_turn_has_full_hand_and_highlights() {
        let mut battle = seeded();
        let events = battle.advance_to_player();

        assert_eq!(battle.phase(), Phase::TurnPlayerInProgress);
        assert_eq!(battle.state().movement_budget, 2);
        assert_eq!(query::hand(battle.world()).len(), 5);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ReachableHighlighted { budget: 2, .. })));
        assert!(query::grid(battle.world())
            .tiles()
            .iter()
            .any(|tile| tile.effect == TileEffect::MoveableArea));
    }

    #[test]
    fn rejected_inputs_do_not_consume_randomness() {
        let mut first = seeded();
        let mut second = seeded();
        let _ = first.advance_to_player();
        let _ = second.advance_to_player();

        assert!(first.advance().is_err());
        let _ = first.end_turn().expect("player turn");
        let _ = second.end_turn().expect("player turn");

        assert_eq!(first.advance_to_player(), second.advance_to_player());
    }
}
