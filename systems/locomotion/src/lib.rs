#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path following for committed moves.
//!
//! The world moves actors instantly; this system replays each committed route
//! over simulated time so a renderer can slide actors between tile centres.

use std::time::Duration;

use glam::Vec2;
use hex_battle_core::{ActorId, Event, Path};
use hex_battle_world::HexLayout;

const DEFAULT_DURATION_PER_TILE: Duration = Duration::from_millis(500);

/// Configuration parameters required to construct the locomotion system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    duration_per_tile: Duration,
}

impl Config {
    /// Creates a new configuration using the provided time spent per tile.
    #[must_use]
    pub const fn new(duration_per_tile: Duration) -> Self {
        Self { duration_per_tile }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_PER_TILE)
    }
}

/// Interpolated position of an actor that is travelling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionUpdate {
    /// Actor being moved.
    pub actor: ActorId,
    /// World-space position at the end of the frame.
    pub position: Vec2,
    /// Whether the actor reached the end of its route this frame.
    pub arrived: bool,
}

#[derive(Debug)]
struct Follower {
    actor: ActorId,
    waypoints: Vec<Vec2>,
    elapsed: Duration,
}

impl Follower {
    fn total(&self, per_tile: Duration) -> Duration {
        let segments = u32::try_from(self.waypoints.len().saturating_sub(1)).unwrap_or(u32::MAX);
        per_tile.saturating_mul(segments)
    }

    fn position(&self, per_tile: Duration) -> Vec2 {
        let last = self.waypoints.len().saturating_sub(1);
        if per_tile.is_zero() || self.elapsed >= self.total(per_tile) {
            return self.waypoints[last];
        }

        let progress = self.elapsed.as_secs_f32() / per_tile.as_secs_f32();
        let segment = (progress.floor() as usize).min(last.saturating_sub(1));
        let t = (progress - segment as f32).clamp(0.0, 1.0);
        self.waypoints[segment].lerp(self.waypoints[segment + 1], t)
    }
}

/// Pure system that turns committed moves into smooth per-frame positions.
#[derive(Debug)]
pub struct Locomotion {
    duration_per_tile: Duration,
    followers: Vec<Follower>,
}

impl Locomotion {
    /// Creates a new locomotion system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            duration_per_tile: config.duration_per_tile,
            followers: Vec::new(),
        }
    }

    /// Starts following every route announced by `ActorMoved` events.
    ///
    /// A new route for an actor that is still travelling replaces the old one.
    pub fn handle(&mut self, events: &[Event], layout: &HexLayout) {
        for event in events {
            let Event::ActorMoved {
                actor, from, path, ..
            } = event
            else {
                continue;
            };

            let Some(waypoints) = waypoints(layout, layout.coord_to_world_position(*from), path)
            else {
                continue;
            };

            self.followers.retain(|follower| follower.actor != *actor);
            tracing::debug!(
                actor = actor.get(),
                tiles = path.distance_in_tiles(),
                "following route"
            );
            self.followers.push(Follower {
                actor: *actor,
                waypoints,
                elapsed: Duration::ZERO,
            });
        }
    }

    /// Advances every follower by `dt` and reports their new positions.
    ///
    /// Followers that reach their goal are reported once with `arrived` set
    /// and then dropped.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<PositionUpdate>) {
        let per_tile = self.duration_per_tile;
        for follower in &mut self.followers {
            follower.elapsed = follower.elapsed.saturating_add(dt);
            out.push(PositionUpdate {
                actor: follower.actor,
                position: follower.position(per_tile),
                arrived: follower.elapsed >= follower.total(per_tile),
            });
        }
        self.followers
            .retain(|follower| follower.elapsed < follower.total(per_tile));
    }

    /// Current position of a travelling actor.
    #[must_use]
    pub fn position(&self, actor: ActorId) -> Option<Vec2> {
        self.followers
            .iter()
            .find(|follower| follower.actor == actor)
            .map(|follower| follower.position(self.duration_per_tile))
    }

    /// Reports whether no actor is travelling.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.followers.is_empty()
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn waypoints(layout: &HexLayout, origin: Vec2, path: &Path) -> Option<Vec<Vec2>> {
    if !path.is_ok() || path.distance_in_tiles() == 0 {
        return None;
    }
    let mut waypoints = Vec::with_capacity(path.distance_in_tiles() + 1);
    waypoints.push(origin);
    for index in path.tiles() {
        waypoints.push(layout.index_to_world_position(*index)?);
    }
    Some(waypoints)
}

#[cfg(test)]
mod tests {
    use hex_battle_core::{HexCoord, Path};

    use super::*;

    fn layout() -> HexLayout {
        HexLayout::new(6, 3, 1.0).expect("valid layout")
    }

    fn moved(layout: &HexLayout, from: HexCoord, to: HexCoord, tiles: &[HexCoord]) -> Event {
        let indices = tiles
            .iter()
            .map(|coord| layout.coord_to_index(*coord).expect("in bounds"))
            .collect();
        Event::ActorMoved {
            actor: ActorId::new(1),
            from,
            to,
            path: Path::found(from, to, indices),
        }
    }

    fn assert_close(a: Vec2, b: Vec2) {
        assert!(a.distance(b) < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn halfway_through_a_tile_sits_between_centres() {
        let layout = layout();
        let from = HexCoord::new(0, 0);
        let to = HexCoord::new(2, 0);
        let mut locomotion = Locomotion::default();
        locomotion.handle(&[moved(&layout, from, to, &[HexCoord::new(1, 0), to])], &layout);

        let mut updates = Vec::new();
        locomotion.advance(Duration::from_millis(250), &mut updates);

        let expected = layout
            .coord_to_world_position(from)
            .lerp(layout.coord_to_world_position(HexCoord::new(1, 0)), 0.5);
        assert_eq!(updates.len(), 1);
        assert_close(updates[0].position, expected);
        assert!(!updates[0].arrived);
    }

    #[test]
    fn follower_is_dropped_after_reaching_the_goal() {
        let layout = layout();
        let from = HexCoord::new(0, 0);
        let to = HexCoord::new(2, 0);
        let mut locomotion = Locomotion::default();
        locomotion.handle(&[moved(&layout, from, to, &[HexCoord::new(1, 0), to])], &layout);

        let mut updates = Vec::new();
        locomotion.advance(Duration::from_millis(750), &mut updates);
        assert!(!locomotion.is_idle());
        assert_close(
            updates[0].position,
            layout
                .coord_to_world_position(HexCoord::new(1, 0))
                .lerp(layout.coord_to_world_position(to), 0.5),
        );

        updates.clear();
        locomotion.advance(Duration::from_millis(400), &mut updates);
        assert!(updates[0].arrived);
        assert_close(updates[0].position, layout.coord_to_world_position(to));
        assert!(locomotion.is_idle());
        assert_eq!(locomotion.position(ActorId::new(1)), None);
    }

    #[test]
    fn failed_and_empty_routes_are_ignored() {
        let layout = layout();
        let origin = HexCoord::new(1, 1);
        let mut locomotion = Locomotion::default();
        locomotion.handle(
            &[
                moved(&layout, origin, origin, &[]),
                Event::ActorMoved {
                    actor: ActorId::new(2),
                    from: origin,
                    to: HexCoord::new(4, 1),
                    path: Path::no_path(origin, HexCoord::new(4, 1)),
                },
            ],
            &layout,
        );
        assert!(locomotion.is_idle());
    }

    #[test]
    fn new_route_replaces_the_previous_one() {
        let layout = layout();
        let mut locomotion = Locomotion::new(Config::new(Duration::from_secs(1)));
        let first = HexCoord::new(1, 0);
        let second = HexCoord::new(0, 0);
        locomotion.handle(&[moved(&layout, second, first, &[first])], &layout);
        locomotion.handle(&[moved(&layout, first, second, &[second])], &layout);

        assert_close(
            locomotion.position(ActorId::new(1)).expect("travelling"),
            layout.coord_to_world_position(first),
        );
    }
}
