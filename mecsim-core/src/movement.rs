//! Movement models for user equipments.
//!
//! The movement collaborator supplies initial positions at episode reset and
//! one position update per UE per step, after the pipeline has run. Models
//! reseed at reset so episodes with the same seed are identical.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mecsim_common::{Position, UeId};

use crate::entities::UserEquipment;

/// Closed set of movement models.
#[derive(Debug, Clone)]
pub enum MovementModel {
    /// UEs walk toward uniformly drawn waypoints at their configured
    /// velocity, picking a new waypoint upon arrival.
    RandomWaypoint(RandomWaypoint),
    /// UEs stay where they are; initial positions are still random.
    Static(RandomWaypoint),
}

impl MovementModel {
    /// A random-waypoint model on a `width x height` playground.
    pub fn random_waypoint(width: f64, height: f64, seed: u64) -> Self {
        MovementModel::RandomWaypoint(RandomWaypoint::new(width, height, seed))
    }

    /// A static model that only randomizes initial placement.
    pub fn static_placement(width: f64, height: f64, seed: u64) -> Self {
        MovementModel::Static(RandomWaypoint::new(width, height, seed))
    }

    /// Reseeds the model and forgets per-episode state.
    pub fn reset(&mut self) {
        match self {
            MovementModel::RandomWaypoint(m) | MovementModel::Static(m) => m.reset(),
        }
    }

    /// Forgets per-episode waypoints without reseeding, for episodes that
    /// continue the random stream.
    pub fn clear_waypoints(&mut self) {
        match self {
            MovementModel::RandomWaypoint(m) | MovementModel::Static(m) => m.waypoints.clear(),
        }
    }

    /// Draws a UE's initial position at episode reset.
    pub fn initial_position(&mut self, ue: &UserEquipment) -> Position {
        match self {
            MovementModel::RandomWaypoint(m) | MovementModel::Static(m) => {
                m.random_position(ue.id)
            }
        }
    }

    /// Returns the UE's position for the next step.
    pub fn step_position(&mut self, ue: &UserEquipment) -> Position {
        match self {
            MovementModel::RandomWaypoint(m) => m.advance(ue),
            MovementModel::Static(_) => ue.position,
        }
    }
}

/// Random-waypoint state: the playground bounds, a seeded RNG and each UE's
/// current waypoint.
#[derive(Debug, Clone)]
pub struct RandomWaypoint {
    width: f64,
    height: f64,
    seed: u64,
    rng: StdRng,
    waypoints: BTreeMap<UeId, Position>,
}

impl RandomWaypoint {
    fn new(width: f64, height: f64, seed: u64) -> Self {
        Self {
            width,
            height,
            seed,
            rng: StdRng::seed_from_u64(seed),
            waypoints: BTreeMap::new(),
        }
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.waypoints.clear();
    }

    fn random_position(&mut self, _ue: UeId) -> Position {
        Position::new(
            self.rng.gen_range(0.0..self.width),
            self.rng.gen_range(0.0..self.height),
        )
    }

    fn advance(&mut self, ue: &UserEquipment) -> Position {
        let waypoint = match self.waypoints.get(&ue.id) {
            Some(w) if ue.position.distance_to(w) > ue.velocity => *w,
            _ => {
                let fresh = self.random_position(ue.id);
                self.waypoints.insert(ue.id, fresh);
                fresh
            }
        };

        let distance = ue.position.distance_to(&waypoint);
        if distance <= ue.velocity {
            return waypoint;
        }
        // unit direction scaled by one step of travel
        let scale = ue.velocity / distance;
        Position::new(
            ue.position.x + (waypoint.x - ue.position.x) * scale,
            ue.position.y + (waypoint.y - ue.position.y) * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mecsim_common::UeParams;

    fn ue() -> UserEquipment {
        let mut ue = UserEquipment::new(UeId(0), &UeParams::default());
        ue.position = Position::new(100.0, 100.0);
        ue
    }

    #[test]
    fn test_initial_positions_within_bounds() {
        let mut model = MovementModel::random_waypoint(200.0, 150.0, 1);
        for _ in 0..100 {
            let p = model.initial_position(&ue());
            assert!((0.0..200.0).contains(&p.x));
            assert!((0.0..150.0).contains(&p.y));
        }
    }

    #[test]
    fn test_step_moves_at_most_velocity() {
        let mut model = MovementModel::random_waypoint(200.0, 200.0, 1);
        let mut ue = ue();
        for _ in 0..50 {
            let next = model.step_position(&ue);
            assert!(ue.position.distance_to(&next) <= ue.velocity + 1e-9);
            ue.position = next;
        }
    }

    #[test]
    fn test_reset_restores_sequence() {
        let mut model = MovementModel::random_waypoint(200.0, 200.0, 7);
        let first = model.initial_position(&ue());
        model.initial_position(&ue());

        model.reset();
        assert_eq!(model.initial_position(&ue()), first);
    }

    #[test]
    fn test_static_model_keeps_position() {
        let mut model = MovementModel::static_placement(200.0, 200.0, 1);
        let ue = ue();
        assert_eq!(model.step_position(&ue), ue.position);
    }
}
