use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Position,
    action::{Action, move_to_target},
    environment::GameView,
};

/// Trait defining the behavior of an agent.
/// Agents decide which action to take based on the GameView.
pub trait Agent {
    /// Returns the name of the player controlled by this agent.
    fn name(&self) -> &str;

    /// Determines the action label the agent wants to play this turn.
    /// The label should be one of `view.actions`; anything else is rejected by the game.
    fn get_action(&mut self, view: &GameView) -> String;
}

/// An agent that always heads for the closest cheese by manhattan distance.
#[derive(Debug)]
pub struct ManhattanAgent {
    name: String,
}

impl ManhattanAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the cheese closest to `location`, the first one listed on ties.
    pub fn closest_cheese(location: Position, cheese: &[Position]) -> Option<Position> {
        let mut closest = None;
        let mut best_distance = usize::MAX;
        for &candidate in cheese {
            let distance = candidate.manhattan_distance(&location);
            if distance < best_distance {
                best_distance = distance;
                closest = Some(candidate);
            }
        }
        closest
    }
}

impl Agent for ManhattanAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_action(&mut self, view: &GameView) -> String {
        match Self::closest_cheese(view.location, view.cheese) {
            Some(target) => move_to_target(view.location, target, view.actions).to_string(),
            None => view.actions.label(Action::Nothing).to_string(),
        }
    }
}

/// A simple agent that moves randomly, never standing still.
#[derive(Debug)]
pub struct RandomWalker {
    name: String,
    rng: StdRng,
}

impl RandomWalker {
    pub fn new(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomWalker {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_action(&mut self, view: &GameView) -> String {
        let action = Action::MOVES[self.rng.random_range(0..Action::MOVES.len())];
        view.actions.label(action).to_string()
    }
}
