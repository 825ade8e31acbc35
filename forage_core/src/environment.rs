use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::{
    PlayerName, Position,
    action::{ActionError, ActionSet, play_action},
    agent::Agent,
    map::{MapError, Maze},
    scoring::settle_in_place,
};

/// Represents errors raised while setting up or loading a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Player '{name}' is already in the game")]
    DuplicatePlayer { name: PlayerName },
    #[error("Map string is empty")]
    EmptyMap,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown map code '{code}' at row {row}, column {column}")]
    UnknownCode {
        code: String,
        row: usize,
        column: usize,
    },
    #[error("Player marker at row {row}, column {column} has no name")]
    UnnamedPlayer { row: usize, column: usize },
}

/// Settings that stay fixed for the whole game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// The game ends after this many turns even if cheese remains.
    pub max_turns: usize,
    /// Label vocabulary agents answer with.
    pub actions: ActionSet,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_turns: 1000,
            actions: ActionSet::default(),
        }
    }
}

/// Provides a read-only view of the game relevant to one agent.
#[derive(Debug)]
pub struct GameView<'a> {
    pub name: &'a str,
    pub location: Position,
    pub maze: Maze,
    pub player_locations: &'a HashMap<PlayerName, Position>,
    pub cheese: &'a [Position],
    pub actions: &'a ActionSet,
    pub turn: usize,
}

/// Whether the game continues after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Ongoing,
    GameOver,
}

/// An action a player asked for that could not be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnFailure {
    pub player: PlayerName,
    pub error: ActionError,
}

/// Summary of one processed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Number of turns played so far, this one included.
    pub turn: usize,
    /// Cells whose cheese was eaten this turn.
    pub consumed: Vec<Position>,
    pub failures: Vec<TurnFailure>,
    pub outcome: TurnOutcome,
}

/// Manages a cheese foraging game.
pub struct Game {
    maze: Maze,
    config: GameConfig,
    player_locations: HashMap<PlayerName, Position>,
    scores: HashMap<PlayerName, f64>,
    behaviors: HashMap<PlayerName, Box<dyn Agent>>,
    cheese: Vec<Position>,
    turn: usize,
}

impl Game {
    /// Creates a game without players or cheese.
    pub fn new(maze: Maze, config: GameConfig) -> Self {
        Game {
            maze,
            config,
            player_locations: HashMap::new(),
            scores: HashMap::new(),
            behaviors: HashMap::new(),
            cheese: Vec::new(),
            turn: 0,
        }
    }

    /// Adds a player controlled by `behavior`, starting at `position` with a zero score.
    pub fn add_player(
        &mut self,
        position: Position,
        behavior: Box<dyn Agent>,
    ) -> Result<(), GameError> {
        self.maze.check_contains(position)?;
        let name = behavior.name().to_string();
        if self.behaviors.contains_key(&name) {
            return Err(GameError::DuplicatePlayer { name });
        }

        self.player_locations.insert(name.clone(), position);
        self.scores.insert(name.clone(), 0.0);
        self.behaviors.insert(name, behavior);
        Ok(())
    }

    /// Places one piece of cheese. Several pieces may share a cell.
    pub fn add_cheese(&mut self, position: Position) -> Result<(), GameError> {
        self.maze.check_contains(position)?;
        self.cheese.push(position);
        Ok(())
    }

    /// Returns true once all cheese is eaten or the turn limit is reached.
    pub fn is_over(&self) -> bool {
        self.cheese.is_empty() || self.turn >= self.config.max_turns
    }

    /// Processes one turn for all players.
    ///
    /// Every agent decides from the same snapshot, then all moves are applied
    /// and the scores are settled once. A label outside the action set leaves
    /// the player in place and is reported in `failures`.
    pub fn process_turn(&mut self) -> TurnReport {
        if self.is_over() {
            return TurnReport {
                turn: self.turn,
                consumed: Vec::new(),
                failures: Vec::new(),
                outcome: TurnOutcome::GameOver,
            };
        }

        let mut names: Vec<PlayerName> = self.behaviors.keys().cloned().collect();
        names.sort();

        let mut decisions = Vec::with_capacity(names.len());
        for name in names {
            let Some(&location) = self.player_locations.get(&name) else {
                continue;
            };
            if let Some(behavior) = self.behaviors.get_mut(&name) {
                let view = GameView {
                    name: &name,
                    location,
                    maze: self.maze,
                    player_locations: &self.player_locations,
                    cheese: &self.cheese,
                    actions: &self.config.actions,
                    turn: self.turn,
                };
                let label = behavior.get_action(&view);
                decisions.push((name, label));
            }
        }

        let mut failures = Vec::new();
        for (name, label) in decisions {
            let Some(location) = self.player_locations.get_mut(&name) else {
                continue;
            };
            match play_action(*location, &label, &self.config.actions, &self.maze) {
                Ok(next) => *location = next,
                Err(error) => {
                    warn!(player = %name, %error, "action rejected");
                    failures.push(TurnFailure {
                        player: name,
                        error,
                    });
                }
            }
        }

        let (remaining, consumed) =
            settle_in_place(&self.player_locations, &mut self.scores, &self.cheese);
        self.cheese = remaining;
        self.turn += 1;

        let outcome = if self.is_over() {
            info!(
                turn = self.turn,
                cheese_left = self.cheese.len(),
                "game over"
            );
            TurnOutcome::GameOver
        } else {
            TurnOutcome::Ongoing
        };

        TurnReport {
            turn: self.turn,
            consumed,
            failures,
            outcome,
        }
    }

    /// Plays turns until the game is over and returns the number of turns played.
    pub fn run_to_completion(&mut self) -> usize {
        while self.process_turn().outcome == TurnOutcome::Ongoing {}
        self.turn
    }

    /// Players sorted by descending score, then by name.
    pub fn standings(&self) -> Vec<(&str, f64)> {
        let mut standings: Vec<(&str, f64)> = self
            .scores
            .iter()
            .map(|(name, score)| (name.as_str(), *score))
            .collect();
        standings.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        standings
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
    pub fn cheese(&self) -> &[Position] {
        &self.cheese
    }
    pub fn turn(&self) -> usize {
        self.turn
    }
    pub fn player_locations(&self) -> &HashMap<PlayerName, Position> {
        &self.player_locations
    }
    pub fn scores(&self) -> &HashMap<PlayerName, f64> {
        &self.scores
    }
}

/// Loads a game from a string representation of a maze.
///
/// Each line is one row of whitespace-separated codes, top row first, so the
/// code in row `r` and column `c` describes cell index `r * width + c`:
/// `BL` is an empty cell, `CH` a piece of cheese and `@name` the start of the
/// player `name`. Returns the game, with its cheese placed, and the player
/// starts in reading order.
pub fn load_game_from_string(
    map_string: &str,
    config: GameConfig,
) -> Result<(Game, Vec<(PlayerName, Position)>), GameError> {
    let lines: Vec<&str> = map_string.trim().lines().collect();
    if lines.is_empty() {
        return Err(GameError::EmptyMap);
    }

    let mut width = 0;
    let mut parsed_rows: Vec<Vec<&str>> = Vec::with_capacity(lines.len());
    for (row, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if row == 0 {
            width = tokens.len();
        } else if tokens.len() != width {
            return Err(GameError::InconsistentWidth {
                row,
                expected: width,
                found: tokens.len(),
            });
        }
        parsed_rows.push(tokens);
    }

    let maze = Maze::new(width, parsed_rows.len())?;
    let mut game = Game::new(maze, config);
    let mut starts: Vec<(PlayerName, Position)> = Vec::new();
    let mut seen = HashSet::new();

    for (row, tokens) in parsed_rows.iter().enumerate() {
        for (column, token) in tokens.iter().enumerate() {
            let position = maze.index_to_position(row * width + column)?;
            match *token {
                "BL" => {}
                "CH" => game.add_cheese(position)?,
                marker if marker.starts_with('@') => {
                    let name = &marker[1..];
                    if name.is_empty() {
                        return Err(GameError::UnnamedPlayer { row, column });
                    }
                    if !seen.insert(name) {
                        return Err(GameError::DuplicatePlayer {
                            name: name.to_string(),
                        });
                    }
                    starts.push((name.to_string(), position));
                }
                unknown => {
                    return Err(GameError::UnknownCode {
                        code: unknown.to_string(),
                        row,
                        column,
                    });
                }
            }
        }
    }

    Ok((game, starts))
}

/// Picks `count` distinct random cells for cheese, skipping `exclude`.
///
/// Fewer positions are returned when the maze has fewer free cells.
pub fn scatter_cheese<R: Rng + ?Sized>(
    maze: &Maze,
    count: usize,
    exclude: &[Position],
    rng: &mut R,
) -> Vec<Position> {
    let free: Vec<Position> = maze
        .positions()
        .filter(|position| !exclude.contains(position))
        .collect();
    free.choose_multiple(rng, count).copied().collect()
}
