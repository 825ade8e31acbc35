use serde::{Deserialize, Serialize};

use crate::{
    Position,
    map::{MapError, Maze},
};

/// Represents errors raised when translating action labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Unknown action '{label}', expected one of {expected:?}")]
    UnknownAction { label: String, expected: Vec<String> },
    #[error("Action label '{label}' is used more than once")]
    DuplicateLabel { label: String },
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Represents the moves an agent can take in a single turn.
///
/// The discriminants are stable ordinals used to index an [`ActionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Nothing = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Left = 4,
}

impl Action {
    /// Every action in ordinal order.
    pub const ALL: [Action; 5] = [
        Action::Nothing,
        Action::Up,
        Action::Right,
        Action::Down,
        Action::Left,
    ];

    /// The four actions that actually move an agent.
    pub const MOVES: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    #[inline]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Action> {
        Self::ALL.get(ordinal).copied()
    }

    /// Chooses the single step that brings `location` closer to `target`.
    ///
    /// Vertical offsets are resolved before horizontal ones, so an agent
    /// diagonally offset from its target always moves up or down first.
    pub fn toward(location: Position, target: Position) -> Action {
        if target.y > location.y {
            Action::Up
        } else if target.y < location.y {
            Action::Down
        } else if target.x > location.x {
            Action::Right
        } else if target.x < location.x {
            Action::Left
        } else {
            Action::Nothing
        }
    }

    /// Applies this action to `location`, clamping to the maze boundary.
    ///
    /// A move that would leave the maze leaves that axis unchanged.
    /// `location` must lie inside `maze`; [`play_action`] checks this.
    pub fn apply(self, location: Position, maze: &Maze) -> Position {
        let Position { mut x, mut y } = location;
        match self {
            Action::Nothing => {}
            Action::Up => y = (y + 1).min(maze.height() - 1),
            Action::Down => y = y.saturating_sub(1),
            Action::Right => x = (x + 1).min(maze.width() - 1),
            Action::Left => x = x.saturating_sub(1),
        }
        Position { x, y }
    }
}

/// The external label vocabulary for the five actions, stored in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 5]", into = "[String; 5]")]
pub struct ActionSet {
    labels: [String; 5],
}

impl Default for ActionSet {
    fn default() -> Self {
        Self {
            labels: ["nothing", "up", "right", "down", "left"].map(String::from),
        }
    }
}

impl TryFrom<[String; 5]> for ActionSet {
    type Error = ActionError;

    fn try_from(labels: [String; 5]) -> Result<Self, Self::Error> {
        ActionSet::new(labels)
    }
}

impl From<ActionSet> for [String; 5] {
    fn from(actions: ActionSet) -> Self {
        actions.labels
    }
}

impl ActionSet {
    /// Creates an action set from five labels listed in ordinal order
    /// (nothing, up, right, down, left).
    pub fn new<S: Into<String>>(labels: [S; 5]) -> Result<Self, ActionError> {
        let labels = labels.map(Into::into);
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ActionError::DuplicateLabel {
                    label: label.clone(),
                });
            }
        }
        Ok(Self { labels })
    }

    /// Compass vocabulary: `nothing`, `north`, `east`, `south`, `west`.
    pub fn compass() -> Self {
        Self {
            labels: ["nothing", "north", "east", "south", "west"].map(String::from),
        }
    }

    /// Returns the label used for `action`.
    #[inline]
    pub fn label(&self, action: Action) -> &str {
        &self.labels[action.ordinal()]
    }

    /// Looks up the action for an external label.
    pub fn action(&self, label: &str) -> Result<Action, ActionError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(Action::from_ordinal)
            .ok_or_else(|| ActionError::UnknownAction {
                label: label.to_string(),
                expected: self.labels.to_vec(),
            })
    }

    /// Returns all labels in ordinal order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Returns the label of the action an agent at `location` must take to reach `target`.
pub fn move_to_target<'a>(
    location: Position,
    target: Position,
    actions: &'a ActionSet,
) -> &'a str {
    actions.label(Action::toward(location, target))
}

/// Updates `location` with the action named by `label`.
///
/// Returns `Err(ActionError::UnknownAction)` if `label` is not part of `actions`,
/// or `Err(ActionError::Map)` if `location` is outside the maze.
pub fn play_action(
    location: Position,
    label: &str,
    actions: &ActionSet,
    maze: &Maze,
) -> Result<Position, ActionError> {
    maze.check_contains(location)?;
    let action = actions.action(label)?;
    Ok(action.apply(location, maze))
}
