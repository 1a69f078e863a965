//! Snake rules on a square grid.
//!
//! A [`GameState`] is owned by a single caller and advanced in place. Every
//! operation either applies completely or leaves the state as it was, so a
//! caller never observes a half-applied move. Operations that make no sense
//! for the current status are silent no-ops.

use log::{debug, info, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

pub const INITIAL_SNAKE_LENGTH: u16 = 3;
pub const DEFAULT_GRID_SIZE: u16 = 20;
/// Smallest grid that fits the starting snake without wrapping onto itself.
pub const MIN_GRID_SIZE: u16 = 4;
pub const FOOD_SCORE: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("grid size {grid_size} is too small, need at least {min}")]
    GridTooSmall { grid_size: u16, min: u16 },
    #[error("snake has {len} segments, need at least {min}")]
    SnakeTooShort { len: usize, min: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// True when `next` would turn the snake straight back onto `current`.
pub fn is_opposite_direction(current: Direction, next: Direction) -> bool {
    current.opposite() == next
}

/// What happens at the grid edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Leaving the grid ends the game.
    Walls,
    /// Leaving the grid re-enters from the opposite edge.
    Passthrough,
}

impl GameMode {
    pub fn other(&self) -> GameMode {
        match self {
            GameMode::Walls => GameMode::Passthrough,
            GameMode::Passthrough => GameMode::Walls,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Idle,
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Position { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PosDelta {
    x: i32,
    y: i32,
}

impl From<Direction> for PosDelta {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => PosDelta { x: 0, y: -1 },
            Direction::Down => PosDelta { x: 0, y: 1 },
            Direction::Left => PosDelta { x: -1, y: 0 },
            Direction::Right => PosDelta { x: 1, y: 0 },
        }
    }
}

/// The cell one step from `head` in `direction`.
///
/// Returns `None` when the step leaves the grid in [`GameMode::Walls`]. In
/// [`GameMode::Passthrough`] both axes wrap, so a cell is always returned.
pub fn next_position(
    head: Position,
    direction: Direction,
    grid_size: u16,
    mode: GameMode,
) -> Option<Position> {
    let delta = PosDelta::from(direction);
    let size = grid_size as i32;
    let x = head.x as i32 + delta.x;
    let y = head.y as i32 + delta.y;

    match mode {
        GameMode::Passthrough => Some(Position {
            x: x.rem_euclid(size) as u16,
            y: y.rem_euclid(size) as u16,
        }),
        GameMode::Walls => {
            if (0..size).contains(&x) && (0..size).contains(&y) {
                Some(Position {
                    x: x as u16,
                    y: y as u16,
                })
            } else {
                None
            }
        }
    }
}

/// True if `head` lands on any segment of `body` after the first.
///
/// `body` is expected to already start with `head`, so index 0 is skipped.
pub fn check_collision(head: Position, body: &VecDeque<Position>) -> bool {
    body.iter().skip(1).any(|segment| *segment == head)
}

/// Picks a uniformly random free cell for the next piece of food.
///
/// Rejection sampling: only terminates while at least one cell is free.
pub fn generate_food(snake: &VecDeque<Position>, grid_size: u16, rng: &mut impl Rng) -> Position {
    debug_assert!(
        snake.len() < usize::from(grid_size) * usize::from(grid_size),
        "no free cell left for food"
    );
    loop {
        let pos = Position {
            x: rng.gen_range(0..grid_size),
            y: rng.gen_range(0..grid_size),
        };

        if !snake.contains(&pos) {
            return pos;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    Body,
}

/// Result of a single [`GameState::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game was not playing; nothing changed.
    Idle,
    Moved,
    /// Food eaten, carrying the new total score.
    Ate { score: u32 },
    Collided(Collision),
}

/// Snapshot of one game. Serializes to the shape consumed by renderers and
/// spectators (`nextDirection`, `gridSize`, lowercase status and mode).
/// Incoming snapshots are checked the same way [`GameState::new`] checks its
/// arguments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGameState")]
pub struct GameState {
    /// Head first.
    pub snake: VecDeque<Position>,
    pub food: Position,
    /// Direction of the last committed move.
    pub direction: Direction,
    /// Buffered input applied on the next tick.
    pub next_direction: Direction,
    pub score: u32,
    pub status: GameStatus,
    pub mode: GameMode,
    pub grid_size: u16,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGameState {
    snake: VecDeque<Position>,
    food: Position,
    direction: Direction,
    next_direction: Direction,
    score: u32,
    status: GameStatus,
    mode: GameMode,
    grid_size: u16,
}

impl TryFrom<RawGameState> for GameState {
    type Error = EngineError;

    fn try_from(raw: RawGameState) -> Result<Self, Self::Error> {
        if raw.grid_size < MIN_GRID_SIZE {
            return Err(EngineError::GridTooSmall {
                grid_size: raw.grid_size,
                min: MIN_GRID_SIZE,
            });
        }
        let min_len = usize::from(INITIAL_SNAKE_LENGTH);
        if raw.snake.len() < min_len {
            return Err(EngineError::SnakeTooShort {
                len: raw.snake.len(),
                min: min_len,
            });
        }
        Ok(GameState {
            snake: raw.snake,
            food: raw.food,
            direction: raw.direction,
            next_direction: raw.next_direction,
            score: raw.score,
            status: raw.status,
            mode: raw.mode,
            grid_size: raw.grid_size,
        })
    }
}

impl GameState {
    /// Starts an idle game with a three-cell snake facing right from the
    /// centre of the grid.
    pub fn new(mode: GameMode, grid_size: u16, rng: &mut impl Rng) -> Result<Self, EngineError> {
        if grid_size < MIN_GRID_SIZE {
            return Err(EngineError::GridTooSmall {
                grid_size,
                min: MIN_GRID_SIZE,
            });
        }
        Ok(Self::fresh(mode, grid_size, rng))
    }

    pub fn with_default_grid(mode: GameMode, rng: &mut impl Rng) -> Self {
        Self::fresh(mode, DEFAULT_GRID_SIZE, rng)
    }

    // grid_size must already be validated
    fn fresh(mode: GameMode, grid_size: u16, rng: &mut impl Rng) -> Self {
        let mid = grid_size / 2;
        let snake: VecDeque<Position> = (0..INITIAL_SNAKE_LENGTH)
            .map(|i| Position { x: mid - i, y: mid })
            .collect();
        let food = generate_food(&snake, grid_size, rng);

        debug!(
            "New {:?} game on {}x{} grid, food at {:?}",
            mode, grid_size, grid_size, food
        );

        GameState {
            snake,
            food,
            direction: Direction::Right,
            next_direction: Direction::Right,
            score: 0,
            status: GameStatus::Idle,
            mode,
            grid_size,
        }
    }

    /// Panics if the snake is empty, which no state built here ever is.
    pub fn head(&self) -> Position {
        self.snake[0]
    }

    pub fn snake_len(&self) -> usize {
        self.snake.len()
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::GameOver
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.snake.contains(&pos)
    }

    /// Advances the snake one cell along the buffered direction.
    pub fn tick(&mut self, rng: &mut impl Rng) -> TickOutcome {
        if self.status != GameStatus::Playing {
            return TickOutcome::Idle;
        }

        let direction = self.next_direction;
        let Some(new_head) = next_position(self.head(), direction, self.grid_size, self.mode)
        else {
            return self.end(direction, Collision::Wall);
        };

        let ate_food = new_head == self.food;

        // Drop the tail first so the snake may move into the cell it vacates.
        let dropped_tail = if ate_food {
            None
        } else {
            self.snake.pop_back()
        };
        self.snake.push_front(new_head);

        if check_collision(new_head, &self.snake) {
            self.snake.pop_front();
            if let Some(tail) = dropped_tail {
                self.snake.push_back(tail);
            }
            return self.end(direction, Collision::Body);
        }

        self.direction = direction;

        if ate_food {
            self.score += FOOD_SCORE;
            self.food = generate_food(&self.snake, self.grid_size, rng);
            debug!(
                "Ate at {:?}, length {}, score {}, next food at {:?}",
                new_head,
                self.snake.len(),
                self.score,
                self.food
            );
            TickOutcome::Ate { score: self.score }
        } else {
            trace!("Moved {:?} to {:?}", direction, new_head);
            TickOutcome::Moved
        }
    }

    fn end(&mut self, direction: Direction, collision: Collision) -> TickOutcome {
        self.direction = direction;
        self.status = GameStatus::GameOver;
        info!(
            "Game over ({:?} collision) in {:?} mode, score {}",
            collision, self.mode, self.score
        );
        TickOutcome::Collided(collision)
    }

    /// Buffers a turn for the next tick. Ignored unless playing, and ignored
    /// when it would reverse the committed direction.
    pub fn change_direction(&mut self, requested: Direction) {
        if self.status != GameStatus::Playing {
            return;
        }
        if is_opposite_direction(self.direction, requested) {
            trace!("Rejected reversal from {:?} to {:?}", self.direction, requested);
            return;
        }
        self.next_direction = requested;
    }

    pub fn start(&mut self) {
        if self.status == GameStatus::Idle {
            info!("Game started in {:?} mode", self.mode);
            self.status = GameStatus::Playing;
        }
    }

    pub fn pause(&mut self) {
        if self.status == GameStatus::Playing {
            info!("Game paused at score {}", self.score);
            self.status = GameStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == GameStatus::Paused {
            info!("Game resumed");
            self.status = GameStatus::Playing;
        }
    }

    /// Throws the current game away and starts an idle one with the same
    /// mode and grid size. Valid from any status.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        info!("Game reset from {:?}, score was {}", self.status, self.score);
        *self = Self::fresh(self.mode, self.grid_size, rng);
    }

    /// A mode is fixed for a game, so switching it starts a new idle game on
    /// the same grid.
    pub fn restart_in_mode(&mut self, mode: GameMode, rng: &mut impl Rng) {
        info!("Switching to {:?} mode", mode);
        *self = Self::fresh(mode, self.grid_size, rng);
    }

    /// Single-key control: start when idle, pause when playing, resume when
    /// paused. Does nothing after game over.
    pub fn toggle(&mut self) {
        match self.status {
            GameStatus::Idle => self.start(),
            GameStatus::Playing => self.pause(),
            GameStatus::Paused => self.resume(),
            GameStatus::GameOver => {}
        }
    }
}
