//! Grid snake simulation.
//!
//! [`engine`] holds every game rule: construction, food placement, movement,
//! collisions and the idle/playing/paused/game-over lifecycle. It performs no
//! I/O and never schedules itself; a driver owns a [`GameState`] and calls
//! into it. [`autopilot`] is one such driver, used for spectated games.

pub mod autopilot;
pub mod engine;

pub use autopilot::Autopilot;
pub use engine::{
    check_collision, generate_food, is_opposite_direction, next_position, Collision, Direction,
    EngineError, GameMode, GameState, GameStatus, Position, TickOutcome, DEFAULT_GRID_SIZE,
    FOOD_SCORE, INITIAL_SNAKE_LENGTH, MIN_GRID_SIZE,
};
