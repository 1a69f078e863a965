//! Simulated player for spectated games.
//!
//! Stands in for a human at the keyboard: it only talks to the engine through
//! [`GameState::change_direction`], [`GameState::tick`] and the lifecycle
//! calls, the same surface a real player's driver uses.

use crate::engine::{Direction, GameState, GameStatus, TickOutcome};
use log::{debug, info};
use rand::Rng;

/// A random turn is requested on every this-many ticks.
pub const DIRECTION_CHANGE_INTERVAL: u32 = 3;

#[derive(Debug)]
pub struct Autopilot {
    ticks: u32,
    restart_delay: u32,
    waited: u32,
    games_played: u32,
}

impl Autopilot {
    /// `restart_delay` is how many steps a finished game stays on screen
    /// before a new one starts.
    pub fn new(restart_delay: u32) -> Self {
        Autopilot {
            ticks: 0,
            restart_delay,
            waited: 0,
            games_played: 0,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.games_played
    }

    /// One scheduler step. Idle games are started, finished games are
    /// restarted after the delay, paused games are left alone.
    pub fn step(&mut self, state: &mut GameState, rng: &mut impl Rng) -> TickOutcome {
        match state.status {
            GameStatus::Idle => {
                // The game may have been reset from outside mid-countdown
                self.waited = 0;
                self.ticks = 0;
                state.start();
                self.games_played += 1;
                TickOutcome::Idle
            }
            GameStatus::Paused => TickOutcome::Idle,
            GameStatus::GameOver => {
                self.waited += 1;
                if self.waited >= self.restart_delay {
                    info!("Autopilot restarting after score {}", state.score);
                    self.waited = 0;
                    self.ticks = 0;
                    state.reset(rng);
                    state.start();
                    self.games_played += 1;
                }
                TickOutcome::Idle
            }
            GameStatus::Playing => {
                self.ticks += 1;
                if self.ticks % DIRECTION_CHANGE_INTERVAL == 0 {
                    let turn = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
                    debug!("Autopilot turning {:?}", turn);
                    state.change_direction(turn);
                }
                state.tick(rng)
            }
        }
    }
}
