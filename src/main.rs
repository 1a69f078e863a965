use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use rand::rngs::ThreadRng;
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Stylize},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame, Terminal,
};
use simplelog::{Config, LevelFilter, WriteLogger};
use snekrs::{
    Autopilot, Direction, GameMode, GameState, GameStatus, TickOutcome, DEFAULT_GRID_SIZE,
};
use std::fs::File;
use std::io;
use std::time::{Duration, Instant};

const LOG_FILE: &str = "snekrs.log";
const PLAY_TICK: Duration = Duration::from_millis(100);
const WATCH_TICK: Duration = Duration::from_millis(150);
const WATCH_RESTART_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Walls,
    Passthrough,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Walls => GameMode::Walls,
            ModeArg::Passthrough => GameMode::Passthrough,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "snekrs", about = "Grid snake in the terminal")]
struct Args {
    #[arg(long, value_enum, default_value_t = ModeArg::Walls)]
    mode: ModeArg,
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: u16,
    /// Let the autopilot play while you watch
    #[arg(long)]
    watch: bool,
    /// Milliseconds per tick (defaults to 100, or 150 when watching)
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

fn main() -> Result<(), io::Error> {
    let args = Args::parse();

    // Terminal belongs to the UI, so logs go to a file
    WriteLogger::init(args.log_level, Config::default(), File::create(LOG_FILE)?)
        .map_err(io::Error::other)?;

    info!("Starting Snekrs with {:?}", args);

    let mut rng = rand::thread_rng();
    let state = GameState::new(args.mode.into(), args.grid_size, &mut rng)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let tick_rate = match (args.tick_ms, args.watch) {
        (Some(ms), _) => Duration::from_millis(ms.max(1)),
        (None, true) => WATCH_TICK,
        (None, false) => PLAY_TICK,
    };
    let autopilot = args.watch.then(|| {
        let delay_ticks = WATCH_RESTART_DELAY.as_millis() / tick_rate.as_millis().max(1);
        Autopilot::new(u32::try_from(delay_ticks).unwrap_or(u32::MAX).max(1))
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App {
        state,
        rng,
        autopilot,
        high_score: 0,
        exit: false,
    };
    let result = app.run(&mut terminal, tick_rate);

    // Cleanup terminal even if the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("Game loop failed: {}", e);
    }
    info!("Exiting Snekrs, session high score {}", app.high_score);
    result
}

struct App {
    state: GameState,
    rng: ThreadRng,
    autopilot: Option<Autopilot>,
    high_score: u32,
    exit: bool,
}

impl App {
    fn run<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut last_tick = Instant::now();

        while !self.exit {
            terminal.draw(|f| self.render(f))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key);
                    }
                }
            }

            if last_tick.elapsed() >= tick_rate {
                self.update();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_input(&mut self, key: KeyEvent) {
        let turn = match key.code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
            _ => None,
        };

        match (turn, key.code) {
            (Some(direction), _) => {
                // Spectators watch, they don't steer
                if self.autopilot.is_none() {
                    self.state.change_direction(direction);
                }
            }
            (None, KeyCode::Char('q')) | (None, KeyCode::Esc) => self.exit = true,
            (None, KeyCode::Char(' ')) => self.state.toggle(),
            (None, KeyCode::Char('r')) => self.state.reset(&mut self.rng),
            (None, KeyCode::Char('m')) => {
                let mode = self.state.mode.other();
                self.state.restart_in_mode(mode, &mut self.rng);
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        let outcome = match self.autopilot.as_mut() {
            Some(pilot) => pilot.step(&mut self.state, &mut self.rng),
            None => self.state.tick(&mut self.rng),
        };

        if let TickOutcome::Collided(collision) = outcome {
            let final_score = self.state.score;
            info!(
                "Final score {} in {:?} mode ({:?})",
                final_score, self.state.mode, collision
            );
            if final_score > self.high_score {
                self.high_score = final_score;
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let status_text = match self.state.status {
            GameStatus::Idle => "Press SPACE to start",
            GameStatus::Playing => "Playing",
            GameStatus::Paused => "Paused. Press SPACE to continue",
            GameStatus::GameOver => "GAME OVER. Press R to play again",
        };
        let header = format!(
            "SNEK  {:?}  High Score: {}  Score: {}{}",
            self.state.mode,
            self.high_score,
            self.state.score,
            if self.autopilot.is_some() { "  [watching]" } else { "" }
        );

        let [header_area, game_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(frame.area());

        frame.render_widget(
            Paragraph::new(header)
                .alignment(Alignment::Left)
                .block(Block::default().borders(Borders::ALL)),
            header_area,
        );

        let block = Block::default().title(status_text).borders(Borders::ALL);
        let inner_area = block.inner(game_area);
        frame.render_widget(block, game_area);
        frame.render_widget(Board(&self.state), inner_area);
    }
}

struct Board<'a>(&'a GameState);

impl Widget for Board<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.0;
        // Cells outside the visible area are clipped
        let mut paint = |x: u16, y: u16, symbol: &str, color: Color| {
            if x < area.width && y < area.height {
                if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                    cell.set_symbol(symbol).set_fg(color);
                }
            }
        };

        for y in 0..state.grid_size {
            for x in 0..state.grid_size {
                paint(x, y, "·", Color::DarkGray);
            }
        }
        for pos in state.snake.iter().skip(1) {
            paint(pos.x, pos.y, "█", Color::Green);
        }
        let head = state.head();
        let head_color = if state.is_over() {
            Color::Red
        } else {
            Color::Yellow
        };
        paint(head.x, head.y, "@", head_color);
        paint(state.food.x, state.food.y, "♥", Color::LightRed);

        if state.is_over() {
            Paragraph::new(format!("GAME OVER\nFinal Score: {}", state.score))
                .alignment(Alignment::Center)
                .bold()
                .render(area, buf);
        }
    }
}
