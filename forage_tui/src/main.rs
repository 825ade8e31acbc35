use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use forage_core::{
    Position,
    agent::{Agent, ManhattanAgent, RandomWalker},
    environment::{
        Game, GameConfig, TurnOutcome, TurnReport, load_game_from_string, scatter_cheese,
    },
    map::Maze,
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    DefaultTerminal,
    crossterm::event::{self, Event, KeyCode, KeyEventKind},
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io,
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load, a random maze is generated when omitted
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Width of a random maze
    #[arg(long, default_value_t = 15)]
    width: usize,

    /// Height of a random maze
    #[arg(long, default_value_t = 11)]
    height: usize,

    /// Pieces of cheese scattered on a random maze
    #[arg(short, long, default_value_t = 21)]
    cheese: usize,

    /// Seed for cheese placement and random agents
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Agents playing on a random maze, one player each
    #[arg(short, long, value_enum, num_args = 1.., default_values_t = [AgentKind::Manhattan, AgentKind::Random])]
    agents: Vec<AgentKind>,

    /// Agent controlling the players declared in a map file
    #[arg(long, value_enum, default_value_t = AgentKind::Manhattan)]
    map_agent: AgentKind,

    /// Turn limit
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,

    /// Delay between turns in the terminal UI
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,

    /// Play the whole match without a UI and print the final scores
    #[arg(long)]
    headless: bool,

    /// Write logs to this file
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    /// Heads for the nearest cheese
    Manhattan,
    /// Wanders randomly
    Random,
}

fn make_agent(kind: AgentKind, name: String, seed: u64) -> Box<dyn Agent> {
    match kind {
        AgentKind::Manhattan => Box::new(ManhattanAgent::new(name)),
        AgentKind::Random => Box::new(RandomWalker::new(name, seed)),
    }
}

/// Seed of the `index`-th agent, derived from the base seed.
fn agent_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

/// Builds the game from a map file, or a random maze when none is given.
fn build_game(args: &Args) -> Result<Game> {
    let config = GameConfig {
        max_turns: args.max_turns,
        ..GameConfig::default()
    };

    if let Some(map_file) = &args.map {
        let file_string = std::fs::read_to_string(map_file)
            .with_context(|| format!("Failed to read map file {}", map_file.display()))?;
        let (mut game, starts) = load_game_from_string(&file_string, config)?;
        if starts.is_empty() {
            return Err(anyhow!("Map file declares no players"));
        }
        for (i, (name, start)) in starts.into_iter().enumerate() {
            let agent = make_agent(args.map_agent, name, agent_seed(args.seed, i));
            game.add_player(start, agent)?;
        }
        return Ok(game);
    }

    let maze = Maze::new(args.width, args.height)?;
    let corners = [
        Position::new(0, 0),
        Position::new(maze.width() - 1, maze.height() - 1),
        Position::new(0, maze.height() - 1),
        Position::new(maze.width() - 1, 0),
    ];
    let mut game = Game::new(maze, config);
    for (i, kind) in args.agents.iter().enumerate() {
        let name = format!("{:?}{}", kind, i + 1).to_lowercase();
        let agent = make_agent(*kind, name, agent_seed(args.seed, i));
        game.add_player(corners[i % corners.len()], agent)?;
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    for position in scatter_cheese(&maze, args.cheese, &corners, &mut rng) {
        game.add_cheese(position)?;
    }
    Ok(game)
}

struct App {
    /// The game being played.
    game: Game,
    /// Report of the latest turn.
    last_report: Option<TurnReport>,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Flag to control if the game is over.
    game_over: bool,
    /// Turns only advance on request while paused.
    paused: bool,
}

impl App {
    fn new(game: Game) -> Self {
        let game_over = game.is_over();
        App {
            game,
            last_report: None,
            should_quit: false,
            game_over,
            paused: false,
        }
    }

    /// Advances the game by one turn unless paused.
    fn tick(&mut self) {
        if !self.paused {
            self.step();
        }
    }

    /// Plays exactly one turn.
    fn step(&mut self) {
        if self.game_over {
            return;
        }
        let report = self.game.process_turn();
        if report.outcome == TurnOutcome::GameOver {
            self.game_over = true;
            info!(turn = report.turn, "match finished");
        }
        self.last_report = Some(report);
    }

    /// Reacts to a key press: `q`/`Esc` quit, `p`/space pause, `n` steps while paused.
    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('p') | KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('n') if self.paused => self.step(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args)?;

    let mut game = build_game(&args)?;

    if args.headless {
        let turns = game.run_to_completion();
        info!(turns, cheese_left = game.cheese().len(), "match finished");
        println!("Match over after {} turns", turns);
        for (name, score) in game.standings() {
            println!("{:>16}: {:.3}", name, score);
        }
        return Ok(());
    }

    let mut app = App::new(game);
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));
    ratatui::restore();
    result
}

/// Installs a log subscriber. Without a log file, only headless runs log (to stderr).
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("forage_core=info,forage_tui=info"));

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|err| anyhow!(err))?;
    } else if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|err| anyhow!(err))?;
    }
    Ok(())
}

/// Draws and advances the game until the user quits.
fn run_app(terminal: &mut DefaultTerminal, app: &mut App, tick_rate: Duration) -> Result<()> {
    let mut last_tick = Instant::now();

    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }
    }
    Ok(())
}

const PLAYER_COLORS: [Color; 5] = [
    Color::Red,
    Color::Blue,
    Color::Green,
    Color::Magenta,
    Color::Cyan,
];

/// Player names in a stable order, used to pick colors.
fn sorted_players(game: &Game) -> Vec<&str> {
    let mut names: Vec<&str> = game.player_locations().keys().map(String::as_str).collect();
    names.sort();
    names
}

fn player_color(index: usize) -> Color {
    PLAYER_COLORS[index % PLAYER_COLORS.len()]
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(65), // Area for the maze
            Constraint::Percentage(25), // Area for the scoreboard
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    render_maze(frame, main_layout[0], &app.game);
    render_scoreboard(frame, main_layout[1], &app.game);

    let mut status = format!(
        "Turn {}/{} | Cheese left: {}",
        app.game.turn(),
        app.game.config().max_turns,
        app.game.cheese().len()
    );
    if let Some(report) = &app.last_report {
        if !report.failures.is_empty() {
            status.push_str(&format!(" | Rejected actions: {}", report.failures.len()));
        }
    }
    if app.game_over {
        status.push_str(" | GAME OVER");
    } else if app.paused {
        status.push_str(" | PAUSED ('n' to step)");
    }
    status.push_str(" | 'p' pause, 'q' quit");

    let help_text = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the scores and positions of each player.
fn render_scoreboard(frame: &mut Frame, area: Rect, game: &Game) {
    let players = sorted_players(game);
    let items: Vec<ListItem> = game
        .standings()
        .into_iter()
        .map(|(name, score)| {
            let color_index = players.iter().position(|p| *p == name).unwrap_or(0);
            let position = game.player_locations().get(name).copied();
            let location = position
                .map(|p| format!("({}, {})", p.x, p.y))
                .unwrap_or_default();
            ListItem::from(Line::from(vec![
                Span::styled(
                    format!("{:<16}", name),
                    Style::default().fg(player_color(color_index)).bold(),
                ),
                Span::raw(format!("Score: {:>7.3}  Pos: {}", score, location)),
            ]))
        })
        .collect();

    let scoreboard =
        List::new(items).block(Block::default().borders(Borders::ALL).title("Scores"));
    frame.render_widget(scoreboard, area);
}

/// Renders the maze, top row first.
fn render_maze(frame: &mut Frame, area: Rect, game: &Game) {
    let maze = game.maze();
    let players = sorted_players(game);
    let locations = game.player_locations();
    let cheese = game.cheese();

    let mut lines: Vec<Line> = Vec::with_capacity(maze.height());
    for row in 0..maze.height() {
        let y = maze.height() - row - 1;
        let mut spans: Vec<Span> = Vec::with_capacity(maze.width());
        for x in 0..maze.width() {
            let here = Position { x, y };
            let occupants: Vec<usize> = players
                .iter()
                .enumerate()
                .filter(|(_, name)| locations.get(**name) == Some(&here))
                .map(|(i, _)| i)
                .collect();

            let span = match occupants.as_slice() {
                [] if cheese.contains(&here) => {
                    Span::styled("c ", Style::default().fg(Color::Yellow))
                }
                [] => Span::styled(". ", Style::default().fg(Color::DarkGray)),
                [only] => {
                    let initial = players[*only]
                        .chars()
                        .next()
                        .map(|c| c.to_ascii_uppercase())
                        .unwrap_or('@');
                    Span::styled(
                        format!("{initial} "),
                        Style::default().fg(player_color(*only)).bold(),
                    )
                }
                _ => Span::styled("* ", Style::default().fg(Color::White).bold()),
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Cheese Maze").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(maze_paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(["forage_tui", "--headless"].iter().chain(extra))
    }

    #[test]
    fn agent_seeds_wrap_at_the_top_of_the_range() {
        assert_eq!(agent_seed(7, 2), 9);
        assert_eq!(agent_seed(u64::MAX, 0), u64::MAX);
        assert_eq!(agent_seed(u64::MAX, 1), 0);
    }

    #[test]
    fn random_match_with_largest_seed() {
        let args = args(&["--seed", "18446744073709551615", "--agents", "random", "random"]);

        let mut game = build_game(&args).unwrap();

        assert_eq!(game.player_locations().len(), 2);
        assert_eq!(game.cheese().len(), 21);
        assert!(game.run_to_completion() <= 1000);
    }

    #[test]
    fn pause_holds_turns_until_stepped() {
        let mut app = App::new(build_game(&args(&["--agents", "manhattan"])).unwrap());

        app.on_key(KeyCode::Char('p'));
        app.tick();
        assert_eq!(app.game.turn(), 0);

        app.on_key(KeyCode::Char('n'));
        assert_eq!(app.game.turn(), 1);
        assert!(app.last_report.is_some());

        app.on_key(KeyCode::Char(' '));
        app.tick();
        assert_eq!(app.game.turn(), 2);

        app.on_key(KeyCode::Esc);
        assert!(app.should_quit);
    }
}
