pub mod grid;

use crate::config::{ArcadeConfig, flag_value};
use crate::games;
use crate::hints::{HintSource, MockHints};
use crate::term::{self, Canvas, Glyph, Rgb, TerminalGuard, TICK_MS};
use anyhow::Result;
use crossterm::event::KeyCode;
use grid::{Direction, Maze, Position, can_move, check_win_condition, generate_maze, solution_path};
use rand::Rng;
use std::collections::HashSet;
use std::time::{Duration, Instant};

const DEFAULT_ROWS: usize = 7;
const DEFAULT_COLS: usize = 11;
const DEFAULT_LEVELS: usize = 5;
const MAX_ROWS: usize = 25;
const MAX_COLS: usize = 35;
const MAX_LEVELS: usize = 20;
const LEVEL_GROWTH: usize = 2;
const LEVEL_POINTS: u32 = 100;
const MOVES_PER_POINT: u32 = 5;
const SECONDS_PER_POINT: u64 = 2;

pub struct MazeConfig
{
    rows: usize,
    cols: usize,
    levels: usize,
}

impl MazeConfig
{
    pub fn from_args(args: &[String]) -> Result<Self, String>
    {
        let mut config = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if let Some(value) = flag_value(arg, "--size", &mut iter)? {
                let (rows, cols) = parse_size(value)?;
                config.rows = rows;
                config.cols = cols;
            } else if let Some(value) = flag_value(arg, "--levels", &mut iter)? {
                config.levels = value
                    .parse::<usize>()
                    .map_err(|_| "Levels must be a number".to_string())?
                    .clamp(1, MAX_LEVELS);
            } else {
                return Err(format!("Unknown maze option '{arg}'"));
            }
        }
        Ok(config)
    }

    /// Grid size for a 1-based level.
    pub fn level_size(&self, level: usize) -> (usize, usize)
    {
        let growth = LEVEL_GROWTH * level.saturating_sub(1);
        (
            (self.rows + growth).min(MAX_ROWS),
            (self.cols + growth).min(MAX_COLS),
        )
    }

    fn obstacles_for(&self, level: usize) -> usize
    {
        let (rows, cols) = self.level_size(level);
        (rows * cols) / 25 + level
    }
}

impl Default for MazeConfig
{
    fn default() -> Self
    {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            levels: DEFAULT_LEVELS,
        }
    }
}

fn parse_size(value: &str) -> Result<(usize, usize), String>
{
    let (rows, cols) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "Size must look like 7x11".to_string())?;
    let rows = rows
        .trim()
        .parse::<usize>()
        .map_err(|_| "Size rows must be a number".to_string())?;
    let cols = cols
        .trim()
        .parse::<usize>()
        .map_err(|_| "Size columns must be a number".to_string())?;
    if rows == 0 || cols == 0 {
        return Err("Size must be at least 1x1".to_string());
    }
    Ok((rows.min(MAX_ROWS), cols.min(MAX_COLS)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome
{
    Blocked,
    Moved,
    Won,
}

/// One level: the generated maze and the player walking it.
pub struct MazeSession
{
    level: usize,
    maze: Maze,
    player: Position,
    moves: u32,
    bumps: u32,
}

impl MazeSession
{
    /// Generates the level and lays down obstacles suggested by `hints`,
    /// skipping any that would sit on the route to the exit.
    pub fn new<R: Rng + ?Sized>(
        level: usize,
        size: (usize, usize),
        obstacle_count: usize,
        rng: &mut R,
        hints: &mut dyn HintSource,
    ) -> Self
    {
        let mut maze = generate_maze(size.0, size.1, rng);
        let route: HashSet<Position> = solution_path(&maze).into_iter().collect();
        let mut placed = 0;
        for (pos, tag) in hints.obstacles(&maze, obstacle_count * 2) {
            if placed == obstacle_count {
                break;
            }
            if !route.contains(&pos) && maze.place_obstacle(pos, &tag) {
                placed += 1;
            }
        }
        debug_assert_eq!(maze.open_passages() + 1, maze.rows() * maze.cols());
        debug_assert_eq!(
            maze.reachable_from(grid::start_position()),
            maze.rows() * maze.cols()
        );
        log::info!(
            "level {level}: {}x{} maze with {} obstacles",
            maze.rows(),
            maze.cols(),
            maze.obstacle_count()
        );
        Self {
            level,
            maze,
            player: grid::start_position(),
            moves: 0,
            bumps: 0,
        }
    }

    pub fn level(&self) -> usize
    {
        self.level
    }

    pub fn maze(&self) -> &Maze
    {
        &self.maze
    }

    pub fn player(&self) -> Position
    {
        self.player
    }

    pub fn moves(&self) -> u32
    {
        self.moves
    }

    /// A one-cell maze starts on its own exit.
    pub fn is_won(&self) -> bool
    {
        check_win_condition(self.player, &self.maze)
    }

    pub fn try_move(&mut self, dir: Direction) -> MoveOutcome
    {
        if !can_move(&self.maze, self.player, dir) {
            self.bumps += 1;
            return MoveOutcome::Blocked;
        }
        if let Some(next) = self.maze.neighbor(self.player, dir) {
            self.player = next;
            self.moves += 1;
        }
        if self.is_won() {
            MoveOutcome::Won
        } else {
            MoveOutcome::Moved
        }
    }

    pub fn bumps(&self) -> u32
    {
        self.bumps
    }

    pub fn render(&self) -> Vec<String>
    {
        let rows = self.maze.rows();
        let cols = self.maze.cols();
        let mut canvas = Canvas::new(cols * 3 + 1, rows * 2 + 1);
        let wall = Some(Rgb::GREY);

        for r in 0..=rows {
            for c in 0..=cols {
                canvas.put(r * 2, c * 3, Glyph::new('+', wall));
            }
        }

        for cell in self.maze.cells() {
            let (y, x) = (cell.r * 2, cell.c * 3);
            if cell.walls.top {
                canvas.text(y, x + 1, "--", wall);
            }
            if cell.walls.left {
                canvas.put(y + 1, x, Glyph::new('|', wall));
            }
            if cell.c == cols - 1 && cell.walls.right {
                canvas.put(y + 1, x + 3, Glyph::new('|', wall));
            }
            if cell.r == rows - 1 && cell.walls.bottom {
                canvas.text(y + 2, x + 1, "--", wall);
            }

            let pos = Position::new(cell.r, cell.c);
            let (text, color) = if pos == self.player {
                ("@@", Rgb::CYAN)
            } else if cell.is_end {
                ("<>", Rgb::GOLD)
            } else if let Some(tag) = &cell.obstacle {
                obstacle_glyph(tag)
            } else {
                continue;
            };
            canvas.text(y + 1, x + 1, text, Some(color));
        }

        canvas.lines()
    }
}

fn obstacle_glyph(tag: &str) -> (&'static str, Rgb)
{
    match tag {
        "rock" => ("##", Rgb::GREY),
        "mud" => ("~~", Rgb::BROWN),
        "ice" => ("::", Rgb::CYAN),
        "bush" => ("**", Rgb::GREEN),
        _ => ("??", Rgb::RED),
    }
}

/// 100 points per cleared level, minus a point for every five moves and
/// every two seconds on the clock. Never negative.
pub fn maze_score(cleared: usize, moves: u32, elapsed: Duration) -> u32
{
    let earned = LEVEL_POINTS.saturating_mul(cleared as u32);
    let penalty = moves / MOVES_PER_POINT + (elapsed.as_secs() / SECONDS_PER_POINT) as u32;
    earned.saturating_sub(penalty)
}

fn key_direction(code: KeyCode) -> Option<Direction>
{
    match code {
        KeyCode::Up | KeyCode::Char('w') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => Some(Direction::Right),
        _ => None,
    }
}

fn is_hint_key(code: KeyCode) -> bool
{
    matches!(code, KeyCode::Char('h') | KeyCode::Char('?'))
}

pub fn run(arcade: &ArcadeConfig, config: MazeConfig) -> Result<()>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let mut hints = MockHints::new(rand::thread_rng());

    let start = Instant::now();
    let mut cleared = 0usize;
    let mut total_moves = 0u32;
    let mut quit = false;

    'levels: for level in 1..=config.levels {
        term.draw(&[format!("Loading level {level}...")])?;
        let mut session = MazeSession::new(
            level,
            config.level_size(level),
            config.obstacles_for(level),
            &mut rng,
            &mut hints,
        );
        if session.is_won() {
            cleared += 1;
            continue 'levels;
        }
        let mut message: Option<String> = None;
        let mut last_tick = Instant::now();
        term.draw(&[format!("Level {level} ready. Go!")])?;

        loop {
            for key in term::poll_keys()? {
                if term::is_quit(&key) {
                    quit = true;
                    break 'levels;
                }
                if is_hint_key(key.code) {
                    message = Some(hints.hint("maze"));
                    continue;
                }
                let Some(dir) = key_direction(key.code) else {
                    continue;
                };
                match session.try_move(dir) {
                    MoveOutcome::Won => {
                        cleared += 1;
                        total_moves += session.moves();
                        continue 'levels;
                    }
                    MoveOutcome::Blocked => message = Some("Bump!".to_string()),
                    MoveOutcome::Moved => {}
                }
            }

            if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
                let mut lines = vec![
                    "Arcade - Maze".to_string(),
                    format!(
                        "Level {}/{}  Moves: {}  Bumps: {}  Score: {}  Time: {:>5.1}s",
                        session.level(),
                        config.levels,
                        session.moves(),
                        session.bumps(),
                        maze_score(cleared, total_moves + session.moves(), start.elapsed()),
                        start.elapsed().as_secs_f32()
                    ),
                ];
                lines.extend(session.render());
                lines.push(message.clone().unwrap_or_default());
                lines.push("Controls: arrows/WASD move, H for a hint, ESC to quit".to_string());
                term.draw(&lines)?;
                last_tick = Instant::now();
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    let elapsed = start.elapsed();
    let total_score = maze_score(cleared, total_moves, elapsed);
    let details = vec![
        format!("Levels cleared: {cleared}/{}", config.levels),
        format!("Moves: {total_moves}"),
        format!("Time: {:>5.1}s", elapsed.as_secs_f32()),
        if quit { "Quit early.".to_string() } else { "All levels cleared!".to_string() },
    ];
    let score = (cleared > 0).then_some(total_score);
    games::conclude(&mut term, arcade, "maze", score, details)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::hints::OBSTACLE_TAGS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn session(seed: u64, size: (usize, usize), obstacles: usize) -> MazeSession
    {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hints = MockHints::new(StdRng::seed_from_u64(seed + 1));
        MazeSession::new(1, size, obstacles, &mut rng, &mut hints)
    }

    fn step_toward(from: Position, to: Position) -> Direction
    {
        if to.r < from.r {
            Direction::Up
        } else if to.r > from.r {
            Direction::Down
        } else if to.c < from.c {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    #[test]
    fn following_the_route_wins_even_with_obstacles()
    {
        let mut session = session(3, (9, 9), 8);
        assert!(session.maze().obstacle_count() > 0);
        let path = solution_path(session.maze());
        let mut outcome = MoveOutcome::Moved;
        for pair in path.windows(2) {
            outcome = session.try_move(step_toward(pair[0], pair[1]));
            assert_ne!(outcome, MoveOutcome::Blocked);
        }
        assert_eq!(outcome, MoveOutcome::Won);
        assert_eq!(session.moves() as usize, path.len() - 1);
    }

    #[test]
    fn blocked_moves_leave_the_player_in_place()
    {
        let mut session = session(5, (4, 4), 0);
        assert_eq!(session.try_move(Direction::Up), MoveOutcome::Blocked);
        assert_eq!(session.player(), grid::start_position());
        assert_eq!(session.moves(), 0);
        assert_eq!(session.bumps(), 1);
    }

    #[test]
    fn obstacles_use_known_tags_and_skip_start_and_end()
    {
        let session = session(9, (11, 11), 10);
        for cell in session.maze().cells() {
            if let Some(tag) = &cell.obstacle {
                assert!(OBSTACLE_TAGS.contains(&tag.as_str()));
                assert!(!cell.is_start && !cell.is_end);
            }
        }
    }

    #[test]
    fn levels_grow_and_cap()
    {
        let config = MazeConfig::default();
        assert_eq!(config.level_size(1), (7, 11));
        assert_eq!(config.level_size(3), (11, 15));
        assert_eq!(config.level_size(50), (MAX_ROWS, MAX_COLS));
    }

    #[test]
    fn options_parse()
    {
        let args = vec!["--size=5x9".to_string(), "--levels".to_string(), "2".to_string()];
        let config = MazeConfig::from_args(&args).unwrap();
        assert_eq!((config.rows, config.cols, config.levels), (5, 9, 2));
        assert!(MazeConfig::from_args(&["--size=0x3".to_string()]).is_err());
        assert!(MazeConfig::from_args(&["--fast".to_string()]).is_err());
    }

    #[test]
    fn render_draws_player_exit_and_frame()
    {
        let session = session(1, (2, 3), 0);
        let lines = session.render();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("@@"));
        assert!(lines[3].contains("<>"));
        assert!(lines[0].contains("--"));
    }

    #[test]
    fn single_cell_level_is_won_on_arrival()
    {
        let config = MazeConfig::from_args(&["--size=1x1".to_string(), "--levels=1".to_string()])
            .unwrap();
        let mut session = session(4, config.level_size(1), config.obstacles_for(1));
        assert!(session.is_won());
        for dir in Direction::ALL {
            assert_eq!(session.try_move(dir), MoveOutcome::Blocked);
        }
        assert!(session.is_won());
    }

    #[test]
    fn score_is_level_points_minus_moves_and_time()
    {
        assert_eq!(maze_score(0, 0, Duration::ZERO), 0);
        assert_eq!(maze_score(3, 0, Duration::ZERO), 300);
        assert_eq!(maze_score(3, 50, Duration::from_secs(41)), 300 - 10 - 20);
        assert_eq!(maze_score(2, 24, Duration::from_millis(1999)), 200 - 4);
        assert!(maze_score(2, 60, Duration::ZERO) > maze_score(2, 90, Duration::ZERO));
        assert_eq!(maze_score(1, 1000, Duration::from_secs(600)), 0);
    }

    #[test]
    fn keys_move_with_arrows_and_wasd_and_h_asks_for_a_hint()
    {
        assert_eq!(key_direction(KeyCode::Up), Some(Direction::Up));
        assert_eq!(key_direction(KeyCode::Char('s')), Some(Direction::Down));
        assert_eq!(key_direction(KeyCode::Char('a')), Some(Direction::Left));
        assert_eq!(key_direction(KeyCode::Right), Some(Direction::Right));
        assert_eq!(key_direction(KeyCode::Char('h')), None);
        assert!(is_hint_key(KeyCode::Char('h')));
        assert!(is_hint_key(KeyCode::Char('?')));
        assert!(!is_hint_key(KeyCode::Char('w')));
    }
}
