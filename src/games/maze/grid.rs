//! Perfect maze generation and movement rules.
//!
//! Mazes are carved with a randomized depth-first search that keeps an
//! explicit backtracking stack, so the open walls always form a spanning
//! tree: one path between any two cells, no loops, no unreachable pockets.

use rand::Rng;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction
{
    Up,
    Down,
    Left,
    Right,
}

impl Direction
{
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self
    {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn delta(self) -> (isize, isize)
    {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position
{
    pub r: usize,
    pub c: usize,
}

impl Position
{
    pub fn new(r: usize, c: usize) -> Self
    {
        Self { r, c }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Walls
{
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Walls
{
    fn closed() -> Self
    {
        Self {
            top: true,
            right: true,
            bottom: true,
            left: true,
        }
    }

    pub fn has(&self, dir: Direction) -> bool
    {
        match dir {
            Direction::Up => self.top,
            Direction::Down => self.bottom,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    fn open(&mut self, dir: Direction)
    {
        match dir {
            Direction::Up => self.top = false,
            Direction::Down => self.bottom = false,
            Direction::Left => self.left = false,
            Direction::Right => self.right = false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell
{
    pub r: usize,
    pub c: usize,
    pub walls: Walls,
    pub visited: bool,
    pub is_start: bool,
    pub is_end: bool,
    /// Opaque tag laid down after generation. Blocks entry into the cell.
    pub obstacle: Option<String>,
}

impl Cell
{
    fn new(r: usize, c: usize) -> Self
    {
        Self {
            r,
            c,
            walls: Walls::closed(),
            visited: false,
            is_start: false,
            is_end: false,
            obstacle: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze
{
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Cell>>,
}

impl Maze
{
    fn closed(rows: usize, cols: usize) -> Self
    {
        let cells = (0..rows)
            .map(|r| (0..cols).map(|c| Cell::new(r, c)).collect())
            .collect();
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize
    {
        self.rows
    }

    pub fn cols(&self) -> usize
    {
        self.cols
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell>
    {
        self.cells.get(pos.r).and_then(|row| row.get(pos.c))
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell>
    {
        self.cells.get_mut(pos.r).and_then(|row| row.get_mut(pos.c))
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell>
    {
        self.cells.iter().flatten()
    }

    /// The in-bounds cell one step away from `pos`, ignoring walls.
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position>
    {
        let (dr, dc) = dir.delta();
        let r = pos.r.checked_add_signed(dr)?;
        let c = pos.c.checked_add_signed(dc)?;
        if r < self.rows && c < self.cols {
            Some(Position { r, c })
        } else {
            None
        }
    }

    /// Tags a cell as blocked. Start, end and out-of-bounds cells are refused.
    pub fn place_obstacle(&mut self, pos: Position, tag: &str) -> bool
    {
        match self.cell_mut(pos) {
            Some(cell) if !cell.is_start && !cell.is_end => {
                cell.obstacle = Some(tag.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn obstacle_count(&self) -> usize
    {
        self.cells().filter(|cell| cell.obstacle.is_some()).count()
    }

    /// Number of open adjacencies, each shared wall counted once.
    pub fn open_passages(&self) -> usize
    {
        self.cells()
            .map(|cell| usize::from(!cell.walls.right) + usize::from(!cell.walls.bottom))
            .sum()
    }

    /// Cells reachable from `from` through open walls. Obstacles are ignored.
    pub fn reachable_from(&self, from: Position) -> usize
    {
        if self.cell(from).is_none() {
            return 0;
        }
        let mut seen = vec![vec![false; self.cols]; self.rows];
        let mut stack = vec![from];
        seen[from.r][from.c] = true;
        let mut count = 0;
        while let Some(pos) = stack.pop() {
            count += 1;
            for next in self.open_neighbors(pos) {
                if !seen[next.r][next.c] {
                    seen[next.r][next.c] = true;
                    stack.push(next);
                }
            }
        }
        count
    }

    fn open_neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_
    {
        let walls = self.cell(pos).map(|cell| cell.walls);
        Direction::ALL.into_iter().filter_map(move |dir| match walls {
            Some(walls) if !walls.has(dir) => self.neighbor(pos, dir),
            _ => None,
        })
    }

    fn unvisited_neighbors(&self, pos: Position) -> Vec<(Direction, Position)>
    {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbor(pos, dir).map(|next| (dir, next)))
            .filter(|(_, next)| !self.cells[next.r][next.c].visited)
            .collect()
    }

    fn knock_down(&mut self, from: Position, dir: Direction, to: Position)
    {
        self.cells[from.r][from.c].walls.open(dir);
        self.cells[to.r][to.c].walls.open(dir.opposite());
    }
}

/// Carves a perfect maze. Zero dimensions are treated as 1.
pub fn generate_maze<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Maze
{
    let rows = rows.max(1);
    let cols = cols.max(1);
    let mut maze = Maze::closed(rows, cols);

    let start = start_position();
    maze.cells[start.r][start.c].visited = true;
    maze.cells[start.r][start.c].is_start = true;

    let mut stack = Vec::with_capacity(rows * cols);
    stack.push(start);

    while let Some(&current) = stack.last() {
        let candidates = maze.unvisited_neighbors(current);
        if candidates.is_empty() {
            stack.pop();
            continue;
        }
        let (dir, next) = candidates[rng.gen_range(0..candidates.len())];
        maze.knock_down(current, dir, next);
        maze.cells[next.r][next.c].visited = true;
        stack.push(next);
    }

    maze.cells[rows - 1][cols - 1].is_end = true;
    for cell in maze.cells.iter_mut().flatten() {
        cell.visited = false;
    }
    log::debug!("generated {rows}x{cols} maze");
    maze
}

pub fn start_position() -> Position
{
    Position { r: 0, c: 0 }
}

pub fn check_win_condition(pos: Position, maze: &Maze) -> bool
{
    maze.cell(pos).is_some_and(|cell| cell.is_end)
}

pub fn can_move(maze: &Maze, pos: Position, dir: Direction) -> bool
{
    let Some(cell) = maze.cell(pos) else {
        return false;
    };
    if cell.walls.has(dir) {
        return false;
    }
    maze.neighbor(pos, dir)
        .and_then(|next| maze.cell(next))
        .is_some_and(|next| next.obstacle.is_none())
}

/// Start-to-end route through open walls, ignoring obstacles.
pub fn solution_path(maze: &Maze) -> Vec<Position>
{
    let start = start_position();
    let end = Position::new(maze.rows() - 1, maze.cols() - 1);
    let mut came_from: Vec<Vec<Option<Position>>> = vec![vec![None; maze.cols()]; maze.rows()];
    let mut queue = VecDeque::from([start]);
    came_from[start.r][start.c] = Some(start);

    while let Some(pos) = queue.pop_front() {
        if pos == end {
            break;
        }
        for next in maze.open_neighbors(pos) {
            if came_from[next.r][next.c].is_none() {
                came_from[next.r][next.c] = Some(pos);
                queue.push_back(next);
            }
        }
    }

    if came_from[end.r][end.c].is_none() {
        return Vec::new();
    }
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        current = came_from[current.r][current.c].unwrap_or(start);
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seeded(rows: usize, cols: usize, seed: u64) -> Maze
    {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_maze(rows, cols, &mut rng)
    }

    #[test]
    fn every_cell_is_reachable_and_the_maze_is_a_tree()
    {
        for (rows, cols) in [(1, 1), (1, 7), (6, 1), (3, 3), (9, 13), (25, 25)] {
            for seed in 0..5 {
                let maze = seeded(rows, cols, seed);
                assert_eq!(maze.reachable_from(start_position()), rows * cols);
                assert_eq!(maze.open_passages(), rows * cols - 1);
            }
        }
    }

    #[test]
    fn walls_are_symmetric()
    {
        let maze = seeded(11, 17, 42);
        for cell in maze.cells() {
            let pos = Position::new(cell.r, cell.c);
            for dir in Direction::ALL {
                if let Some(next) = maze.neighbor(pos, dir) {
                    let other = maze.cell(next).unwrap();
                    assert_eq!(cell.walls.has(dir), other.walls.has(dir.opposite()));
                }
            }
        }
    }

    #[test]
    fn outer_boundary_stays_closed()
    {
        let maze = seeded(5, 8, 3);
        for cell in maze.cells() {
            if cell.r == 0 {
                assert!(cell.walls.top);
            }
            if cell.r == 4 {
                assert!(cell.walls.bottom);
            }
            if cell.c == 0 {
                assert!(cell.walls.left);
            }
            if cell.c == 7 {
                assert!(cell.walls.right);
            }
        }
    }

    #[test]
    fn single_cell_is_start_and_end()
    {
        let maze = seeded(1, 1, 0);
        let cell = maze.cell(start_position()).unwrap();
        assert!(cell.is_start && cell.is_end);
        assert_eq!(cell.walls, Walls::closed());
        assert!(check_win_condition(start_position(), &maze));
    }

    #[test]
    fn zero_dimensions_clamp_to_one()
    {
        let maze = seeded(0, 0, 0);
        assert_eq!((maze.rows(), maze.cols()), (1, 1));
    }

    #[test]
    fn one_start_one_end_and_no_visited_flags_leak()
    {
        let maze = seeded(7, 9, 11);
        assert_eq!(maze.cells().filter(|cell| cell.is_start).count(), 1);
        assert_eq!(maze.cells().filter(|cell| cell.is_end).count(), 1);
        assert!(maze.cell(Position::new(0, 0)).unwrap().is_start);
        assert!(maze.cell(Position::new(6, 8)).unwrap().is_end);
        assert!(maze.cells().all(|cell| !cell.visited));
    }

    #[test]
    fn same_seed_same_maze()
    {
        assert_eq!(seeded(9, 9, 7), seeded(9, 9, 7));
    }

    #[test]
    fn three_by_three_has_eight_passages()
    {
        let maze = seeded(3, 3, 99);
        assert_eq!(maze.open_passages(), 8);
        assert_eq!(maze.reachable_from(start_position()), 9);
    }

    #[test]
    fn win_only_on_the_end_cell()
    {
        let maze = seeded(4, 6, 5);
        for cell in maze.cells() {
            let pos = Position::new(cell.r, cell.c);
            assert_eq!(check_win_condition(pos, &maze), cell.r == 3 && cell.c == 5);
        }
        assert!(!check_win_condition(Position::new(4, 0), &maze));
        assert!(!check_win_condition(Position::new(0, 60), &maze));
    }

    #[test]
    fn start_position_is_origin()
    {
        assert_eq!(start_position(), Position::new(0, 0));
    }

    #[test]
    fn cannot_leave_the_grid()
    {
        let maze = seeded(5, 5, 1);
        assert!(!can_move(&maze, start_position(), Direction::Up));
        assert!(!can_move(&maze, start_position(), Direction::Left));
        assert!(!can_move(&maze, Position::new(4, 4), Direction::Down));
        assert!(!can_move(&maze, Position::new(4, 4), Direction::Right));
        assert!(!can_move(&maze, Position::new(9, 9), Direction::Up));
    }

    #[test]
    fn can_move_follows_walls()
    {
        let maze = seeded(6, 6, 21);
        for cell in maze.cells() {
            let pos = Position::new(cell.r, cell.c);
            for dir in Direction::ALL {
                let expected = !cell.walls.has(dir) && maze.neighbor(pos, dir).is_some();
                assert_eq!(can_move(&maze, pos, dir), expected);
            }
        }
    }

    #[test]
    fn obstacles_block_entry_but_not_walls()
    {
        let mut maze = seeded(5, 5, 8);
        let path = solution_path(&maze);
        let (from, to) = (path[0], path[1]);
        let dir = Direction::ALL
            .into_iter()
            .find(|&dir| maze.neighbor(from, dir) == Some(to))
            .unwrap();
        assert!(can_move(&maze, from, dir));

        assert!(maze.place_obstacle(to, "rock"));
        assert!(!can_move(&maze, from, dir));
        assert_eq!(maze.open_passages(), 24);
        assert_eq!(maze.obstacle_count(), 1);
    }

    #[test]
    fn obstacles_never_land_on_start_or_end()
    {
        let mut maze = seeded(3, 3, 2);
        assert!(!maze.place_obstacle(Position::new(0, 0), "mud"));
        assert!(!maze.place_obstacle(Position::new(2, 2), "mud"));
        assert!(!maze.place_obstacle(Position::new(3, 0), "mud"));
        assert_eq!(maze.obstacle_count(), 0);
    }

    #[test]
    fn solution_path_runs_start_to_end_through_open_walls()
    {
        let maze = seeded(10, 14, 17);
        let path = solution_path(&maze);
        assert_eq!(path.first(), Some(&start_position()));
        assert_eq!(path.last(), Some(&Position::new(9, 13)));
        for pair in path.windows(2) {
            let dir = Direction::ALL
                .into_iter()
                .find(|&dir| maze.neighbor(pair[0], dir) == Some(pair[1]))
                .unwrap();
            assert!(can_move(&maze, pair[0], dir));
        }
    }
}
