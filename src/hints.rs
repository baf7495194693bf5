//! Stand-in for an AI helper: canned hints and random maze obstacles.

use crate::games::maze::grid::{Maze, Position};
use rand::Rng;
use rand::seq::SliceRandom;

pub const OBSTACLE_TAGS: [&str; 4] = ["rock", "mud", "ice", "bush"];

const MAZE_HINTS: &[&str] = &[
    "Hug one wall and you will never loop forever.",
    "The exit is always in the far corner.",
    "Dead ends are cheap to back out of. Keep moving.",
    "Obstacles never sit on the only way out.",
];
const FLAPPY_HINTS: &[&str] = &[
    "Tap early. Falling is faster than rising.",
    "Aim for the middle of the gap, not the edge.",
];
const MOLE_HINTS: &[&str] = &[
    "Keep your fingers resting on the number pad.",
    "Missed swings cost a point. Wait for the mole.",
];
const QUICK_CLICK_HINTS: &[&str] = &[
    "Watch the screen, not the keyboard.",
    "Jumping the gun costs a full second.",
];
const TYPING_HINTS: &[&str] = &[
    "Clear a bad buffer with Enter instead of backspacing.",
    "Gold words give a life back.",
];
const TARGET_TAP_HINTS: &[&str] = &[
    "Move diagonally by alternating arrow keys.",
    "Targets shrink their timer as you score.",
];
const GENERIC_HINTS: &[&str] = &["Take a breath. You've got this."];

pub trait HintSource
{
    fn hint(&mut self, game: &str) -> String;

    /// Up to `count` obstacle placements. Start and end cells are never chosen.
    fn obstacles(&mut self, maze: &Maze, count: usize) -> Vec<(Position, String)>;
}

pub struct MockHints<R: Rng>
{
    rng: R,
}

impl<R: Rng> MockHints<R>
{
    pub fn new(rng: R) -> Self
    {
        Self { rng }
    }
}

impl<R: Rng> HintSource for MockHints<R>
{
    fn hint(&mut self, game: &str) -> String
    {
        let pool = match game {
            "maze" => MAZE_HINTS,
            "flappy" => FLAPPY_HINTS,
            "mole" => MOLE_HINTS,
            "quick-click" => QUICK_CLICK_HINTS,
            "typing" => TYPING_HINTS,
            "target-tap" => TARGET_TAP_HINTS,
            _ => GENERIC_HINTS,
        };
        pool.choose(&mut self.rng)
            .copied()
            .unwrap_or("Good luck!")
            .to_string()
    }

    fn obstacles(&mut self, maze: &Maze, count: usize) -> Vec<(Position, String)>
    {
        let mut free: Vec<Position> = maze
            .cells()
            .filter(|cell| !cell.is_start && !cell.is_end)
            .map(|cell| Position::new(cell.r, cell.c))
            .collect();
        free.shuffle(&mut self.rng);
        free.into_iter()
            .take(count)
            .map(|pos| {
                let tag = OBSTACLE_TAGS[self.rng.gen_range(0..OBSTACLE_TAGS.len())];
                (pos, tag.to_string())
            })
            .collect()
    }
}
