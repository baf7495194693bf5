use crate::config::ArcadeConfig;
use crate::games;
use crate::term::{self, Canvas, Glyph, Rgb, TerminalGuard, TICK_MS};
use anyhow::Result;
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};

const FIELD_WIDTH: usize = 60;
const FIELD_HEIGHT: usize = 18;
const BIRD_COL: f32 = 10.0;
const GRAVITY: f32 = 38.0;
const FLAP_VELOCITY: f32 = -11.0;
const MAX_FALL: f32 = 18.0;
const PIPE_SPEED: f32 = 14.0;
const PIPE_WIDTH: f32 = 3.0;
const PIPE_GAP: usize = 6;
const PIPE_SPACING: f32 = 20.0;

#[derive(Clone, Debug, PartialEq)]
struct Pipe
{
    x: f32,
    gap_top: usize,
    scored: bool,
}

impl Pipe
{
    fn covers_column(&self, col: f32) -> bool
    {
        col >= self.x && col < self.x + PIPE_WIDTH
    }

    fn blocks_row(&self, row: usize) -> bool
    {
        row < self.gap_top || row >= self.gap_top + PIPE_GAP
    }
}

/// Bird physics in rows per second, pipes in columns per second.
struct Flight
{
    width: usize,
    height: usize,
    bird_y: f32,
    velocity: f32,
    pipes: Vec<Pipe>,
    until_spawn: f32,
    score: u32,
    alive: bool,
}

impl Flight
{
    fn new(width: usize, height: usize) -> Self
    {
        Self {
            width,
            height,
            bird_y: height as f32 / 2.0,
            velocity: 0.0,
            pipes: Vec::new(),
            until_spawn: 0.0,
            score: 0,
            alive: true,
        }
    }

    fn flap(&mut self)
    {
        if self.alive {
            self.velocity = FLAP_VELOCITY;
        }
    }

    fn bird_row(&self) -> usize
    {
        self.bird_y.max(0.0) as usize
    }

    fn step(&mut self, dt: f32, rng: &mut impl Rng)
    {
        if !self.alive {
            return;
        }

        self.velocity = (self.velocity + GRAVITY * dt).min(MAX_FALL);
        self.bird_y += self.velocity * dt;

        let shift = PIPE_SPEED * dt;
        for pipe in &mut self.pipes {
            pipe.x -= shift;
            if !pipe.scored && pipe.x + PIPE_WIDTH <= BIRD_COL {
                pipe.scored = true;
                self.score += 1;
            }
        }
        self.pipes.retain(|pipe| pipe.x + PIPE_WIDTH > 0.0);

        self.until_spawn -= shift;
        if self.until_spawn <= 0.0 {
            self.spawn_pipe(rng);
            self.until_spawn = PIPE_SPACING;
        }

        if self.bird_y < 0.0 || self.bird_y >= self.height as f32 || self.hits_pipe() {
            self.alive = false;
        }
    }

    fn spawn_pipe(&mut self, rng: &mut impl Rng)
    {
        let max_top = self.height.saturating_sub(PIPE_GAP + 1).max(1);
        self.pipes.push(Pipe {
            x: self.width as f32,
            gap_top: rng.gen_range(1..=max_top),
            scored: false,
        });
    }

    fn hits_pipe(&self) -> bool
    {
        let row = self.bird_row();
        self.pipes
            .iter()
            .any(|pipe| pipe.covers_column(BIRD_COL) && pipe.blocks_row(row))
    }

    fn render(&self) -> Vec<String>
    {
        let mut canvas = Canvas::new(self.width, self.height);
        for pipe in &self.pipes {
            for offset in 0..PIPE_WIDTH as usize {
                let col = pipe.x + offset as f32;
                if col < 0.0 {
                    continue;
                }
                for row in (0..self.height).filter(|&row| pipe.blocks_row(row)) {
                    canvas.put(row, col as usize, Glyph::new('#', Some(Rgb::GREEN)));
                }
            }
        }
        let bird = if self.alive { '>' } else { 'x' };
        canvas.put(self.bird_row(), BIRD_COL as usize, Glyph::new(bird, Some(Rgb::GOLD)));
        canvas.lines()
    }
}

pub fn run(arcade: &ArcadeConfig) -> Result<()>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let mut flight = Flight::new(FIELD_WIDTH, FIELD_HEIGHT);
    let start = Instant::now();
    let mut last_tick = Instant::now();
    let mut quit = false;

    while flight.alive {
        for key in term::poll_keys()? {
            if term::is_quit(&key) {
                quit = true;
            } else if matches!(key.code, KeyCode::Char(' ') | KeyCode::Up) {
                flight.flap();
            }
        }
        if quit {
            break;
        }

        let dt = last_tick.elapsed();
        if dt >= Duration::from_millis(TICK_MS) {
            flight.step(dt.as_secs_f32(), &mut rng);
            let mut lines = vec![
                "Arcade - Flappy".to_string(),
                format!("Pipes: {}  Time: {:>5.1}s", flight.score, start.elapsed().as_secs_f32()),
                "=".repeat(FIELD_WIDTH),
            ];
            lines.extend(flight.render());
            lines.push("=".repeat(FIELD_WIDTH));
            lines.push("Controls: SPACE/up to flap, ESC to quit".to_string());
            term.draw(&lines)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!("flappy run ended with {} pipes", flight.score);
    let details = vec![
        format!("Pipes passed: {}", flight.score),
        format!("Airtime: {:>5.1}s", start.elapsed().as_secs_f32()),
    ];
    let score = (!quit || flight.score > 0).then_some(flight.score);
    games::conclude(&mut term, arcade, "flappy", score, details)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DT: f32 = 0.033;

    #[test]
    fn gravity_eventually_hits_the_floor()
    {
        let mut rng = StdRng::seed_from_u64(1);
        let mut flight = Flight::new(FIELD_WIDTH, FIELD_HEIGHT);
        flight.pipes.clear();
        for _ in 0..200 {
            flight.step(DT, &mut rng);
            flight.pipes.clear();
        }
        assert!(!flight.alive);
        assert!(flight.bird_y >= FIELD_HEIGHT as f32);
    }

    #[test]
    fn flapping_lifts_the_bird()
    {
        let mut rng = StdRng::seed_from_u64(2);
        let mut flight = Flight::new(FIELD_WIDTH, FIELD_HEIGHT);
        let before = flight.bird_y;
        flight.flap();
        flight.step(DT, &mut rng);
        assert!(flight.bird_y < before);
    }

    #[test]
    fn passing_a_pipe_scores_once()
    {
        let mut rng = StdRng::seed_from_u64(3);
        let mut flight = Flight::new(FIELD_WIDTH, FIELD_HEIGHT);
        flight.until_spawn = f32::MAX;
        flight.pipes.push(Pipe {
            x: BIRD_COL + 1.0,
            gap_top: 0,
            scored: false,
        });
        flight.bird_y = 2.0;
        for _ in 0..30 {
            flight.velocity = 0.0;
            flight.bird_y = 2.0;
            flight.step(DT, &mut rng);
        }
        assert!(flight.alive);
        assert_eq!(flight.score, 1);
    }

    #[test]
    fn flying_into_a_pipe_ends_the_run()
    {
        let mut rng = StdRng::seed_from_u64(4);
        let mut flight = Flight::new(FIELD_WIDTH, FIELD_HEIGHT);
        flight.until_spawn = f32::MAX;
        flight.pipes.push(Pipe {
            x: BIRD_COL,
            gap_top: 12,
            scored: false,
        });
        flight.bird_y = 3.0;
        flight.step(DT, &mut rng);
        assert!(!flight.alive);
        let velocity = flight.velocity;
        flight.flap();
        assert_eq!(flight.velocity, velocity);
    }

    #[test]
    fn new_pipes_leave_a_full_gap_inside_the_field()
    {
        let mut rng = StdRng::seed_from_u64(5);
        let mut flight = Flight::new(FIELD_WIDTH, FIELD_HEIGHT);
        for _ in 0..50 {
            flight.spawn_pipe(&mut rng);
        }
        for pipe in &flight.pipes {
            assert!(pipe.gap_top >= 1);
            assert!(pipe.gap_top + PIPE_GAP < FIELD_HEIGHT);
        }
    }
}
