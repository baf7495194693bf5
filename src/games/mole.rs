use crate::config::ArcadeConfig;
use crate::games;
use crate::term::{self, Rgb, TerminalGuard, TICK_MS};
use anyhow::Result;
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};

const ROUND_DURATION: Duration = Duration::from_secs(30);
const HOLES: usize = 9;
const START_WINDOW_MS: u64 = 1200;
const MIN_WINDOW_MS: u64 = 450;
const WINDOW_STEP_MS: u64 = 40;
const PAUSE_MS: std::ops::Range<u64> = 200..700;

/// Holes laid out like a number pad: 7 8 9 on top, 1 2 3 at the bottom.
fn hole_for_key(ch: char) -> Option<usize>
{
    let digit = ch.to_digit(10)? as usize;
    if digit == 0 {
        return None;
    }
    let row = 2 - (digit - 1) / 3;
    let col = (digit - 1) % 3;
    Some(row * 3 + col)
}

fn key_for_hole(hole: usize) -> char
{
    let row = hole / 3;
    let col = hole % 3;
    let digit = (2 - row) * 3 + col + 1;
    char::from_digit(digit as u32, 10).unwrap_or('?')
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Mole
{
    hole: usize,
    until: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Swing
{
    Hit,
    Whiff,
}

struct Whack
{
    start: Instant,
    mole: Option<Mole>,
    next_pop: Instant,
    hits: u32,
    whiffs: u32,
    escaped: u32,
}

impl Whack
{
    fn new(start: Instant) -> Self
    {
        Self {
            start,
            mole: None,
            next_pop: start,
            hits: 0,
            whiffs: 0,
            escaped: 0,
        }
    }

    /// Hits minus whiffs, never below zero.
    fn score(&self) -> u32
    {
        self.hits.saturating_sub(self.whiffs)
    }

    fn is_over(&self, now: Instant) -> bool
    {
        now.saturating_duration_since(self.start) >= ROUND_DURATION
    }

    fn window(&self) -> Duration
    {
        let shrink = WINDOW_STEP_MS * self.hits as u64;
        Duration::from_millis(START_WINDOW_MS.saturating_sub(shrink).max(MIN_WINDOW_MS))
    }

    fn tick(&mut self, rng: &mut impl Rng, now: Instant)
    {
        if let Some(mole) = self.mole {
            if now >= mole.until {
                self.mole = None;
                self.escaped += 1;
                self.next_pop = now + Duration::from_millis(rng.gen_range(PAUSE_MS));
            }
            return;
        }
        if now >= self.next_pop {
            self.mole = Some(Mole {
                hole: rng.gen_range(0..HOLES),
                until: now + self.window(),
            });
        }
    }

    fn swing(&mut self, hole: usize, rng: &mut impl Rng, now: Instant) -> Swing
    {
        match self.mole {
            Some(mole) if mole.hole == hole => {
                self.hits += 1;
                self.mole = None;
                self.next_pop = now + Duration::from_millis(rng.gen_range(PAUSE_MS));
                Swing::Hit
            }
            _ => {
                self.whiffs += 1;
                Swing::Whiff
            }
        }
    }

    fn render(&self) -> Vec<String>
    {
        let mut lines = Vec::new();
        for row in 0..3 {
            let mut line = String::from("   ");
            for col in 0..3 {
                let hole = row * 3 + col;
                let cell = if self.mole.is_some_and(|mole| mole.hole == hole) {
                    term::paint("(o.o)", Rgb::BROWN)
                } else {
                    format!("[ {} ]", key_for_hole(hole))
                };
                line.push_str(&cell);
                line.push_str("   ");
            }
            lines.push(line);
            lines.push(String::new());
        }
        lines
    }
}

pub fn run(arcade: &ArcadeConfig) -> Result<()>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut whack = Whack::new(start);
    let mut last_tick = Instant::now();
    let mut last_swing: Option<Swing> = None;
    let mut quit = false;

    loop {
        let now = Instant::now();
        if whack.is_over(now) {
            break;
        }

        for key in term::poll_keys()? {
            if term::is_quit(&key) {
                quit = true;
            } else if let KeyCode::Char(ch) = key.code {
                if let Some(hole) = hole_for_key(ch) {
                    last_swing = Some(whack.swing(hole, &mut rng, now));
                }
            }
        }
        if quit {
            break;
        }

        whack.tick(&mut rng, now);

        if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            let left = ROUND_DURATION.saturating_sub(now.saturating_duration_since(start));
            let mut lines = vec![
                "Arcade - Mole Mash".to_string(),
                format!(
                    "Time left: {:>4.1}s  Score: {}  Hits: {}  Whiffs: {}",
                    left.as_secs_f32(),
                    whack.score(),
                    whack.hits,
                    whack.whiffs
                ),
                String::new(),
            ];
            lines.extend(whack.render());
            lines.push(match last_swing {
                Some(Swing::Hit) => term::paint("Bonk!", Rgb::GREEN),
                Some(Swing::Whiff) => term::paint("Whiff...", Rgb::RED),
                None => String::new(),
            });
            lines.push("Controls: number pad 1-9 to swing, ESC to quit".to_string());
            term.draw(&lines)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!("mole round over: {} hits, {} whiffs", whack.hits, whack.whiffs);
    let details = vec![
        format!("Hits: {}", whack.hits),
        format!("Whiffs: {}", whack.whiffs),
        format!("Escaped: {}", whack.escaped),
    ];
    let score = (!quit || whack.hits > 0).then_some(whack.score());
    games::conclude(&mut term, arcade, "mole", score, details)
}
