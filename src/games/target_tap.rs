use crate::config::ArcadeConfig;
use crate::games;
use crate::term::{self, Canvas, Glyph, Rgb, TerminalGuard, TICK_MS};
use anyhow::Result;
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};

const FIELD_WIDTH: usize = 40;
const FIELD_HEIGHT: usize = 14;
const ROUND_DURATION: Duration = Duration::from_secs(45);
const MAX_MISSES: u32 = 5;
const START_TTL_MS: u64 = 4000;
const MIN_TTL_MS: u64 = 1200;
const TTL_STEP_MS: u64 = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Spot
{
    row: usize,
    col: usize,
}

#[derive(Clone, Copy, Debug)]
struct Target
{
    spot: Spot,
    spawned_at: Instant,
    ttl: Duration,
}

struct Gallery
{
    start: Instant,
    cursor: Spot,
    target: Target,
    hits: u32,
    misses: u32,
    taps: u32,
}

impl Gallery
{
    fn new(rng: &mut impl Rng, start: Instant) -> Self
    {
        let cursor = Spot {
            row: FIELD_HEIGHT / 2,
            col: FIELD_WIDTH / 2,
        };
        let target = Target {
            spot: random_spot(rng, cursor),
            spawned_at: start,
            ttl: Duration::from_millis(START_TTL_MS),
        };
        Self {
            start,
            cursor,
            target,
            hits: 0,
            misses: 0,
            taps: 0,
        }
    }

    fn is_over(&self, now: Instant) -> bool
    {
        self.misses >= MAX_MISSES || now.saturating_duration_since(self.start) >= ROUND_DURATION
    }

    fn target_ttl(&self) -> Duration
    {
        let shrink = TTL_STEP_MS * self.hits as u64;
        Duration::from_millis(START_TTL_MS.saturating_sub(shrink).max(MIN_TTL_MS))
    }

    fn steer(&mut self, code: KeyCode)
    {
        let Spot { row, col } = self.cursor;
        self.cursor = match code {
            KeyCode::Up | KeyCode::Char('w') => Spot { row: row.saturating_sub(1), col },
            KeyCode::Down | KeyCode::Char('s') => Spot { row: (row + 1).min(FIELD_HEIGHT - 1), col },
            KeyCode::Left | KeyCode::Char('a') => Spot { row, col: col.saturating_sub(1) },
            KeyCode::Right | KeyCode::Char('d') => Spot { row, col: (col + 1).min(FIELD_WIDTH - 1) },
            _ => self.cursor,
        };
    }

    /// True when the cursor was on the target.
    fn tap(&mut self, rng: &mut impl Rng, now: Instant) -> bool
    {
        self.taps += 1;
        if self.cursor != self.target.spot {
            return false;
        }
        self.hits += 1;
        self.respawn(rng, now);
        true
    }

    fn tick(&mut self, rng: &mut impl Rng, now: Instant)
    {
        if now.saturating_duration_since(self.target.spawned_at) >= self.target.ttl {
            self.misses += 1;
            self.respawn(rng, now);
        }
    }

    fn respawn(&mut self, rng: &mut impl Rng, now: Instant)
    {
        self.target = Target {
            spot: random_spot(rng, self.cursor),
            spawned_at: now,
            ttl: self.target_ttl(),
        };
    }

    fn render(&self, now: Instant) -> Vec<String>
    {
        let mut canvas = Canvas::new(FIELD_WIDTH, FIELD_HEIGHT);
        for row in 0..FIELD_HEIGHT {
            for col in 0..FIELD_WIDTH {
                canvas.put(row, col, Glyph::new('.', Some(Rgb::GREY)));
            }
        }
        let age = now.saturating_duration_since(self.target.spawned_at);
        let urgency = age.as_secs_f32() / self.target.ttl.as_secs_f32().max(0.001);
        let target = self.target.spot;
        canvas.put(target.row, target.col, Glyph::new('O', Some(term::color_for_urgency(urgency))));
        let cursor_glyph = if self.cursor == target { '@' } else { '+' };
        canvas.put(self.cursor.row, self.cursor.col, Glyph::new(cursor_glyph, Some(Rgb::CYAN)));
        canvas.lines()
    }
}

/// Any spot except `avoid`, so a target never spawns under the cursor.
fn random_spot(rng: &mut impl Rng, avoid: Spot) -> Spot
{
    loop {
        let spot = Spot {
            row: rng.gen_range(0..FIELD_HEIGHT),
            col: rng.gen_range(0..FIELD_WIDTH),
        };
        if spot != avoid {
            return spot;
        }
    }
}

pub fn run(arcade: &ArcadeConfig) -> Result<()>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut gallery = Gallery::new(&mut rng, start);
    let mut last_tick = Instant::now();
    let mut quit = false;

    loop {
        let now = Instant::now();
        if gallery.is_over(now) {
            break;
        }

        for key in term::poll_keys()? {
            if term::is_quit(&key) {
                quit = true;
            } else if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                gallery.tap(&mut rng, now);
            } else {
                gallery.steer(key.code);
            }
        }
        if quit {
            break;
        }

        gallery.tick(&mut rng, now);

        if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            let left = ROUND_DURATION.saturating_sub(now.saturating_duration_since(start));
            let mut lines = vec![
                "Arcade - Target Tap".to_string(),
                format!(
                    "Time left: {:>4.1}s  Hits: {}  Misses: {}/{}",
                    left.as_secs_f32(),
                    gallery.hits,
                    gallery.misses,
                    MAX_MISSES
                ),
            ];
            lines.extend(gallery.render(now));
            lines.push("Controls: arrows/WASD to aim, SPACE to tap, ESC to quit".to_string());
            term.draw(&lines)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!("target-tap over: {} hits from {} taps", gallery.hits, gallery.taps);
    let details = vec![
        format!("Hits: {}", gallery.hits),
        format!("Misses: {}", gallery.misses),
        format!("Taps: {}", gallery.taps),
    ];
    let score = (!quit || gallery.hits > 0).then_some(gallery.hits);
    games::conclude(&mut term, arcade, "target-tap", score, details)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn tapping_on_the_target_scores()
    {
        let now = Instant::now();
        let mut rng = StdRng::seed_from_u64(1);
        let mut gallery = Gallery::new(&mut rng, now);
        assert!(!gallery.tap(&mut rng, now));
        gallery.cursor = gallery.target.spot;
        assert!(gallery.tap(&mut rng, now));
        assert_eq!(gallery.hits, 1);
        assert_ne!(gallery.target.spot, gallery.cursor);
        assert_eq!(gallery.taps, 2);
    }

    #[test]
    fn cursor_stays_inside_the_field()
    {
        let mut rng = StdRng::seed_from_u64(2);
        let mut gallery = Gallery::new(&mut rng, Instant::now());
        for _ in 0..100 {
            gallery.steer(KeyCode::Up);
            gallery.steer(KeyCode::Left);
        }
        assert_eq!(gallery.cursor, Spot { row: 0, col: 0 });
        for _ in 0..100 {
            gallery.steer(KeyCode::Down);
            gallery.steer(KeyCode::Right);
        }
        assert_eq!(gallery.cursor, Spot { row: FIELD_HEIGHT - 1, col: FIELD_WIDTH - 1 });
    }

    #[test]
    fn expired_targets_count_as_misses_and_end_the_round()
    {
        let mut now = Instant::now();
        let mut rng = StdRng::seed_from_u64(3);
        let mut gallery = Gallery::new(&mut rng, now);
        for _ in 0..MAX_MISSES {
            now += gallery.target.ttl;
            gallery.tick(&mut rng, now);
        }
        assert_eq!(gallery.misses, MAX_MISSES);
        assert!(gallery.is_over(now));
    }

    #[test]
    fn targets_fade_faster_as_hits_pile_up()
    {
        let mut rng = StdRng::seed_from_u64(4);
        let mut gallery = Gallery::new(&mut rng, Instant::now());
        assert_eq!(gallery.target_ttl(), Duration::from_millis(START_TTL_MS));
        gallery.hits = 4;
        assert_eq!(gallery.target_ttl(), Duration::from_millis(3400));
        gallery.hits = 100;
        assert_eq!(gallery.target_ttl(), Duration::from_millis(MIN_TTL_MS));
    }
}
