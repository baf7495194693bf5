use crate::config::ArcadeConfig;
use crate::games;
use crate::term::{self, Rgb, TerminalGuard, TICK_MS};
use anyhow::Result;
use crossterm::event::KeyCode;
use rand::Rng;
use std::time::{Duration, Instant};

const ROUNDS: usize = 5;
const FALSE_START_MS: u32 = 1000;
const MISSED_MS: u32 = 2000;
const DELAY_MS: std::ops::RangeInclusive<u64> = 1000..=3000;
const RESULT_PAUSE: Duration = Duration::from_millis(1200);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase
{
    Waiting { go_at: Instant },
    Go { since: Instant },
    Showing { ms: u32, false_start: bool, until: Instant },
    Done,
}

struct Reaction
{
    phase: Phase,
    times: Vec<u32>,
    false_starts: u32,
}

impl Reaction
{
    fn new(rng: &mut impl Rng, now: Instant) -> Self
    {
        Self {
            phase: wait_phase(rng, now),
            times: Vec::new(),
            false_starts: 0,
        }
    }

    fn is_done(&self) -> bool
    {
        self.phase == Phase::Done
    }

    /// Mean of the recorded times, penalties included.
    fn average_ms(&self) -> Option<u32>
    {
        if self.times.is_empty() {
            return None;
        }
        let total: u64 = self.times.iter().map(|&ms| ms as u64).sum();
        Some((total / self.times.len() as u64) as u32)
    }

    fn best_ms(&self) -> Option<u32>
    {
        self.times.iter().copied().min()
    }

    fn press(&mut self, now: Instant)
    {
        match self.phase {
            Phase::Waiting { .. } => {
                self.false_starts += 1;
                self.record(FALSE_START_MS, true, now);
            }
            Phase::Go { since } => {
                let ms = now.saturating_duration_since(since).as_millis() as u32;
                self.record(ms, false, now);
            }
            Phase::Showing { .. } | Phase::Done => {}
        }
    }

    fn record(&mut self, ms: u32, false_start: bool, now: Instant)
    {
        self.times.push(ms);
        self.phase = Phase::Showing {
            ms,
            false_start,
            until: now + RESULT_PAUSE,
        };
    }

    fn tick(&mut self, rng: &mut impl Rng, now: Instant)
    {
        match self.phase {
            Phase::Waiting { go_at } if now >= go_at => {
                self.phase = Phase::Go { since: now };
            }
            Phase::Go { since } if now.saturating_duration_since(since).as_millis() >= MISSED_MS as u128 => {
                self.record(MISSED_MS, false, now);
            }
            Phase::Showing { until, .. } if now >= until => {
                self.phase = if self.times.len() >= ROUNDS {
                    Phase::Done
                } else {
                    wait_phase(rng, now)
                };
            }
            _ => {}
        }
    }

    fn banner(&self) -> String
    {
        match self.phase {
            Phase::Waiting { .. } => term::paint("Wait for it...", Rgb::RED),
            Phase::Go { .. } => term::paint(">>> GO! <<<", Rgb::GREEN),
            Phase::Showing { false_start: true, .. } => {
                term::paint(&format!("Too soon! +{FALSE_START_MS} ms"), Rgb::ORANGE)
            }
            Phase::Showing { ms, .. } => term::paint(&format!("{ms} ms"), Rgb::CYAN),
            Phase::Done => "Done!".to_string(),
        }
    }
}

fn wait_phase(rng: &mut impl Rng, now: Instant) -> Phase
{
    Phase::Waiting {
        go_at: now + Duration::from_millis(rng.gen_range(DELAY_MS)),
    }
}

pub fn run(arcade: &ArcadeConfig) -> Result<()>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let mut reaction = Reaction::new(&mut rng, Instant::now());
    let mut last_tick = Instant::now();
    let mut quit = false;

    while !reaction.is_done() {
        let now = Instant::now();
        for key in term::poll_keys()? {
            if term::is_quit(&key) {
                quit = true;
            } else if key.code == KeyCode::Char(' ') {
                reaction.press(now);
            }
        }
        if quit {
            break;
        }

        reaction.tick(&mut rng, now);

        if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            let lines = vec![
                "Arcade - Quick Click".to_string(),
                format!(
                    "Round {}/{}  Best: {}",
                    (reaction.times.len() + 1).min(ROUNDS),
                    ROUNDS,
                    reaction
                        .best_ms()
                        .map(|ms| format!("{ms} ms"))
                        .unwrap_or_else(|| "-".to_string())
                ),
                String::new(),
                format!("      {}", reaction.banner()),
                String::new(),
                "Controls: SPACE when it says GO, ESC to quit".to_string(),
            ];
            term.draw(&lines)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    log::info!("quick-click times: {:?}", reaction.times);
    let details = vec![
        format!(
            "Times: {}",
            reaction
                .times
                .iter()
                .map(|ms| format!("{ms}ms"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!("False starts: {}", reaction.false_starts),
    ];
    let score = if reaction.is_done() {
        reaction.average_ms()
    } else {
        None
    };
    games::conclude(&mut term, arcade, "quick-click", score, details)
}
