use crate::config::{ArcadeConfig, flag_value};
use crate::games;
use crate::term::{self, Canvas, Glyph, Rgb, TerminalGuard, TICK_MS};
use crate::words::{BONUS_WORDS, WORDS};
use anyhow::Result;
use crossterm::event::KeyCode;
use crossterm::terminal;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};

const LEVEL_DURATION: Duration = Duration::from_secs(60);
const START_LIVES: u8 = 5;
const MAX_WORDS: usize = 5;
const SPAWN_INTERVAL: Duration = Duration::from_millis(1400);
const BONUS_INTERVAL: u32 = 10;
const DEFAULT_WPM: f32 = 20.0;
const MIN_WPM: f32 = 5.0;
const MAX_WPM: f32 = 120.0;

#[derive(Clone, Debug)]
struct Word
{
    text: String,
    spawned_at: Instant,
    ttl: Duration,
    column: usize,
    is_bonus: bool,
}

impl Word
{
    fn progress(&self, now: Instant) -> f32
    {
        let age = now.saturating_duration_since(self.spawned_at);
        if self.ttl.is_zero() {
            return 1.0;
        }
        (age.as_secs_f32() / self.ttl.as_secs_f32()).clamp(0.0, 1.0)
    }
}

#[derive(Default, Debug)]
struct Stats
{
    words_typed: u32,
    words_missed: u32,
    keystrokes: u32,
    backspaces: u32,
}

pub struct TypingConfig
{
    start_wpm: f32,
    speed_scale: f32,
}

impl TypingConfig
{
    pub fn from_args(args: &[String]) -> Result<Self, String>
    {
        let mut wpm: Option<f32> = None;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match flag_value(arg, "--wpm", &mut iter)? {
                Some(value) => wpm = Some(parse_wpm(value)?),
                None => return Err(format!("Unknown typing option '{arg}'")),
            }
        }

        Ok(Self::new(wpm.unwrap_or(DEFAULT_WPM)))
    }

    fn new(start_wpm: f32) -> Self
    {
        let clamped = start_wpm.clamp(MIN_WPM, MAX_WPM);
        let scale = (DEFAULT_WPM / clamped).clamp(0.4, 2.5);
        Self {
            start_wpm: clamped,
            speed_scale: scale,
        }
    }
}

impl Default for TypingConfig
{
    fn default() -> Self
    {
        Self::new(DEFAULT_WPM)
    }
}

fn parse_wpm(value: &str) -> Result<f32, String>
{
    let parsed = value
        .parse::<f32>()
        .map_err(|_| "WPM must be a number".to_string())?;
    if parsed <= 0.0 {
        return Err("WPM must be positive".to_string());
    }
    Ok(parsed)
}

/// Falling words, lives and the input buffer for one timed round.
struct TypingRound
{
    start: Instant,
    next_spawn: Instant,
    spawn_interval: Duration,
    speed_scale: f32,
    words: Vec<Word>,
    buffer: String,
    stats: Stats,
    lives: u8,
    bonus_ready: bool,
    words_since_bonus: u32,
}

impl TypingRound
{
    fn new(start: Instant, config: &TypingConfig) -> Self
    {
        Self {
            start,
            next_spawn: start,
            spawn_interval: scaled_duration(SPAWN_INTERVAL, config.speed_scale),
            speed_scale: config.speed_scale,
            words: Vec::new(),
            buffer: String::new(),
            stats: Stats::default(),
            lives: START_LIVES,
            bonus_ready: false,
            words_since_bonus: 0,
        }
    }

    fn elapsed(&self, now: Instant) -> Duration
    {
        now.saturating_duration_since(self.start).min(LEVEL_DURATION)
    }

    fn is_over(&self, now: Instant) -> bool
    {
        self.lives == 0 || now.saturating_duration_since(self.start) >= LEVEL_DURATION
    }

    fn key(&mut self, code: KeyCode)
    {
        match code {
            KeyCode::Backspace => {
                self.stats.backspaces += 1;
                self.buffer.pop();
            }
            KeyCode::Enter => self.buffer.clear(),
            KeyCode::Char(ch) if ch.is_ascii_alphabetic() => {
                self.stats.keystrokes += 1;
                self.buffer.push(ch.to_ascii_lowercase());
                self.match_buffer();
            }
            _ => {}
        }
    }

    fn match_buffer(&mut self)
    {
        let Some(index) = self.words.iter().position(|word| word.text == self.buffer) else {
            return;
        };
        let word = self.words.swap_remove(index);
        self.stats.words_typed += 1;
        if word.is_bonus {
            self.lives = (self.lives + 1).min(START_LIVES);
        } else {
            self.words_since_bonus += 1;
            if self.words_since_bonus >= BONUS_INTERVAL {
                self.bonus_ready = true;
                self.words_since_bonus = 0;
            }
        }
        self.buffer.clear();
    }

    fn tick(&mut self, rng: &mut impl Rng, now: Instant, field_width: usize)
    {
        if self.words.is_empty() || (now >= self.next_spawn && self.words.len() < MAX_WORDS) {
            self.spawn(rng, now, field_width);
            self.next_spawn = now + self.spawn_interval;
        } else if now >= self.next_spawn {
            self.next_spawn = now + self.spawn_interval;
        }

        let before = self.words.len();
        self.words
            .retain(|word| now.saturating_duration_since(word.spawned_at) < word.ttl);
        let expired = before - self.words.len();
        if expired > 0 {
            let lost = expired.min(self.lives as usize) as u8;
            self.lives = self.lives.saturating_sub(lost);
            self.stats.words_missed += expired as u32;
        }
    }

    fn spawn(&mut self, rng: &mut impl Rng, now: Instant, field_width: usize)
    {
        let is_bonus = std::mem::take(&mut self.bonus_ready);
        let pool = if is_bonus { BONUS_WORDS } else { WORDS };
        let text = pool.choose(rng).copied().unwrap_or("alpha");
        let max_col = field_width.saturating_sub(text.len());
        let column = if max_col == 0 { 0 } else { rng.gen_range(0..=max_col) };
        let ttl = self.word_ttl(rng, self.elapsed(now));
        self.words.push(Word {
            text: text.to_string(),
            spawned_at: now,
            ttl,
            column,
            is_bonus,
        });
    }

    fn word_ttl(&self, rng: &mut impl Rng, elapsed: Duration) -> Duration
    {
        let progress = (elapsed.as_secs_f32() / LEVEL_DURATION.as_secs_f32()).clamp(0.0, 1.0);
        let base = term::lerp(5.0, 2.0, progress);
        let jitter = rng.gen_range(0.75..1.25);
        let scaled = (base * self.speed_scale).clamp(0.8, 8.0);
        Duration::from_millis((scaled * jitter * 1000.0) as u64)
    }

    fn matches_prefix(&self) -> bool
    {
        self.words.iter().any(|word| word.text.starts_with(&self.buffer))
    }
}

pub fn run(arcade: &ArcadeConfig, config: TypingConfig) -> Result<()>
{
    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut round = TypingRound::new(start, &config);
    let mut last_tick = Instant::now();
    let mut quit = false;

    loop {
        let now = Instant::now();
        if round.is_over(now) {
            break;
        }

        for key in term::poll_keys()? {
            if term::is_quit(&key) {
                quit = true;
            } else {
                round.key(key.code);
            }
        }
        if quit {
            break;
        }

        let (field_width, field_height) = layout_metrics();
        round.tick(&mut rng, now, field_width);

        if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            term.draw(&draw_round(&round, now, field_width, field_height, config.start_wpm))?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    let elapsed = round.elapsed(Instant::now());
    let stats = &round.stats;
    log::info!(
        "typing round over: {} typed, {} missed",
        stats.words_typed,
        stats.words_missed
    );
    let details = vec![
        format!("Duration: {:>5.1}s", elapsed.as_secs_f32()),
        format!("Lives left: {}", round.lives),
        format!("Words typed: {}", stats.words_typed),
        format!("Words missed: {}", stats.words_missed),
        format!("WPM: {:>5.1}", compute_wpm(stats.words_typed, elapsed)),
        format!(
            "Accuracy: {:>5.1}%",
            compute_accuracy(stats.words_typed, stats.words_missed)
        ),
        format!("Keystrokes: {}", stats.keystrokes),
        format!("Backspaces: {}", stats.backspaces),
    ];
    let score = (!quit || stats.words_typed > 0).then_some(stats.words_typed);
    games::conclude(&mut term, arcade, "typing", score, details)
}

fn draw_round(
    round: &TypingRound,
    now: Instant,
    field_width: usize,
    field_height: usize,
    start_wpm: f32,
) -> Vec<String>
{
    let elapsed = round.elapsed(now);
    let time_left = (LEVEL_DURATION.as_secs_f32() - elapsed.as_secs_f32()).max(0.0);
    let mut lines = vec![
        "Arcade - Speed Typer".to_string(),
        format!(
            "Time left: {:>5.1}s  Lives: {}/{}  On screen: {}  Start WPM: {:>4.0}",
            time_left,
            round.lives,
            START_LIVES,
            round.words.len(),
            start_wpm
        ),
        format!(
            "Typed: {}  Missed: {}  WPM: {:>5.1}",
            round.stats.words_typed,
            round.stats.words_missed,
            compute_wpm(round.stats.words_typed, elapsed)
        ),
    ];

    let mut field = Canvas::new(field_width, field_height);
    let buffer_len = round.buffer.chars().count();
    for word in &round.words {
        let progress = word.progress(now);
        let row = ((field_height as f32 - 1.0) * progress).floor() as usize;
        let base = if word.is_bonus {
            Rgb::GOLD
        } else {
            term::color_for_urgency(progress)
        };
        let prefix_match = buffer_len > 0 && word.text.starts_with(&round.buffer);
        for (offset, ch) in word.text.chars().enumerate() {
            let color = if prefix_match && offset < buffer_len {
                Rgb::CYAN
            } else {
                base
            };
            field.put(row, word.column + offset, Glyph::new(ch, Some(color)));
        }
    }
    lines.extend(field.lines());
    lines.push("=".repeat(field_width.max(1)));

    lines.push(format!("Input: {}", round.buffer));
    lines.push(format!(
        "Status: {}",
        if round.buffer.is_empty() {
            "waiting"
        } else if round.matches_prefix() {
            "ok"
        } else {
            "no match"
        }
    ));
    lines.push("Controls: type words, backspace/enter to clear, ESC to quit".to_string());
    lines
}

fn compute_wpm(words_typed: u32, elapsed: Duration) -> f32
{
    let minutes = elapsed.as_secs_f32() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    words_typed as f32 / minutes
}

fn compute_accuracy(words_typed: u32, words_missed: u32) -> f32
{
    let total = words_typed + words_missed;
    if total == 0 {
        return 0.0;
    }
    (words_typed as f32 / total as f32) * 100.0
}

fn layout_metrics() -> (usize, usize)
{
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    let width = cols as usize;
    let height = rows as usize;
    let extra = 3 + 1 + 3;
    let field_height = (if height > extra { height - extra } else { 6 }).clamp(8, 22);
    let field_width = width.saturating_sub(2).max(10);
    (field_width, field_height)
}

fn scaled_duration(base: Duration, scale: f32) -> Duration
{
    let millis = base.as_secs_f32() * 1000.0 * scale;
    Duration::from_millis(millis.max(100.0) as u64)
}
