use anyhow::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use std::time::Duration;

pub const TICK_MS: u64 = 33;

pub struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    pub fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    /// Replaces the whole screen with `lines`.
    pub fn draw(&mut self, lines: &[String]) -> Result<()>
    {
        let output = format!("{}\r\n", lines.join("\r\n"));
        queue!(self.stdout, MoveTo(0, 0), Clear(ClearType::All))?;
        self.stdout.write_all(output.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb
{
    pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    pub const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
    pub const YELLOW: Rgb = Rgb { r: 255, g: 255, b: 0 };
    pub const ORANGE: Rgb = Rgb { r: 255, g: 128, b: 0 };
    pub const GOLD: Rgb = Rgb { r: 255, g: 215, b: 0 };
    pub const CYAN: Rgb = Rgb { r: 0, g: 200, b: 255 };
    pub const BROWN: Rgb = Rgb { r: 160, g: 100, b: 40 };
    pub const GREY: Rgb = Rgb { r: 140, g: 140, b: 140 };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph
{
    pub ch: char,
    pub color: Option<Rgb>,
}

impl Glyph
{
    pub const BLANK: Glyph = Glyph { ch: ' ', color: None };

    pub fn new(ch: char, color: Option<Rgb>) -> Self
    {
        Self { ch, color }
    }
}

/// A fixed-size character canvas that games paint into every frame.
pub struct Canvas
{
    width: usize,
    height: usize,
    glyphs: Vec<Vec<Glyph>>,
}

impl Canvas
{
    pub fn new(width: usize, height: usize) -> Self
    {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            glyphs: vec![vec![Glyph::BLANK; width]; height],
        }
    }

    pub fn put(&mut self, row: usize, col: usize, glyph: Glyph)
    {
        if row < self.height && col < self.width {
            self.glyphs[row][col] = glyph;
        }
    }

    pub fn text(&mut self, row: usize, col: usize, text: &str, color: Option<Rgb>)
    {
        for (offset, ch) in text.chars().enumerate() {
            self.put(row, col + offset, Glyph::new(ch, color));
        }
    }

    pub fn lines(&self) -> Vec<String>
    {
        self.glyphs.iter().map(|row| render_row(row)).collect()
    }
}

pub fn render_row(row: &[Glyph]) -> String
{
    let mut line = String::with_capacity(row.len() + 16);
    let mut active: Option<Rgb> = None;
    for glyph in row {
        if glyph.color != active {
            if let Some(color) = glyph.color {
                line.push_str(&ansi_color(color));
            } else {
                line.push_str("\x1b[0m");
            }
            active = glyph.color;
        }
        line.push(glyph.ch);
    }
    if active.is_some() {
        line.push_str("\x1b[0m");
    }
    line
}

pub fn ansi_color(color: Rgb) -> String
{
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

pub fn paint(text: &str, color: Rgb) -> String
{
    format!("{}{}\x1b[0m", ansi_color(color), text)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32
{
    a + (b - a) * t
}

pub fn lerp_color(start: Rgb, end: Rgb, t: f32) -> Rgb
{
    let t = t.clamp(0.0, 1.0);
    Rgb {
        r: lerp(start.r as f32, end.r as f32, t) as u8,
        g: lerp(start.g as f32, end.g as f32, t) as u8,
        b: lerp(start.b as f32, end.b as f32, t) as u8,
    }
}

/// Green through red as `progress` goes from 0 to 1.
pub fn color_for_urgency(progress: f32) -> Rgb
{
    let progress = progress.clamp(0.0, 1.0);
    if progress < 0.33 {
        lerp_color(Rgb::GREEN, Rgb::YELLOW, progress / 0.33)
    } else if progress < 0.66 {
        lerp_color(Rgb::YELLOW, Rgb::ORANGE, (progress - 0.33) / 0.33)
    } else {
        lerp_color(Rgb::ORANGE, Rgb::RED, (progress - 0.66) / 0.34)
    }
}

pub fn is_quit(key: &KeyEvent) -> bool
{
    match key.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Drains pending key presses without blocking. Releases and repeats on
/// platforms that report them are skipped.
pub fn poll_keys() -> Result<Vec<KeyEvent>>
{
    let mut keys = Vec::new();
    while event::poll(Duration::from_millis(0))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}

pub fn wait_for_space() -> Result<()>
{
    while event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(KeyEvent { code: KeyCode::Char(' '), .. }) = event::read()? {
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn render_row_resets_color_runs()
    {
        let row = [
            Glyph::new('a', Some(Rgb::RED)),
            Glyph::new('b', Some(Rgb::RED)),
            Glyph::new('c', None),
        ];
        let line = render_row(&row);
        assert_eq!(line, format!("{}ab\x1b[0mc", ansi_color(Rgb::RED)));
    }

    #[test]
    fn canvas_clips_out_of_bounds_writes()
    {
        let mut canvas = Canvas::new(3, 1);
        canvas.text(0, 1, "xyz", None);
        canvas.put(5, 0, Glyph::new('!', None));
        assert_eq!(canvas.lines(), vec![" xy".to_string()]);
    }

    #[test]
    fn urgency_runs_green_to_red()
    {
        assert_eq!(color_for_urgency(0.0), Rgb::GREEN);
        assert_eq!(color_for_urgency(1.0), Rgb::RED);
    }
}
