//! Per-game high score tables.
//!
//! Session code talks to a [`ScoreStore`] and never touches files directly,
//! so ranking rules can be tested against an in-memory store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const CAPACITY: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry
{
    pub name: String,
    pub score: u32,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub recorded_at: u64,
}

impl ScoreEntry
{
    pub fn now(name: &str, score: u32) -> Self
    {
        let recorded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self {
            name: name.to_string(),
            score,
            recorded_at,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreOrder
{
    HigherIsBetter,
    LowerIsBetter,
}

impl ScoreOrder
{
    fn beats(self, a: u32, b: u32) -> bool
    {
        match self {
            ScoreOrder::HigherIsBetter => a > b,
            ScoreOrder::LowerIsBetter => a < b,
        }
    }
}

pub trait ScoreStore
{
    fn load(&self) -> Result<Vec<ScoreEntry>>;
    fn replace_all(&mut self, entries: &[ScoreEntry]) -> Result<()>;

    fn append(&mut self, entry: ScoreEntry) -> Result<()>
    {
        let mut entries = self.load()?;
        entries.push(entry);
        self.replace_all(&entries)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore
{
    entries: Vec<ScoreEntry>,
}

#[cfg(test)]
impl ScoreStore for MemoryStore
{
    fn load(&self) -> Result<Vec<ScoreEntry>>
    {
        Ok(self.entries.clone())
    }

    fn replace_all(&mut self, entries: &[ScoreEntry]) -> Result<()>
    {
        self.entries = entries.to_vec();
        Ok(())
    }
}

/// One pretty-printed JSON array per game.
pub struct JsonFileStore
{
    path: PathBuf,
}

impl JsonFileStore
{
    pub fn for_game(data_dir: &Path, game: &str) -> Self
    {
        Self {
            path: data_dir.join(format!("{game}.json")),
        }
    }
}

impl ScoreStore for JsonFileStore
{
    fn load(&self) -> Result<Vec<ScoreEntry>>
    {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text)
            .with_context(|| format!("Corrupt score file {}", self.path.display()))
    }

    fn replace_all(&mut self, entries: &[ScoreEntry]) -> Result<()>
    {
        let json = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, &json)?;
        log::debug!("{} now holds {} scores", self.path.display(), entries.len());
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()>
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

pub struct Leaderboard<S: ScoreStore>
{
    store: S,
    order: ScoreOrder,
    capacity: usize,
}

impl<S: ScoreStore> Leaderboard<S>
{
    pub fn new(store: S, order: ScoreOrder) -> Self
    {
        Self {
            store,
            order,
            capacity: CAPACITY,
        }
    }

    #[cfg(test)]
    pub fn with_capacity(mut self, capacity: usize) -> Self
    {
        self.capacity = capacity.max(1);
        self
    }

    /// Best entries first. Ties keep the older entry ahead.
    pub fn top(&self) -> Result<Vec<ScoreEntry>>
    {
        Ok(self.ranked(self.store.load()?))
    }

    fn ranked(&self, mut entries: Vec<ScoreEntry>) -> Vec<ScoreEntry>
    {
        let order = self.order;
        entries.sort_by(|a, b| match order {
            ScoreOrder::HigherIsBetter => b.score.cmp(&a.score),
            ScoreOrder::LowerIsBetter => a.score.cmp(&b.score),
        });
        entries.truncate(self.capacity);
        entries
    }

    pub fn qualifies(&self, score: u32) -> Result<bool>
    {
        let top = self.top()?;
        if top.len() < self.capacity {
            return Ok(true);
        }
        Ok(top
            .last()
            .is_some_and(|worst| self.order.beats(score, worst.score)))
    }

    /// Records `entry` if it makes the table and returns its 1-based rank.
    pub fn submit(&mut self, entry: ScoreEntry) -> Result<Option<usize>>
    {
        if !self.qualifies(entry.score)? {
            log::debug!("score {} for {} missed the table", entry.score, entry.name);
            return Ok(None);
        }
        let top = self.top()?;
        let rank = top
            .iter()
            .take_while(|held| !self.order.beats(entry.score, held.score))
            .count()
            + 1;
        log::info!("{} placed #{rank} with {}", entry.name, entry.score);
        self.store.append(entry)?;

        let stored = self.store.load()?;
        if stored.len() > self.capacity {
            let kept = self.ranked(stored);
            self.store.replace_all(&kept)?;
        }
        Ok(Some(rank))
    }
}

pub fn format_table(entries: &[ScoreEntry]) -> Vec<String>
{
    if entries.is_empty() {
        return vec!["  (no scores yet)".to_string()];
    }
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| format!("  {:>2}. {:<16} {:>6}", idx + 1, entry.name, entry.score))
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn entry(name: &str, score: u32) -> ScoreEntry
    {
        ScoreEntry {
            name: name.to_string(),
            score,
            recorded_at: 0,
        }
    }

    #[test]
    fn higher_scores_rank_first()
    {
        let mut board = Leaderboard::new(MemoryStore::default(), ScoreOrder::HigherIsBetter);
        board.submit(entry("a", 10)).unwrap();
        board.submit(entry("b", 30)).unwrap();
        board.submit(entry("c", 20)).unwrap();
        let names: Vec<_> = board.top().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["b", "c", "a"]);
    }

    #[test]
    fn lower_scores_rank_first_for_reaction_games()
    {
        let mut board = Leaderboard::new(MemoryStore::default(), ScoreOrder::LowerIsBetter);
        board.submit(entry("slow", 420)).unwrap();
        assert_eq!(board.submit(entry("fast", 180)).unwrap(), Some(1));
        assert_eq!(board.top().unwrap()[0].name, "fast");
    }

    #[test]
    fn table_is_capped_and_weak_scores_are_rejected()
    {
        let mut board = Leaderboard::new(MemoryStore::default(), ScoreOrder::HigherIsBetter)
            .with_capacity(3);
        for score in [5, 6, 7] {
            board.submit(entry("p", score)).unwrap();
        }
        assert!(!board.qualifies(5).unwrap());
        assert_eq!(board.submit(entry("late", 4)).unwrap(), None);
        assert_eq!(board.submit(entry("new", 8)).unwrap(), Some(1));
        let scores: Vec<_> = board.top().unwrap().into_iter().map(|e| e.score).collect();
        assert_eq!(scores, [8, 7, 6]);
    }

    #[test]
    fn ties_rank_behind_existing_entries()
    {
        let mut board = Leaderboard::new(MemoryStore::default(), ScoreOrder::HigherIsBetter);
        board.submit(entry("first", 50)).unwrap();
        assert_eq!(board.submit(entry("second", 50)).unwrap(), Some(2));
        let names: Vec<_> = board.top().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn file_store_round_trips_through_disk()
    {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::for_game(dir.path(), "maze");
        assert!(store.load().unwrap().is_empty());
        store.append(entry("ada", 300)).unwrap();
        store.append(entry("bob", 200)).unwrap();

        let reopened = JsonFileStore::for_game(dir.path(), "maze");
        assert_eq!(reopened.load().unwrap(), vec![entry("ada", 300), entry("bob", 200)]);
        assert!(!dir.path().join("maze.json.tmp").exists());
    }

    #[test]
    fn file_store_creates_missing_directories()
    {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("scores/deep");
        let mut store = JsonFileStore::for_game(&nested, "mole");
        store.append(entry("x", 1)).unwrap();
        assert!(nested.join("mole.json").exists());
    }

    #[test]
    fn score_file_keeps_only_the_ranked_table()
    {
        let dir = tempfile::tempdir().unwrap();
        let mut board = Leaderboard::new(
            JsonFileStore::for_game(dir.path(), "target-tap"),
            ScoreOrder::HigherIsBetter,
        )
        .with_capacity(3);
        for score in 1..=15 {
            board.submit(entry("p", score)).unwrap();
        }

        let on_disk = JsonFileStore::for_game(dir.path(), "target-tap").load().unwrap();
        let scores: Vec<_> = on_disk.iter().map(|e| e.score).collect();
        assert_eq!(scores, [15, 14, 13]);
    }

    #[test]
    fn corrupt_file_is_an_error()
    {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::for_game(dir.path(), "flappy");
        fs::write(dir.path().join("flappy.json"), "{not json").unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn empty_table_renders_placeholder()
    {
        assert_eq!(format_table(&[]), vec!["  (no scores yet)".to_string()]);
        assert_eq!(format_table(&[entry("ada", 7)])[0], "   1. ada                   7");
    }
}
