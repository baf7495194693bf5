pub mod flappy;
pub mod maze;
pub mod mole;
pub mod quick_click;
pub mod target_tap;
pub mod typing;

use crate::config::ArcadeConfig;
use crate::hints::{HintSource, MockHints};
use crate::leaderboard::{self, JsonFileStore, Leaderboard, ScoreEntry, ScoreOrder};
use crate::term::{self, Rgb, TerminalGuard};
use anyhow::Result;

pub struct GameDescriptor
{
    pub name: &'static str,
    pub description: &'static str,
    pub order: ScoreOrder,
    pub unit: &'static str,
}

pub fn registry() -> Vec<GameDescriptor>
{
    vec![
        GameDescriptor {
            name: "maze",
            description: "Escape ever larger mazes around AI-placed obstacles",
            order: ScoreOrder::HigherIsBetter,
            unit: "pts",
        },
        GameDescriptor {
            name: "flappy",
            description: "Flap through the pipes with the space bar",
            order: ScoreOrder::HigherIsBetter,
            unit: "pipes",
        },
        GameDescriptor {
            name: "mole",
            description: "Mash moles on the number pad before they duck",
            order: ScoreOrder::HigherIsBetter,
            unit: "moles",
        },
        GameDescriptor {
            name: "quick-click",
            description: "Reaction test: hit space the moment it says GO",
            order: ScoreOrder::LowerIsBetter,
            unit: "ms",
        },
        GameDescriptor {
            name: "typing",
            description: "Type falling words before they hit the floor",
            order: ScoreOrder::HigherIsBetter,
            unit: "words",
        },
        GameDescriptor {
            name: "target-tap",
            description: "Steer to each target and tap it before it fades",
            order: ScoreOrder::HigherIsBetter,
            unit: "hits",
        },
    ]
}

pub fn find(name: &str) -> Option<GameDescriptor>
{
    registry()
        .into_iter()
        .find(|game| game.name.eq_ignore_ascii_case(name))
}

pub fn leaderboard_for(arcade: &ArcadeConfig, game: &GameDescriptor) -> Leaderboard<JsonFileStore>
{
    Leaderboard::new(JsonFileStore::for_game(&arcade.data_dir, game.name), game.order)
}

/// Records the score, shows the summary with the current table and waits
/// for space.
pub fn conclude(
    term: &mut TerminalGuard,
    arcade: &ArcadeConfig,
    game_name: &str,
    score: Option<u32>,
    details: Vec<String>,
) -> Result<()>
{
    let Some(game) = find(game_name) else {
        anyhow::bail!("Unknown game '{game_name}'");
    };
    let mut board = leaderboard_for(arcade, &game);

    let mut lines = vec![format!("{} - game over", game.name), String::new()];
    lines.extend(details);
    lines.push(String::new());

    match score {
        Some(score) => {
            lines.push(format!("Score: {score} {}", game.unit));
            match board.submit(ScoreEntry::now(&arcade.player_name, score)) {
                Ok(Some(rank)) => lines.push(term::paint(
                    &format!("New high score! {} is #{rank}", arcade.player_name),
                    Rgb::GOLD,
                )),
                Ok(None) => lines.push("Not enough for the leaderboard this time.".to_string()),
                Err(err) => {
                    log::warn!("could not save {} score: {err:#}", game.name);
                    lines.push(format!("Could not save score: {err:#}"));
                }
            }
        }
        None => lines.push("No score recorded.".to_string()),
    }

    lines.push(String::new());
    lines.push("Leaderboard".to_string());
    match board.top() {
        Ok(entries) => lines.extend(leaderboard::format_table(&entries)),
        Err(err) => lines.push(format!("  unavailable: {err:#}")),
    }
    lines.push(String::new());
    let mut hints = MockHints::new(rand::thread_rng());
    lines.push(tip_line(&mut hints, game.name));
    lines.push("Press SPACE to exit.".to_string());

    term.draw(&lines)?;
    term::wait_for_space()
}

fn tip_line(hints: &mut dyn HintSource, game: &str) -> String
{
    format!("Tip: {}", hints.hint(game))
}
