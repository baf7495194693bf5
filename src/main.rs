mod config;
mod games;
mod hints;
mod leaderboard;
mod logging;
mod term;
mod words;

use anyhow::{Result, anyhow, bail};
use config::ArcadeConfig;
use std::env;

fn main()
{
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()>
{
    let mut args: Vec<String> = env::args().skip(1).collect();
    let arcade = ArcadeConfig::from_env(&mut args).map_err(|err| anyhow!(err))?;
    logging::init(&arcade.data_dir)?;

    let command = (!args.is_empty()).then(|| args.remove(0));
    match command.as_deref() {
        None => interactive_menu(&arcade),
        Some("list") => {
            list_games();
            Ok(())
        }
        Some("scores") => show_scores(&arcade, args.first().map(String::as_str)),
        Some("-h") | Some("--help") => {
            print_help();
            Ok(())
        }
        Some(other) => match games::find(other) {
            Some(game) => run_game(&arcade, game.name, &args),
            None => bail!("Unknown command '{other}'. Run with --help."),
        },
    }
}

fn run_game(arcade: &ArcadeConfig, name: &str, args: &[String]) -> Result<()>
{
    log::info!("starting {name} for {}", arcade.player_name);
    let no_options = |game: &str| -> Result<()> {
        if args.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{game} does not accept options yet."))
        }
    };
    match name {
        "maze" => {
            let config = games::maze::MazeConfig::from_args(args).map_err(|err| anyhow!(err))?;
            games::maze::run(arcade, config)
        }
        "typing" => {
            let config = games::typing::TypingConfig::from_args(args).map_err(|err| anyhow!(err))?;
            games::typing::run(arcade, config)
        }
        "flappy" => {
            no_options("Flappy")?;
            games::flappy::run(arcade)
        }
        "mole" => {
            no_options("Mole mash")?;
            games::mole::run(arcade)
        }
        "quick-click" => {
            no_options("Quick click")?;
            games::quick_click::run(arcade)
        }
        "target-tap" => {
            no_options("Target tap")?;
            games::target_tap::run(arcade)
        }
        _ => bail!("Unknown game '{name}'. Run with --help."),
    }
}

fn interactive_menu(arcade: &ArcadeConfig) -> Result<()>
{
    let registry = games::registry();
    println!("Terminal Arcade");
    println!();
    println!("Playing as {}. Select a game:", arcade.player_name);
    for (idx, game) in registry.iter().enumerate() {
        println!("  {}. {} - {}", idx + 1, game.name, game.description);
    }
    println!();
    print!("Enter number or name (default 1, q to quit): ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let choice = input.trim();

    if choice.is_empty() {
        return run_game(arcade, registry[0].name, &[]);
    }
    if choice.eq_ignore_ascii_case("q") {
        return Ok(());
    }
    if let Ok(index) = choice.parse::<usize>() {
        if index >= 1 && index <= registry.len() {
            return run_game(arcade, registry[index - 1].name, &[]);
        }
    }
    if let Some(game) = games::find(choice) {
        return run_game(arcade, game.name, &[]);
    }

    bail!("Invalid selection.")
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<12} - {}", game.name, game.description);
    }
}

fn show_scores(arcade: &ArcadeConfig, only: Option<&str>) -> Result<()>
{
    let selected: Vec<_> = match only {
        Some(name) => vec![games::find(name).ok_or_else(|| anyhow!("Unknown game '{name}'"))?],
        None => games::registry(),
    };
    for game in selected {
        println!("{} ({})", game.name, game.unit);
        let entries = games::leaderboard_for(arcade, &game).top()?;
        for line in leaderboard::format_table(&entries) {
            println!("{line}");
        }
        println!();
    }
    Ok(())
}

fn print_help()
{
    println!("term-arcade");
    println!("\nUsage:");
    println!("  term-arcade [--name=NAME]");
    println!("  term-arcade list");
    println!("  term-arcade scores [game]");
    println!("  term-arcade maze [--size=7x11] [--levels=5]");
    println!("  term-arcade typing [--wpm=20]");
    println!("  term-arcade flappy | mole | quick-click | target-tap");
    println!("\nNotes:");
    println!("  Scores are kept in $ARCADE_DATA_DIR (default ~/.local/share/term-arcade).");
    println!("  Set ARCADE_PLAYER to pick a default name, ARCADE_LOG=debug to write arcade.log.");
}
