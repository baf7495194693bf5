use std::env;
use std::path::PathBuf;

const DEFAULT_PLAYER: &str = "player";
const MAX_NAME_LEN: usize = 16;

/// Settings shared by every game: where scores live and who is playing.
#[derive(Clone, Debug)]
pub struct ArcadeConfig
{
    pub data_dir: PathBuf,
    pub player_name: String,
}

impl ArcadeConfig
{
    /// Reads `ARCADE_DATA_DIR` and `ARCADE_PLAYER`/`USER`, then lets a
    /// `--name=` flag in `args` win. The flag is removed from `args`.
    pub fn from_env(args: &mut Vec<String>) -> Result<Self, String>
    {
        let data_dir = env::var_os("ARCADE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut player_name = env::var("ARCADE_PLAYER")
            .or_else(|_| env::var("USER"))
            .unwrap_or_else(|_| DEFAULT_PLAYER.to_string());

        let mut index = 0;
        while index < args.len() {
            if args[index] == "--name" {
                let value = args
                    .get(index + 1)
                    .cloned()
                    .ok_or_else(|| "Expected value after --name".to_string())?;
                player_name = value;
                args.drain(index..index + 2);
            } else if let Some(rest) = args[index].strip_prefix("--name=") {
                player_name = rest.to_string();
                args.remove(index);
            } else {
                index += 1;
            }
        }

        Ok(Self {
            data_dir,
            player_name: sanitize_name(&player_name),
        })
    }
}

fn default_data_dir() -> PathBuf
{
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local/share/term-arcade"),
        None => PathBuf::from(".term-arcade"),
    }
}

fn sanitize_name(raw: &str) -> String
{
    let name: String = raw
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '-' || *ch == '_')
        .take(MAX_NAME_LEN)
        .collect();
    if name.is_empty() {
        DEFAULT_PLAYER.to_string()
    } else {
        name
    }
}

/// Parses the value of a `--flag=value` or `--flag value` pair.
pub fn flag_value<'a>(
    arg: &'a str,
    flag: &str,
    iter: &mut impl Iterator<Item = &'a String>,
) -> Result<Option<&'a str>, String>
{
    if arg == flag {
        return iter
            .next()
            .map(|value| Some(value.as_str()))
            .ok_or_else(|| format!("Expected value after {flag}"));
    }
    Ok(arg
        .strip_prefix(flag)
        .and_then(|rest| rest.strip_prefix('=')))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn name_flag_overrides_and_is_consumed()
    {
        let mut args = vec![
            "--levels=2".to_string(),
            "--name=ada".to_string(),
        ];
        let config = ArcadeConfig::from_env(&mut args).unwrap();
        assert_eq!(config.player_name, "ada");
        assert_eq!(args, vec!["--levels=2".to_string()]);
    }

    #[test]
    fn split_name_flag_is_consumed()
    {
        let mut args = vec!["--name".to_string(), "grace".to_string()];
        let config = ArcadeConfig::from_env(&mut args).unwrap();
        assert_eq!(config.player_name, "grace");
        assert!(args.is_empty());
    }

    #[test]
    fn missing_name_value_is_an_error()
    {
        let mut args = vec!["--name".to_string()];
        assert!(ArcadeConfig::from_env(&mut args).is_err());
    }

    #[test]
    fn names_are_trimmed_to_safe_characters()
    {
        assert_eq!(sanitize_name("a b/c"), "abc");
        assert_eq!(sanitize_name("   "), DEFAULT_PLAYER);
        assert_eq!(sanitize_name(&"x".repeat(40)).len(), MAX_NAME_LEN);
    }

    #[test]
    fn flag_value_handles_both_forms()
    {
        let rest = vec!["9".to_string()];
        let mut iter = rest.iter();
        assert_eq!(flag_value("--levels", "--levels", &mut iter), Ok(Some("9")));
        let none: Vec<String> = Vec::new();
        let mut empty = none.iter();
        assert_eq!(flag_value("--levels=3", "--levels", &mut empty), Ok(Some("3")));
        assert_eq!(flag_value("--other", "--levels", &mut empty), Ok(None));
        assert!(flag_value("--levels", "--levels", &mut empty).is_err());
    }
}
