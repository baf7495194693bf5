pub const WORDS: &[&str] = &[
    "alpha", "amber", "arcade", "arrow", "badge", "block", "bonus", "brave", "cable", "candy",
    "chase", "clock", "combo", "coral", "crane", "dash", "delta", "drift", "eagle", "echo",
    "ember", "flash", "flint", "frost", "gamer", "ghost", "glide", "grape", "hatch", "hover",
    "jolly", "joust", "karma", "knack", "laser", "lemon", "level", "lucky", "maze", "metro",
    "mole", "noble", "ocean", "orbit", "pixel", "plaza", "prism", "quest", "quick", "radar",
    "rally", "retro", "robin", "score", "shift", "sonic", "spark", "speed", "sprite", "swift",
    "tango", "tempo", "token", "tower", "turbo", "ultra", "vapor", "vivid", "wander", "whirl",
    "yield", "zebra", "zesty", "zone",
];

pub const BONUS_WORDS: &[&str] = &[
    "constellation", "labyrinthine", "extraordinary", "kaleidoscope", "championship",
    "breakthrough", "spectacular",
];

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn words_are_lowercase_ascii()
    {
        for word in WORDS.iter().chain(BONUS_WORDS) {
            assert!(!word.is_empty());
            assert!(word.chars().all(|ch| ch.is_ascii_lowercase()), "{word}");
        }
    }
}
