//! REPL command parsing and status formatting.

use audio_deck_types::RepeatMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Play(String),
    Add(String),
    Pause,
    Resume,
    Skip,
    Stop,
    Clear,
    Repeat(RepeatMode),
    Shuffle(ShuffleArg),
    Status,
    Queue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleArg {
    On,
    Off,
    Toggle,
}

/// `off|one|track|all`; `track` is a synonym for `one`.
pub fn parse_repeat(value: &str) -> Result<RepeatMode, String> {
    match value {
        "off" => Ok(RepeatMode::None),
        "one" | "track" => Ok(RepeatMode::One),
        "all" => Ok(RepeatMode::All),
        other => Err(format!("invalid repeat mode {other:?} (off|one|track|all)")),
    }
}

pub fn parse_shuffle(value: &str) -> Result<ShuffleArg, String> {
    match value {
        "on" => Ok(ShuffleArg::On),
        "off" => Ok(ShuffleArg::Off),
        "toggle" => Ok(ShuffleArg::Toggle),
        other => Err(format!("invalid shuffle argument {other:?} (on|off|toggle)")),
    }
}

/// Parse one REPL line; `Ok(None)` for blank input.
pub fn parse_line(line: &str) -> Result<Option<CliCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word {
        "play" if !rest.is_empty() => CliCommand::Play(rest.to_string()),
        "play" => return Err("usage: play <file|url>".to_string()),
        "add" if !rest.is_empty() => CliCommand::Add(rest.to_string()),
        "add" => return Err("usage: add <file|url>".to_string()),
        "pause" => CliCommand::Pause,
        "resume" => CliCommand::Resume,
        "skip" | "next" => CliCommand::Skip,
        "stop" => CliCommand::Stop,
        "clear" => CliCommand::Clear,
        "repeat" => CliCommand::Repeat(parse_repeat(rest)?),
        "shuffle" => CliCommand::Shuffle(parse_shuffle(rest)?),
        "status" => CliCommand::Status,
        "queue" => CliCommand::Queue,
        "quit" | "exit" => CliCommand::Quit,
        other => return Err(format!("unknown command {other:?}")),
    };
    Ok(Some(command))
}

/// `mm:ss`, minutes unbounded.
pub fn format_elapsed(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

pub fn repeat_label(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::None => "off",
        RepeatMode::One => "one",
        RepeatMode::All => "all",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_strings_round_trip() {
        assert_eq!(parse_repeat("off").unwrap(), RepeatMode::None);
        assert_eq!(parse_repeat("one").unwrap(), RepeatMode::One);
        assert_eq!(parse_repeat("track").unwrap(), RepeatMode::One);
        assert_eq!(parse_repeat("all").unwrap(), RepeatMode::All);
        assert!(parse_repeat("loop").is_err());
        assert!(parse_repeat("").is_err());
    }

    #[test]
    fn shuffle_strings_round_trip() {
        assert_eq!(parse_shuffle("on").unwrap(), ShuffleArg::On);
        assert_eq!(parse_shuffle("off").unwrap(), ShuffleArg::Off);
        assert_eq!(parse_shuffle("toggle").unwrap(), ShuffleArg::Toggle);
        assert!(parse_shuffle("maybe").is_err());
    }

    #[test]
    fn lines_parse_into_commands() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(
            parse_line("play /music/a.flac").unwrap(),
            Some(CliCommand::Play("/music/a.flac".to_string()))
        );
        assert_eq!(
            parse_line("add https://x/y").unwrap(),
            Some(CliCommand::Add("https://x/y".to_string()))
        );
        assert_eq!(parse_line("pause").unwrap(), Some(CliCommand::Pause));
        assert_eq!(parse_line("next").unwrap(), Some(CliCommand::Skip));
        assert_eq!(
            parse_line("repeat track").unwrap(),
            Some(CliCommand::Repeat(RepeatMode::One))
        );
        assert_eq!(
            parse_line("shuffle toggle").unwrap(),
            Some(CliCommand::Shuffle(ShuffleArg::Toggle))
        );
        assert!(parse_line("play").is_err());
        assert!(parse_line("repeat forever").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn elapsed_formats_as_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(999), "00:00");
        assert_eq!(format_elapsed(65_000), "01:05");
        assert_eq!(format_elapsed(3_661_000), "61:01");
    }
}
