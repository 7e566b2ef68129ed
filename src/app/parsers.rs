use std::path::PathBuf;

use crate::error::ParseError;
use crate::worker::{MusicCommand, Tracks};

pub const HELP: &str = "\
add <path>...                     load files, each named by its path
remove [name...]                  remove names (all when none given)
rename <old> <new>                add an alias for a track
play|pause|stop [name...]         control tracks (all when none given)
volume <0..1> [name...]           set volume
fade-in <ms> [name...] [--to v]   fade in to v (or the track's volume)
fade-out <ms> [name...] [--to v]  fade out to v (or silence)
list                              show tracks
help | quit";

/// Parses one line of the control language.
pub fn parse_command(line: &str) -> Result<MusicCommand, ParseError> {
    let tokens = tokenize(line);
    let Some((head, args)) = tokens.split_first() else {
        return Err(ParseError::Empty);
    };
    let args = args.to_vec();

    match head.as_str() {
        "add" => {
            if args.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "add",
                    what: "path",
                });
            }
            Ok(MusicCommand::Add {
                paths: args.into_iter().map(PathBuf::from).collect(),
            })
        }
        "remove" | "rm" => Ok(MusicCommand::Remove {
            tracks: Tracks::from_names(args),
        }),
        "rename" | "alias" => {
            let mut it = args.into_iter();
            let old = it.next().ok_or(ParseError::MissingArgument {
                command: "rename",
                what: "old",
            })?;
            let new = it.next().ok_or(ParseError::MissingArgument {
                command: "rename",
                what: "new",
            })?;
            Ok(MusicCommand::Rename { old, new })
        }
        "play" => Ok(MusicCommand::Play {
            tracks: Tracks::from_names(args),
        }),
        "pause" => Ok(MusicCommand::Pause {
            tracks: Tracks::from_names(args),
        }),
        "stop" => Ok(MusicCommand::Stop {
            tracks: Tracks::from_names(args),
        }),
        "volume" | "vol" => {
            let (first, rest) = split_required(args, "volume", "volume")?;
            let volume = parse_f32("volume", &first)?;
            Ok(MusicCommand::SetVolume {
                volume,
                tracks: Tracks::from_names(rest),
            })
        }
        "fade-in" | "fadein" => {
            let (duration_ms, volume, names) = parse_fade("fade-in", args)?;
            Ok(MusicCommand::FadeIn {
                duration_ms,
                volume,
                tracks: Tracks::from_names(names),
            })
        }
        "fade-out" | "fadeout" => {
            let (duration_ms, volume, names) = parse_fade("fade-out", args)?;
            Ok(MusicCommand::FadeOut {
                duration_ms,
                volume,
                tracks: Tracks::from_names(names),
            })
        }
        "list" | "ls" => Ok(MusicCommand::ListTracks),
        other => Err(ParseError::UnknownCommand(other.to_owned())),
    }
}

fn parse_fade(
    command: &'static str,
    args: Vec<String>,
) -> Result<(u64, Option<f32>, Vec<String>), ParseError> {
    let (first, rest) = split_required(args, command, "ms")?;
    let duration_ms = first
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidNumber {
            command,
            value: first.clone(),
        })?;

    let mut volume = None;
    let mut names = Vec::new();
    let mut it = rest.into_iter();
    while let Some(arg) = it.next() {
        if arg == "--to" {
            let v = it.next().ok_or(ParseError::MissingArgument {
                command,
                what: "--to",
            })?;
            volume = Some(parse_f32(command, &v)?);
        } else {
            names.push(arg);
        }
    }
    Ok((duration_ms, volume, names))
}

fn split_required(
    args: Vec<String>,
    command: &'static str,
    what: &'static str,
) -> Result<(String, Vec<String>), ParseError> {
    let mut it = args.into_iter();
    let first = it
        .next()
        .ok_or(ParseError::MissingArgument { command, what })?;
    Ok((first, it.collect()))
}

fn parse_f32(command: &'static str, value: &str) -> Result<f32, ParseError> {
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber {
            command,
            value: value.to_owned(),
        })
}

/// Splits on whitespace; double quotes group a token containing spaces.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"add "my music/a b.ogg"  c.ogg"#),
            vec!["add", "my music/a b.ogg", "c.ogg"]
        );
        assert_eq!(tokenize(r#"rename a """#), vec!["rename", "a", ""]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_no_names_means_all() {
        let cmd = parse_command("play").expect("parse");
        assert!(matches!(cmd, MusicCommand::Play { tracks: Tracks::All }));

        let cmd = parse_command("pause drums bass").expect("parse");
        let MusicCommand::Pause {
            tracks: Tracks::Named(names),
        } = cmd
        else {
            panic!("expected named pause");
        };
        assert_eq!(names, vec!["drums", "bass"]);
    }

    #[test]
    fn test_fade_with_target() {
        let cmd = parse_command("fade-out 1500 strings --to 0.2").expect("parse");
        let MusicCommand::FadeOut {
            duration_ms,
            volume,
            tracks,
        } = cmd
        else {
            panic!("expected fade-out");
        };
        assert_eq!(duration_ms, 1500);
        assert_eq!(volume, Some(0.2));
        assert_eq!(tracks, Tracks::named(["strings"]));
    }

    #[test]
    fn test_fade_in_all_without_target() {
        let cmd = parse_command("fade-in 300").expect("parse");
        assert!(matches!(
            cmd,
            MusicCommand::FadeIn {
                duration_ms: 300,
                volume: None,
                tracks: Tracks::All
            }
        ));
    }

    #[test]
    fn test_volume_and_rename() {
        let cmd = parse_command("volume 0.5 lead").expect("parse");
        assert!(matches!(cmd, MusicCommand::SetVolume { volume, .. } if volume == 0.5));

        let cmd = parse_command("rename music/a.ogg calm").expect("parse");
        assert!(matches!(cmd, MusicCommand::Rename { ref old, ref new } if old == "music/a.ogg" && new == "calm"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("").unwrap_err(), ParseError::Empty);
        assert_eq!(
            parse_command("jump").unwrap_err(),
            ParseError::UnknownCommand("jump".to_owned())
        );
        assert_eq!(
            parse_command("add").unwrap_err(),
            ParseError::MissingArgument {
                command: "add",
                what: "path"
            }
        );
        assert_eq!(
            parse_command("volume loud").unwrap_err(),
            ParseError::InvalidNumber {
                command: "volume",
                value: "loud".to_owned()
            }
        );
        assert!(parse_command("fade-in 100 --to").is_err());
        assert!(parse_command("volume NaN").is_err());
        assert!(parse_command("rename only-old").is_err());
    }
}
