//! Line commands accepted by the demo binary

use crate::error::Result;
use crate::playback::intent::Intent;
use crate::playback::types::PlaybackSpeed;
use abk_common::Error as CommonError;

pub const HELP: &str = "commands: play | pause | next | prev | fwd [secs] | back [secs] | \
rate [factor] | seek <secs> | title <text> | reader on|off | dismiss | state | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Queue these intents in order
    Dispatch(Vec<Intent>),
    /// Print the latest snapshot
    State,
    Help,
    Quit,
}

impl Command {
    /// Parse one text command line
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "play" => Command::Dispatch(vec![Intent::Play]),
            "pause" | "stop" => Command::Dispatch(vec![Intent::Pause]),
            "next" => Command::Dispatch(vec![Intent::SkipNext]),
            "prev" => Command::Dispatch(vec![Intent::SkipPrev]),
            "fwd" => Command::Dispatch(vec![match rest {
                "" => Intent::jump_forward(),
                secs => Intent::JumpForward {
                    delta: parse_seconds(secs)?,
                },
            }]),
            "back" => Command::Dispatch(vec![match rest {
                "" => Intent::jump_backward(),
                secs => Intent::JumpBackward {
                    delta: parse_seconds(secs)?,
                },
            }]),
            "rate" => Command::Dispatch(vec![match rest {
                "" => Intent::ChangeRateNext,
                factor => Intent::SetRate {
                    rate: parse_rate(factor)?,
                },
            }]),
            "seek" => {
                let time = parse_seconds(rest)?;
                Command::Dispatch(vec![
                    Intent::BeginSeek,
                    Intent::SeekTo { time },
                    Intent::EndSeek,
                ])
            }
            "title" => Command::Dispatch(vec![Intent::TitleChanged {
                text: rest.to_string(),
            }]),
            "reader" => {
                let enabled = match rest {
                    "on" => true,
                    "off" => false,
                    other => {
                        let message = format!("reader expects on|off, got '{}'", other);
                        return Err(CommonError::InvalidInput(message).into());
                    }
                };
                Command::Dispatch(vec![Intent::ToggleReaderPanel { enabled }])
            }
            "dismiss" => Command::Dispatch(vec![Intent::DismissAlert]),
            "state" => Command::State,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => return Err(CommonError::InvalidInput("empty command".to_string()).into()),
            other => {
                let message = format!("unknown command '{}'", other);
                return Err(CommonError::InvalidInput(message).into());
            }
        };
        Ok(command)
    }

    /// Parse one JSON intent line, e.g. `{"intent": "seek_to", "time": 3.0}`
    pub fn parse_json(line: &str) -> Result<Self> {
        let intent: Intent = serde_json::from_str(line.trim())
            .map_err(|e| CommonError::InvalidInput(format!("invalid intent: {}", e)))?;
        if intent.is_transport_feedback() {
            let message = "transport intents cannot be sent from input".to_string();
            return Err(CommonError::InvalidInput(message).into());
        }
        Ok(Command::Dispatch(vec![intent]))
    }
}

fn parse_seconds(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite())
        .ok_or_else(|| {
            CommonError::InvalidInput(format!("'{}' is not a number of seconds", text)).into()
        })
}

fn parse_rate(text: &str) -> Result<PlaybackSpeed> {
    let factor = text
        .trim_start_matches('x')
        .parse::<f32>()
        .map_err(|_| CommonError::InvalidInput(format!("'{}' is not a speed factor", text)))?;
    PlaybackSpeed::try_from(factor).map_err(|e| CommonError::InvalidInput(e).into())
}
