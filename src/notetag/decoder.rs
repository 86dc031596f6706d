use super::*;
use crate::cooldown;
use encoding_rs::UTF_8;
use encoding_rs_io::DecodeReaderBytesBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fmt,
    io::{Error as IoError, Read},
};
use tracing::{debug, warn};

static OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<\s*(setup|whole|target|follow|finish)(?:\s+action)?\s*>$").unwrap()
});
static CLOSE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^</\s*(setup|whole|target|follow|finish)(?:\s+action)?\s*>$").unwrap()
});
static ACTION_COPY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<action copy:\s*(skill|item)\s*:\s*(\d+)\s*>").unwrap());

#[derive(Debug)]
pub enum DecodeError {
    IoError(IoError),
}

impl std::error::Error for DecodeError {}

impl From<IoError> for DecodeError {
    fn from(error: IoError) -> Self {
        DecodeError::IoError(error)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

/// Decodes the notes field of a skill or item.
///
/// Input is read as UTF-8; a byte order mark, if present, selects the
/// encoding instead.
#[derive(Debug)]
pub struct Decoder<R>
where
    R: Read,
{
    reader: R,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Decoder { reader }
    }

    pub fn decode(&mut self) -> Result<Notes, DecodeError> {
        let mut reader = DecodeReaderBytesBuilder::new()
            .encoding(Some(UTF_8))
            .build(&mut self.reader);

        let mut buffer = String::new();
        reader.read_to_string(&mut buffer)?;

        Ok(parse(&buffer))
    }
}

fn phase_from_tag(tag: &str) -> Option<Phase> {
    Phase::ALL
        .into_iter()
        .find(|p| p.tag().eq_ignore_ascii_case(tag))
}

fn parse(text: &str) -> Notes {
    let mut notes = Notes::default();
    let mut block: Option<(Phase, Vec<String>)> = None;

    for line in text.lines() {
        let line = line.trim();

        if let Some((phase, lines)) = block.as_mut() {
            let phase = *phase;
            let closes = CLOSE_TAG
                .captures(line)
                .and_then(|c| phase_from_tag(&c[1]))
                .is_some_and(|p| p == phase);
            if !closes {
                if !line.is_empty() {
                    lines.push(line.to_string());
                }
                continue;
            }
            if let Some((_, lines)) = block.take() {
                notes.declare(phase, Script::new(lines));
            }
            continue;
        }

        if let Some(phase) = OPEN_TAG.captures(line).and_then(|c| phase_from_tag(&c[1])) {
            block = Some((phase, Vec::new()));
            continue;
        }

        if let Some(captures) = ACTION_COPY.captures(line) {
            if let Ok(id) = captures[2].parse() {
                notes.copy = Some(if captures[1].eq_ignore_ascii_case("skill") {
                    ItemRef::Skill(id)
                } else {
                    ItemRef::Item(id)
                });
                debug!("notes copy their action sequence from {:?}", notes.copy);
            }
            continue;
        }

        cooldown::decode_line(line, &mut notes.cooldown);
    }

    if let Some((phase, lines)) = block {
        warn!("<{} action> block is never closed, using it up to the end of the notes", phase);
        notes.declare(phase, Script::new(lines));
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn decode(text: &str) -> Notes {
        Decoder::new(Cursor::new(text.as_bytes().to_vec()))
            .decode()
            .unwrap()
    }

    #[test]
    fn test_decode_blocks() {
        let notes = decode(
            "Fire damage.\n\
             <setup action>\n\
             display action\n\
             \n\
             camera focus: user, front base, 30\n\
             </setup action>\n\
             <Target Action>\n\
             action animation: target\n\
             wait for animation\n\
             </target action>\n",
        );

        assert_eq!(
            notes.sequence.setup,
            Script::new(vec![
                "display action".to_string(),
                "camera focus: user, front base, 30".to_string()
            ])
        );
        assert_eq!(notes.sequence.target.len(), 2);
        assert_eq!(notes.declared, vec![Phase::Setup, Phase::Target]);
        // Undeclared phases keep the default scripts.
        assert_eq!(notes.sequence.finish, ActionSequence::default().finish);
    }

    #[test]
    fn test_decode_short_tags_and_crlf() {
        let notes = decode("<follow>\r\nwait: 10\r\n</follow>\r\n");
        assert_eq!(notes.sequence.follow, Script::new(vec!["wait: 10".to_string()]));
    }

    #[test]
    fn test_decode_action_copy() {
        let notes = decode("<action copy: item:12>");
        assert_eq!(notes.copy, Some(ItemRef::Item(12)));

        let notes = decode("<Action Copy: Skill: 3>");
        assert_eq!(notes.copy, Some(ItemRef::Skill(3)));
    }

    #[test]
    fn test_decode_unclosed_block_runs_to_end() {
        let notes = decode("<whole action>\nflash screen: white\nshake screen");
        assert_eq!(notes.sequence.whole.len(), 2);
    }

    #[test]
    fn test_decode_strips_byte_order_mark() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<setup>\nwait: 5\n</setup>");
        let notes = Decoder::new(Cursor::new(bytes)).decode().unwrap();
        assert_eq!(notes.declared, vec![Phase::Setup]);
    }

    #[test]
    fn test_decode_cooldown_lines_outside_blocks() {
        let notes = decode("<cooldown: 3>\n<setup action>\n<cooldown: 9>\n</setup action>");
        assert_eq!(notes.cooldown.cooldown, Some(3));
        assert_eq!(notes.sequence.setup.len(), 1);
    }
}
