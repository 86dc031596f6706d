mod decoder;

use crate::{cooldown::CooldownRules, script::Script};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use decoder::{DecodeError, Decoder};

/// The five phases of an action, in the order they run.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Phase {
    Setup,
    Whole,
    Target,
    Follow,
    Finish,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Setup,
        Phase::Whole,
        Phase::Target,
        Phase::Follow,
        Phase::Finish,
    ];

    /// The word used in the phase's note block tags, e.g. `<setup action>`.
    pub fn tag(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Whole => "whole",
            Phase::Target => "target",
            Phase::Follow => "follow",
            Phase::Finish => "finish",
        }
    }

    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Setup => Some(Phase::Whole),
            Phase::Whole => Some(Phase::Target),
            Phase::Target => Some(Phase::Follow),
            Phase::Follow => Some(Phase::Finish),
            Phase::Finish => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A reference to a skill or item in the database.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ItemRef {
    Skill(u32),
    Item(u32),
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Skill(id) => write!(f, "skill {}", id),
            ItemRef::Item(id) => write!(f, "item {}", id),
        }
    }
}

/// The scripts of all five phases of one skill or item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionSequence {
    pub setup: Script,
    pub whole: Script,
    pub target: Script,
    pub follow: Script,
    pub finish: Script,
}

impl ActionSequence {
    pub fn phase(&self, phase: Phase) -> &Script {
        match phase {
            Phase::Setup => &self.setup,
            Phase::Whole => &self.whole,
            Phase::Target => &self.target,
            Phase::Follow => &self.follow,
            Phase::Finish => &self.finish,
        }
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut Script {
        match phase {
            Phase::Setup => &mut self.setup,
            Phase::Whole => &mut self.whole,
            Phase::Target => &mut self.target,
            Phase::Follow => &mut self.follow,
            Phase::Finish => &mut self.finish,
        }
    }
}

impl Default for ActionSequence {
    /// The sequence used by skills and items whose notes declare no blocks.
    fn default() -> Self {
        let script = |lines: &[&str]| lines.iter().copied().collect::<Script>();

        Self {
            setup: script(&[
                "display action",
                "immortal: targets, true",
                "perform start",
                "wait for movement",
                "cast animation",
                "wait for animation",
            ]),
            whole: Script::default(),
            target: script(&[
                "perform action",
                "action animation",
                "wait for animation",
                "action effect",
                "death break",
            ]),
            follow: Script::default(),
            finish: script(&[
                "immortal: targets, false",
                "wait for new line",
                "clear battle log",
                "perform finish",
                "wait for movement",
                "wait for effect",
            ]),
        }
    }
}

/// Everything the decoder extracts from a notes field.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Notes {
    /// Phase blocks found in the notes. Phases without a block keep the
    /// default script.
    pub sequence: ActionSequence,
    /// Phases that were declared by a block.
    pub declared: Vec<Phase>,
    /// Another skill or item whose sequence replaces this one's.
    pub copy: Option<ItemRef>,
    pub cooldown: CooldownRules,
}

impl Notes {
    pub(crate) fn declare(&mut self, phase: Phase, script: Script) {
        *self.sequence.phase_mut(phase) = script;
        if !self.declared.contains(&phase) {
            self.declared.push(phase);
        }
    }
}
