use super::targets;
use crate::{
    battle::{Battle, SkillId},
    host::{Audio, Stage},
    interpreter::{ActionContext, ActionPack, Signal},
    script::{parse_int, Command},
};
use once_cell::sync::Lazy;
use regex::Regex;

static SKILL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^SKILL\s+(\d+)\s+COOLDOWN$").unwrap());
static STYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:SKILL\s+TYPE|STYPE)\s+(\d+)\s+COOLDOWN$").unwrap());

/// Cooldown adjustments from within a sequence, e.g.
/// `SKILL 10 COOLDOWN: targets, +2`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CooldownPack;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Scope {
    Global,
    Skill(SkillId),
    SkillType(u32),
}

/// A signed value adds to the cooldown, an unsigned one replaces it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Change {
    Add(i32),
    Set(i32),
}

impl Change {
    fn parse(arg: &str) -> Option<Self> {
        let arg = arg.trim();
        let value = parse_int(arg)?;
        if arg.starts_with(['+', '-']) {
            Some(Change::Add(value))
        } else {
            Some(Change::Set(value))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct CooldownAction {
    scope: Scope,
    target: Option<String>,
    change: Option<Change>,
}

impl CooldownAction {
    fn parse(command: &Command) -> Option<Self> {
        let name = command.name.as_str();
        let scope = if name == "GLOBAL COOLDOWN" {
            Scope::Global
        } else if let Some(c) = SKILL.captures(name) {
            Scope::Skill(c[1].parse().ok()?)
        } else if let Some(c) = STYPE.captures(name) {
            Scope::SkillType(c[1].parse().ok()?)
        } else {
            return None;
        };

        Some(Self {
            scope,
            target: command.arg(0).map(str::to_string),
            change: command.arg(1).and_then(Change::parse),
        })
    }
}

impl<S: Stage, A: Audio> ActionPack<S, A> for CooldownPack {
    fn name(&self) -> &'static str {
        "cooldown"
    }

    fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Option<Signal> {
        let action = CooldownAction::parse(command)?;
        perform(action, battle, context);
        Some(Signal::Continue)
    }
}

fn perform<S: Stage, A: Audio>(
    action: CooldownAction,
    battle: &mut Battle<S, A>,
    context: &mut ActionContext,
) {
    let Some(change) = action.change else {
        return;
    };

    for target in targets(battle, context, action.target.as_deref()) {
        let skill_ids: Vec<SkillId> = match action.scope {
            Scope::Skill(id) => vec![id],
            Scope::Global => battle.known_skills(target).iter().map(|s| s.id).collect(),
            Scope::SkillType(stype_id) => battle
                .known_skills(target)
                .iter()
                .filter(|s| s.stype_id == stype_id)
                .map(|s| s.id)
                .collect(),
        };

        for id in skill_ids {
            let Some(skill) = battle.database.skill(id) else {
                continue;
            };
            match change {
                Change::Add(value) => {
                    battle
                        .cooldowns
                        .add_cooldown(target, skill, value, &battle.settings)
                }
                Change::Set(value) => {
                    battle
                        .cooldowns
                        .set_cooldown(target, skill, value, &battle.settings)
                }
            }
        }
    }
}
