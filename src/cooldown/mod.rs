mod decoder;

use crate::{
    battle::{BattlerId, SkillId},
    database::{Database, UsableItem},
    settings::Settings,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

pub(crate) use decoder::decode_line;

/// Cooldown behaviour declared in a skill's or item's notes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CooldownRules {
    /// Turns the skill itself goes on cooldown for after use.
    pub cooldown: Option<i32>,
    /// Cooldowns the user's other skills go on after use, by skill id.
    pub skill_cooldown: IndexMap<SkillId, i32>,
    /// Cooldowns the user's skills of a type go on after use, by skill type.
    pub stype_cooldown: IndexMap<u32, i32>,
    /// Cooldown every skill of the user goes on after use.
    pub global_cooldown: i32,
    /// Turns the skill is locked for at the start of a battle.
    pub warmup: i32,
    pub bypass: bool,
    /// Map steps per cooldown turn outside battle.
    pub steps: Option<u32>,
    /// Turns added to the skill's cooldown when a battle ends.
    pub after_battle: Option<i32>,
    /// Cooldown changes for those affected by the skill or item, by skill
    /// id.
    pub skill_change: IndexMap<SkillId, i32>,
    /// Cooldown changes for those affected, by skill type.
    pub stype_change: IndexMap<u32, i32>,
    /// Cooldown change to every skill of those affected.
    pub global_change: i32,
}

/// Remaining cooldown and warmup turns per skill of one battler.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Timers {
    pub cooldown: IndexMap<SkillId, i32>,
    pub warmup: IndexMap<SkillId, i32>,
}

/// Cooldown and warmup counters for every battler. A skill is usable only
/// while both of its counters are at or below zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CooldownLedger(IndexMap<BattlerId, Timers>);

impl CooldownLedger {
    pub fn timers(&self, battler: BattlerId) -> Option<&Timers> {
        self.0.get(&battler)
    }

    pub fn cooldown(&self, battler: BattlerId, skill: SkillId) -> i32 {
        self.timers(battler)
            .and_then(|t| t.cooldown.get(&skill))
            .copied()
            .unwrap_or(0)
    }

    pub fn warmup(&self, battler: BattlerId, skill: SkillId) -> i32 {
        self.timers(battler)
            .and_then(|t| t.warmup.get(&skill))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_ready(&self, battler: BattlerId, skill: SkillId) -> bool {
        self.cooldown(battler, skill) <= 0 && self.warmup(battler, skill) <= 0
    }

    /// Overwrites a cooldown. Bypassing skills are left alone.
    pub fn set_cooldown(
        &mut self,
        battler: BattlerId,
        skill: &UsableItem,
        value: i32,
        settings: &Settings,
    ) {
        if bypasses(skill, settings) {
            return;
        }
        trace!("{} skill {} cooldown set to {}", battler, skill.id, value);
        self.entry(battler).cooldown.insert(skill.id, value);
    }

    /// Adds to a cooldown. Bypassing skills are left alone.
    pub fn add_cooldown(
        &mut self,
        battler: BattlerId,
        skill: &UsableItem,
        value: i32,
        settings: &Settings,
    ) {
        let current = self.cooldown(battler, skill.id);
        self.set_cooldown(battler, skill, current.saturating_add(value), settings);
    }

    /// Raises a cooldown to `value` if it is lower.
    pub fn raise_cooldown(
        &mut self,
        battler: BattlerId,
        skill: &UsableItem,
        value: i32,
        settings: &Settings,
    ) {
        let value = value.max(self.cooldown(battler, skill.id));
        self.set_cooldown(battler, skill, value, settings);
    }

    /// Locks each of the battler's skills for its warmup.
    pub fn start_warmups(
        &mut self,
        battler: BattlerId,
        skills: &[&UsableItem],
        settings: &Settings,
    ) {
        for skill in skills {
            if bypasses(skill, settings) {
                continue;
            }
            self.entry(battler)
                .warmup
                .insert(skill.id, skill.cooldown().warmup);
        }
    }

    /// Applies the cooldown costs of using `used`: the global cooldown on
    /// every known skill, then skill type cooldowns, then per-skill ones.
    /// Each only ever raises a counter.
    pub fn pay(
        &mut self,
        battler: BattlerId,
        used: &UsableItem,
        known: &[&UsableItem],
        database: &Database,
        settings: &Settings,
    ) {
        let rules = used.cooldown();

        for skill in known {
            self.raise_cooldown(battler, skill, rules.global_cooldown, settings);
        }

        for (&stype_id, &value) in &rules.stype_cooldown {
            for skill in known.iter().filter(|s| s.stype_id == stype_id) {
                self.raise_cooldown(battler, skill, value, settings);
            }
        }

        let own = rules.cooldown.map(|value| (used.id, value));
        let others = rules.skill_cooldown.iter().map(|(&k, &v)| (k, v));
        for (skill_id, value) in own.into_iter().chain(others) {
            if let Some(skill) = database.skill(skill_id) {
                self.raise_cooldown(battler, skill, value, settings);
            }
        }

        let value = self.cooldown(battler, used.id).max(0);
        self.set_cooldown(battler, used, value, settings);
    }

    /// Applies the cooldown changes `source` carries to a battler it
    /// affects. Changes add to the counters.
    pub fn apply_changes(
        &mut self,
        battler: BattlerId,
        source: &UsableItem,
        known: &[&UsableItem],
        database: &Database,
        settings: &Settings,
    ) {
        let rules = source.cooldown();

        if rules.global_change != 0 {
            for skill in known {
                self.add_cooldown(battler, skill, rules.global_change, settings);
            }
        }

        for (&stype_id, &value) in &rules.stype_change {
            for skill in known.iter().filter(|s| s.stype_id == stype_id) {
                self.add_cooldown(battler, skill, value, settings);
            }
        }

        for (&skill_id, &value) in &rules.skill_change {
            if let Some(skill) = database.skill(skill_id) {
                self.add_cooldown(battler, skill, value, settings);
            }
        }
    }

    /// Counts down every cooldown and warmup of a battler by one turn.
    pub fn update_turn(&mut self, battler: BattlerId) {
        if let Some(timers) = self.0.get_mut(&battler) {
            for value in timers.cooldown.values_mut().chain(timers.warmup.values_mut()) {
                *value -= 1;
            }
        }
    }

    /// Counts down cooldowns of skills whose step interval divides the
    /// party's total `steps`.
    pub fn update_steps(
        &mut self,
        battler: BattlerId,
        steps: u32,
        database: &Database,
        settings: &Settings,
    ) {
        let Some(timers) = self.0.get_mut(&battler) else {
            return;
        };
        for (skill_id, value) in timers.cooldown.iter_mut() {
            let Some(skill) = database.skill(*skill_id) else {
                continue;
            };
            let interval = skill
                .cooldown()
                .steps
                .unwrap_or(settings.cooldown_steps)
                .max(1);
            if steps % interval == 0 {
                *value -= 1;
            }
        }
    }

    /// Adds each skill's after-battle adjustment and clears warmups.
    pub fn end_battle(&mut self, battler: BattlerId, database: &Database, settings: &Settings) {
        let Some(timers) = self.0.get_mut(&battler) else {
            return;
        };
        for (skill_id, value) in timers.cooldown.iter_mut() {
            let adjustment = database
                .skill(*skill_id)
                .and_then(|s| s.cooldown().after_battle)
                .unwrap_or(settings.cooldown_after_battle);
            *value += adjustment;
        }
        timers.warmup.clear();
    }

    fn entry(&mut self, battler: BattlerId) -> &mut Timers {
        self.0.entry(battler).or_default()
    }
}

fn bypasses(skill: &UsableItem, settings: &Settings) -> bool {
    skill.cooldown().bypass || settings.cooldown_bypass.contains(&skill.id)
}
