//! A self-contained battle snapshot that one action can be played against,
//! and the report of how it went.

use crate::{
    battle::{Battle, Battler, BattlerId, Inventory, Roster, SkillId, StateId, Switches, Variables},
    camera::Camera,
    cooldown::CooldownLedger,
    database::{Database, UsableItem},
    host::{
        headless::{AudioEvent, SpriteSpec, Timings},
        HeadlessMixer, HeadlessStage, StageRequest,
    },
    interpreter::ActionContext,
    notetag::{DecodeError, ItemRef},
    runner::ActionRunner,
    settings::Settings,
};
use derive_more::derive::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type HeadlessBattle = Battle<HeadlessStage, HeadlessMixer>;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub party: Vec<BattlerSpec>,
    #[serde(default)]
    pub troop: Vec<BattlerSpec>,
    #[serde(default)]
    pub skills: Vec<ItemSpec>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    #[serde(default)]
    pub switches: Switches,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub inventory: Inventory,
    /// Who acts.
    pub subject: BattlerId,
    #[serde(default)]
    pub targets: Vec<BattlerId>,
    /// The skill or item being used.
    pub item: ItemRef,
    #[serde(default)]
    pub aftermath: Aftermath,
}

/// What happens to the battle once the action is over.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Aftermath {
    /// Close the turn, counting down cooldowns, warmups and buffs.
    #[serde(default)]
    pub end_turn: bool,
    /// End the battle, applying after-battle cooldowns to the party.
    #[serde(default)]
    pub end_battle: bool,
    /// Map steps the party walks afterwards.
    #[serde(default)]
    pub steps: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BattlerSpec {
    pub name: String,
    #[serde(default)]
    pub data_id: u32,
    pub mhp: i32,
    #[serde(default)]
    pub mmp: i32,
    /// Starting HP. Full when omitted.
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub mp: Option<i32>,
    #[serde(default)]
    pub tp: i32,
    #[serde(default)]
    pub states: Vec<StateId>,
    #[serde(default)]
    pub skills: Vec<SkillId>,
    #[serde(default)]
    pub sprite: Option<SpriteSpec>,
}

impl BattlerSpec {
    fn build(&self) -> Battler {
        let mut battler = Battler::new(self.name.clone(), self.data_id, self.mhp, self.mmp);
        if let Some(hp) = self.hp {
            battler.hp = hp.clamp(0, battler.mhp());
        }
        if let Some(mp) = self.mp {
            battler.mp = mp.clamp(0, battler.mmp());
        }
        battler.tp = self.tp.max(0);
        battler.skills = self.skills.clone();
        for &state_id in &self.states {
            battler.add_state(state_id);
        }
        battler
    }
}

/// A skill or item entry. The note is decoded like a database notes field.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ItemSpec {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub stype_id: u32,
    #[serde(default)]
    pub animation_id: u32,
    #[serde(default)]
    pub note: String,
}

impl ItemSpec {
    fn build(&self) -> Result<UsableItem, DecodeError> {
        UsableItem::new(
            self.id,
            self.name.clone(),
            self.stype_id,
            self.animation_id,
            &self.note,
        )
    }
}

/// Possible errors that can be produced by [`Scenario::build`].
#[non_exhaustive]
#[derive(Debug, Display, Error, From)]
pub enum LoadError {
    /// A [DecodeError] error.
    #[display("could not decode notes: {_0}")]
    DecodeError(DecodeError),
    #[display("subject {subject} is not in the battle")]
    #[from(ignore)]
    UnknownSubject { subject: BattlerId },
    #[display("{item} is not in the database")]
    #[from(ignore)]
    UnknownItem { item: ItemRef },
}

impl Scenario {
    /// Sets up the battle on a headless host and starts the action.
    pub fn build(&self) -> Result<(HeadlessBattle, ActionRunner), LoadError> {
        let mut database = Database::default();
        for skill in &self.skills {
            database.insert_skill(skill.build()?);
        }
        for item in &self.items {
            database.insert_item(item.build()?);
        }
        if database.get(self.item).is_none() {
            return Err(LoadError::UnknownItem { item: self.item });
        }

        let roster = Roster::new(
            self.party.iter().map(BattlerSpec::build).collect(),
            self.troop.iter().map(BattlerSpec::build).collect(),
        );
        if roster.get(self.subject).is_none() {
            return Err(LoadError::UnknownSubject {
                subject: self.subject,
            });
        }

        let mut stage = HeadlessStage::new(self.timings);
        let sides = [
            (&self.party, BattlerId::Actor as fn(usize) -> BattlerId),
            (&self.troop, BattlerId::Enemy),
        ];
        for (specs, id) in sides {
            for (index, spec) in specs.iter().enumerate() {
                if let Some(sprite) = spec.sprite {
                    stage.add_sprite(id(index), sprite);
                }
            }
        }

        let mut battle = Battle::new(
            self.settings.clone(),
            roster,
            database,
            stage,
            HeadlessMixer::default(),
        );
        battle.switches = self.switches.clone();
        battle.variables = self.variables.clone();
        battle.inventory = self.inventory.clone();
        battle.start();
        debug!(
            "scenario ready: {} uses {} on {} targets",
            self.subject,
            self.item,
            self.targets.len()
        );

        let context = ActionContext::new(self.subject, self.targets.clone(), self.item);
        let runner = ActionRunner::start(&mut battle, context);
        Ok((battle, runner))
    }
}

impl Scenario {
    /// Plays out the aftermath: the turn ends, then the battle, then the
    /// party walks.
    pub fn conclude(&self, battle: &mut HeadlessBattle) {
        let aftermath = self.aftermath;
        if aftermath.end_turn {
            battle.end_turn();
        }
        if aftermath.end_battle {
            battle.end_battle();
        }
        if aftermath.steps > 0 {
            battle.take_steps(aftermath.steps);
        }
        debug!("concluded with {:?}", aftermath);
    }
}

/// The state of a battle after an action was played.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub frames: u64,
    /// Map steps walked after the action.
    pub steps: u32,
    /// Whether the action ran to the end of its finish phase.
    pub finished: bool,
    pub roster: &'a Roster,
    pub switches: &'a Switches,
    pub variables: &'a Variables,
    pub inventory: &'a Inventory,
    pub common_events: &'a [u32],
    pub cooldowns: &'a CooldownLedger,
    pub camera: &'a Camera,
    pub log: &'a [String],
    pub requests: &'a [StageRequest],
    pub audio: &'a [AudioEvent],
}

impl<'a> Report<'a> {
    pub fn new(battle: &'a HeadlessBattle, runner: &ActionRunner, frames: u64) -> Self {
        Self {
            frames,
            steps: battle.steps,
            finished: runner.is_finished(),
            roster: &battle.roster,
            switches: &battle.switches,
            variables: &battle.variables,
            inventory: &battle.inventory,
            common_events: &battle.common_events,
            cooldowns: &battle.cooldowns,
            camera: &battle.camera,
            log: &battle.stage.log,
            requests: &battle.stage.history,
            audio: &battle.audio.history,
        }
    }
}
