mod battler;
mod roster;
mod store;

pub use battler::*;
pub use roster::*;
pub use store::*;

use crate::{
    camera::{Camera, Footprint},
    cooldown::CooldownLedger,
    database::{Database, UsableItem},
    host::{Audio, AudioTrack, Channel, Stage},
    notetag::ItemRef,
    settings::Settings,
};
use indexmap::IndexMap;
use tracing::debug;

/// Everything an action can read or change while it plays out: the roster,
/// the global stores, the camera and cooldowns, and the host collaborators.
pub struct Battle<S, A> {
    pub settings: Settings,
    pub roster: Roster,
    pub database: Database,
    pub switches: Switches,
    pub variables: Variables,
    pub inventory: Inventory,
    pub camera: Camera,
    pub cooldowns: CooldownLedger,
    /// Common events reserved by actions, in order.
    pub common_events: Vec<u32>,
    /// One memorized track per channel.
    pub memorized: IndexMap<Channel, AudioTrack>,
    pub stage: S,
    pub audio: A,
    /// Frames elapsed since the battle started.
    pub frame: u64,
    /// Map steps the party has walked, for step-based cooldowns.
    pub steps: u32,
}

impl<S: Stage, A: Audio> Battle<S, A> {
    pub fn new(
        settings: Settings,
        mut roster: Roster,
        database: Database,
        stage: S,
        audio: A,
    ) -> Self {
        roster.set_death_state(settings.death_state_id, settings.max_tp);
        let camera = Camera::new(settings.bounds);

        Self {
            settings,
            roster,
            database,
            switches: Switches::default(),
            variables: Variables::default(),
            inventory: Inventory::default(),
            camera,
            cooldowns: CooldownLedger::default(),
            common_events: Vec::new(),
            memorized: IndexMap::new(),
            stage,
            audio,
            frame: 0,
            steps: 0,
        }
    }

    /// Centers the camera, snaps the zoom back to 1 and starts every
    /// battler's skill warmups.
    pub fn start(&mut self) {
        self.camera.reset(self.settings.bounds, 0);
        self.camera.start_zoom(1., 1);

        for id in self.roster.all().collect::<Vec<_>>() {
            let known = known_skills(&self.roster, &self.database, id);
            self.cooldowns.start_warmups(id, &known, &self.settings);
        }
        debug!("battle started with {} battlers", self.roster.all().count());
    }

    /// Advances one frame: the stage first, then the camera toward its
    /// target.
    pub fn update(&mut self) {
        self.frame += 1;
        self.stage.update();

        let focus = self.camera_footprints(&self.camera.focus);
        let point = self.camera.focus_point(&focus, self.settings.bounds);
        let target = self.camera.target(point);
        self.camera.update(target);
    }

    /// Counts down cooldowns, warmups and buffs at the end of a turn.
    pub fn end_turn(&mut self) {
        for id in self.roster.all().collect::<Vec<_>>() {
            self.cooldowns.update_turn(id);
            if let Some(battler) = self.roster.get_mut(id) {
                battler.update_buff_turns();
            }
        }
    }

    /// Applies after-battle cooldown adjustments to the party.
    pub fn end_battle(&mut self) {
        for id in self.roster.members(Side::Actor).collect::<Vec<_>>() {
            self.cooldowns
                .end_battle(id, &self.database, &self.settings);
        }
    }

    /// Walks the party `count` map steps, ticking step-based cooldowns on
    /// each one.
    pub fn take_steps(&mut self, count: u32) {
        let party = self.roster.members(Side::Actor).collect::<Vec<_>>();
        for _ in 0..count {
            self.steps = self.steps.wrapping_add(1);
            for &id in &party {
                self.cooldowns
                    .update_steps(id, self.steps, &self.database, &self.settings);
            }
        }
    }

    /// Puts `battler`'s skills on cooldown for using `item`. Items carry no
    /// cooldown costs.
    pub fn pay_cooldowns(&mut self, battler: BattlerId, item: ItemRef) {
        let ItemRef::Skill(skill_id) = item else {
            return;
        };
        let Some(used) = self.database.skill(skill_id) else {
            return;
        };
        let known = known_skills(&self.roster, &self.database, battler);
        self.cooldowns
            .pay(battler, used, &known, &self.database, &self.settings);
    }

    /// Applies the cooldown changes `item` carries to a battler it affects.
    pub fn apply_cooldown_changes(&mut self, battler: BattlerId, item: ItemRef) {
        let Some(source) = self.database.get(item) else {
            return;
        };
        let known = known_skills(&self.roster, &self.database, battler);
        self.cooldowns
            .apply_changes(battler, source, &known, &self.database, &self.settings);
    }

    /// The skills `battler` knows, as far as the database has them.
    pub fn known_skills(&self, battler: BattlerId) -> Vec<&UsableItem> {
        known_skills(&self.roster, &self.database, battler)
    }

    /// Sprite geometry of a group for camera math, lifted by float and jump.
    /// Battlers without a sprite are left out.
    pub fn camera_footprints(&self, group: &[BattlerId]) -> Vec<Footprint> {
        self.footprints(group, true)
    }

    /// Sprite geometry of a group standing on the ground, for movement.
    pub fn ground_footprints(&self, group: &[BattlerId]) -> Vec<Footprint> {
        self.footprints(group, false)
    }

    fn footprints(&self, group: &[BattlerId], lifted: bool) -> Vec<Footprint> {
        group
            .iter()
            .filter_map(|&id| {
                let sprite = self.stage.sprite(id)?;
                let position = if lifted {
                    sprite.lifted_position()
                } else {
                    sprite.position
                };
                Some(Footprint {
                    side: id.side(),
                    position,
                    width: sprite.width,
                    height: sprite.height,
                })
            })
            .collect()
    }
}

fn known_skills<'a>(
    roster: &Roster,
    database: &'a Database,
    battler: BattlerId,
) -> Vec<&'a UsableItem> {
    roster
        .get(battler)
        .map(|b| {
            b.skills
                .iter()
                .filter_map(|&id| database.skill(id))
                .collect()
        })
        .unwrap_or_default()
}
