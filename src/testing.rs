//! Fixtures shared by unit tests.

use crate::{
    battle::{Battle, Battler, BattlerId, Roster},
    database::{Database, UsableItem},
    host::{
        headless::{SpriteSpec, Timings},
        HeadlessMixer, HeadlessStage,
    },
    interpreter::ActionContext,
    notetag::ItemRef,
    settings::Settings,
};
use glam::DVec2;

pub const HERO: BattlerId = BattlerId::Actor(0);
pub const MAGE: BattlerId = BattlerId::Actor(1);
pub const SLIME: BattlerId = BattlerId::Enemy(0);
pub const BAT: BattlerId = BattlerId::Enemy(1);

pub fn database() -> Database {
    let mut database = Database::default();
    for (id, name, stype_id, animation_id, note) in [
        (1, "Attack", 0, 1, ""),
        (10, "Slash", 1, 6, "<cooldown: 2>\n<stype 2 cooldown: 1>"),
        (11, "Spark", 2, 0, ""),
        (12, "Flare", 2, 0, "<skill 10 cooldown: -1>"),
    ] {
        let skill = UsableItem::new(id, name, stype_id, animation_id, note).unwrap();
        database.insert_skill(skill);
    }
    database.insert_item(UsableItem::new(1, "Potion", 0, 41, "").unwrap());
    database
}

pub fn battle() -> Battle<HeadlessStage, HeadlessMixer> {
    let mut hero = Battler::new("Harold", 1, 100, 30);
    hero.skills = vec![10, 11, 12];
    let mut mage = Battler::new("Marsha", 4, 80, 60);
    mage.skills = vec![11];
    let roster = Roster::new(
        vec![hero, mage],
        vec![Battler::new("Slime", 1, 100, 0), Battler::new("Bat", 2, 40, 0)],
    );

    let mut stage = HeadlessStage::new(Timings::default());
    for (id, x, y, width, height) in [
        (HERO, 600., 300., 64., 64.),
        (MAGE, 640., 360., 64., 64.),
        (SLIME, 200., 300., 96., 96.),
        (BAT, 260., 380., 64., 48.),
    ] {
        stage.add_sprite(
            id,
            SpriteSpec {
                home: DVec2::new(x, y),
                width,
                height,
                can_move: true,
            },
        );
    }

    let mut battle = Battle::new(
        Settings::default(),
        roster,
        database(),
        stage,
        HeadlessMixer::default(),
    );
    battle.start();
    battle
}

/// Harold using Slash on the slime.
pub fn context() -> ActionContext {
    ActionContext::new(HERO, vec![SLIME], ItemRef::Skill(10))
}
