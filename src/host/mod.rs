//! The collaborators an action drives: the stage that draws battlers and
//! screen effects, and the audio player.

pub mod headless;

use crate::{battle::BattlerId, notetag::ItemRef};
use glam::DVec2;
use serde::{Deserialize, Serialize};

pub use headless::{HeadlessMixer, HeadlessStage};

/// The part of a battler's sprite the interpreter needs to know about.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Sprite {
    /// Horizontal center and vertical base, in field pixels.
    pub position: DVec2,
    pub width: f64,
    pub height: f64,
    /// Current float height, as a fraction of the sprite's height.
    pub float_height: f64,
    /// Current jump height, as a fraction of the sprite's height.
    pub jump_height: f64,
    /// Whether the sprite can be moved around the field.
    pub can_move: bool,
}

impl Sprite {
    /// The sprite's base lifted by its current float and jump.
    pub fn lifted_position(&self) -> DVec2 {
        let lift = (self.float_height + self.jump_height) * self.height;
        DVec2::new(self.position.x, self.position.y - lift)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Performance {
    Start,
    Action,
    Finish,
}

/// Sprite poses a battler can be asked to play.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Motion {
    Walk,
    Wait,
    Chant,
    Guard,
    Damage,
    Evade,
    Thrust,
    Swing,
    Missile,
    Skill,
    Spell,
    Item,
    Escape,
    Victory,
    Dying,
    Abnormal,
    Sleep,
    Dead,
}

impl Motion {
    /// Maps a motion keyword. `attack` is not a motion of its own; it is
    /// handled as an attack performance.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let motion = match keyword.trim().to_lowercase().as_str() {
            "walk" | "move" => Motion::Walk,
            "wait" => Motion::Wait,
            "chant" => Motion::Chant,
            "guard" => Motion::Guard,
            "damage" | "hit" => Motion::Damage,
            "evade" => Motion::Evade,
            "thrust" => Motion::Thrust,
            "swing" => Motion::Swing,
            "missile" => Motion::Missile,
            "skill" => Motion::Skill,
            "spell" => Motion::Spell,
            "item" => Motion::Item,
            "escape" => Motion::Escape,
            "victory" => Motion::Victory,
            "dying" => Motion::Dying,
            "abnormal" => Motion::Abnormal,
            "sleep" => Motion::Sleep,
            "dead" => Motion::Dead,
            _ => return None,
        };
        Some(motion)
    }

    /// Weapon motions also show the battler's weapon.
    pub fn is_weapon(self) -> bool {
        matches!(self, Motion::Thrust | Motion::Swing | Motion::Missile)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Destination {
    /// The battler's home position.
    Home,
    /// Forward by a distance relative to the current destination. Negative
    /// distances move backward.
    Forward(f64),
    Point(DVec2),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum Facing {
    Forward,
    Backward,
    Home,
    AwayFromHome,
    Toward(DVec2),
    AwayFrom(DVec2),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SpriteEffect {
    Whiten,
    Blink,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Fade {
    In,
    Out,
}

/// Everything the interpreter can ask the stage to show.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum StageRequest {
    DisplayAction {
        subject: BattlerId,
        item: ItemRef,
    },
    /// Writes the outcome of an effect on `target` to the battle log.
    DisplayResults {
        target: BattlerId,
        message: String,
    },
    ClearLog,
    RefreshStatus,
    Perform {
        battler: BattlerId,
        performance: Performance,
    },
    CastAnimation {
        subject: BattlerId,
        item: ItemRef,
    },
    Animation {
        targets: Vec<BattlerId>,
        animation_id: u32,
        mirror: bool,
    },
    AttackAnimation {
        subject: BattlerId,
        targets: Vec<BattlerId>,
        mirror: bool,
    },
    /// Applies the item's own effects (damage formula, effects list) to a
    /// target.
    ActionEffect {
        subject: BattlerId,
        target: BattlerId,
        item: ItemRef,
    },
    DamagePopup(BattlerId),
    Collapse(BattlerId),
    Effect {
        battler: BattlerId,
        effect: SpriteEffect,
    },
    Motion {
        battler: BattlerId,
        motion: Motion,
    },
    PerformAttack(BattlerId),
    Move {
        battler: BattlerId,
        destination: Destination,
        frames: u32,
    },
    Face {
        battler: BattlerId,
        facing: Facing,
    },
    /// Floats to `height`, a fraction of the sprite height.
    Float {
        battler: BattlerId,
        height: f64,
        frames: u32,
    },
    /// Jumps with a peak of `height`, a fraction of the sprite height.
    Jump {
        battler: BattlerId,
        height: f64,
        frames: u32,
    },
    Opacity {
        battler: BattlerId,
        opacity: u8,
        frames: u32,
    },
    Flash {
        color: [i32; 4],
        frames: u32,
    },
    Tint {
        tone: [i32; 4],
        frames: u32,
    },
    Shake {
        power: i32,
        speed: i32,
        frames: u32,
    },
    Fade {
        fade: Fade,
        frames: u32,
    },
    BattleHud {
        visible: bool,
    },
}

/// The rendering side of a battle. Requests start effects; the predicates
/// report whether effects started earlier are still running and are polled
/// once per frame while an action waits on them.
pub trait Stage {
    fn request(&mut self, request: StageRequest);

    /// Advances every running effect by one frame.
    fn update(&mut self);

    fn sprite(&self, battler: BattlerId) -> Option<Sprite>;

    fn is_animation_playing(&self) -> bool;
    /// Whether a sprite effect such as a collapse or whiten is running.
    fn is_effecting(&self) -> bool;
    fn is_any_moving(&self) -> bool;
    fn is_any_floating(&self) -> bool;
    fn is_any_jumping(&self) -> bool;
    fn is_opacity_changing(&self) -> bool;
    fn is_motion_playing(&self, battler: BattlerId) -> bool;
    fn is_popup_playing(&self) -> bool;
    /// Whether the battle log is still showing a line it was just given.
    fn is_log_busy(&self) -> bool;
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Channel {
    Bgm,
    Bgs,
    Me,
    Se,
}

impl Channel {
    /// Maps an audio opcode name to its channel.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_uppercase().as_str() {
            "BGM" | "MUSIC" | "SONG" => Some(Channel::Bgm),
            "BGS" | "AMBIENCE" => Some(Channel::Bgs),
            "ME" | "FANFARE" => Some(Channel::Me),
            "SE" | "SOUND" | "SFX" => Some(Channel::Se),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AudioTrack {
    pub name: String,
    /// 0 to 100.
    pub volume: i32,
    /// 50 to 150.
    pub pitch: i32,
    /// -100 to 100.
    pub pan: i32,
}

/// Built-in system sound effects.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum SystemSound {
    Cursor,
    Ok,
    Cancel,
    Buzzer,
    Equip,
    Save,
    Load,
    BattleStart,
    Escape,
    EnemyAttack,
    EnemyDamage,
    EnemyCollapse,
    BossCollapse1,
    BossCollapse2,
    ActorDamage,
    ActorCollapse,
    Recovery,
    Miss,
    Evasion,
    MagicEvasion,
    Reflection,
    Shop,
    UseItem,
    UseSkill,
}

impl SystemSound {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let sound = match keyword.trim().to_uppercase().as_str() {
            "CURSOR" => SystemSound::Cursor,
            "OK" => SystemSound::Ok,
            "CANCEL" => SystemSound::Cancel,
            "BUZZER" => SystemSound::Buzzer,
            "EQUIP" => SystemSound::Equip,
            "SAVE" => SystemSound::Save,
            "LOAD" => SystemSound::Load,
            "BATTLE START" => SystemSound::BattleStart,
            "ESCAPE" => SystemSound::Escape,
            "ENEMY ATTACK" => SystemSound::EnemyAttack,
            "ENEMY DAMAGE" => SystemSound::EnemyDamage,
            "ENEMY COLLAPSE" => SystemSound::EnemyCollapse,
            "BOSS COLLAPSE 1" => SystemSound::BossCollapse1,
            "BOSS COLLAPSE 2" => SystemSound::BossCollapse2,
            "ACTOR DAMAGE" => SystemSound::ActorDamage,
            "ACTOR COLLAPSE" => SystemSound::ActorCollapse,
            "RECOVERY" => SystemSound::Recovery,
            "MISS" => SystemSound::Miss,
            "EVASION" => SystemSound::Evasion,
            "MAGIC EVASION" => SystemSound::MagicEvasion,
            "REFLECTION" => SystemSound::Reflection,
            "SHOP" => SystemSound::Shop,
            "USE ITEM" => SystemSound::UseItem,
            "USE SKILL" => SystemSound::UseSkill,
            _ => return None,
        };
        Some(sound)
    }
}

/// The audio player, one track per channel.
pub trait Audio {
    fn play(&mut self, channel: Channel, track: AudioTrack);
    fn stop(&mut self, channel: Channel);
    /// The track playing on a channel, for memorizing. Always `None` for
    /// sound effects.
    fn current(&self, channel: Channel) -> Option<AudioTrack>;
    /// Resumes a memorized track where it was left.
    fn replay(&mut self, channel: Channel, track: AudioTrack);
    fn play_system(&mut self, sound: SystemSound);
}
