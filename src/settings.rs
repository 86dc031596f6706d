use serde::{Deserialize, Serialize};

/// Battle-wide parameters consulted by the interpreter and its packs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Volume used when an audio command omits one, on a 0 to 100 scale.
    pub default_volume: i32,
    /// Pitch used when an audio command omits one, on a 50 to 150 scale.
    pub default_pitch: i32,
    /// Pan used when an audio command omits one, on a -100 to 100 scale.
    pub default_pan: i32,
    /// Distance in pixels of `MOVE x: FORWARD` without an explicit distance.
    pub step_distance: f64,
    /// The size of the battle field, in pixels.
    pub bounds: Bounds,
    /// Side view battles allow sprites to move, float and jump, and enable
    /// the battle camera.
    pub side_view: bool,
    /// The player option controlling whether camera commands do anything.
    pub battle_camera: bool,
    /// The state that marks a battler as dead.
    pub death_state_id: u32,
    /// The maximum TP pool of every battler.
    pub max_tp: i32,
    /// Turns added to every cooldown when a battle ends, unless a skill
    /// declares its own.
    pub cooldown_after_battle: i32,
    /// Map steps per cooldown turn outside battle, unless a skill declares
    /// its own.
    pub cooldown_steps: u32,
    /// Skills that never go on cooldown.
    pub cooldown_bypass: Vec<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_volume: 90,
            default_pitch: 100,
            default_pan: 0,
            step_distance: 48.,
            bounds: Bounds::default(),
            side_view: true,
            battle_camera: true,
            death_state_id: 1,
            max_tp: 100,
            cooldown_after_battle: -10,
            cooldown_steps: 5,
            cooldown_bypass: (1..=7).collect(),
        }
    }
}

impl Settings {
    /// Whether camera commands should take effect.
    #[inline]
    pub fn camera_enabled(&self) -> bool {
        self.side_view && self.battle_camera
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 816.,
            height: 624.,
        }
    }
}
