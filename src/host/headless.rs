//! A host without a screen. Effects run on frame counters so actions can be
//! played through, and every request is kept for inspection.

use super::*;
use indexmap::IndexMap;
use tracing::trace;

/// How many frames each kind of timed effect lasts.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Timings {
    pub animation: u32,
    pub collapse: u32,
    pub whiten: u32,
    pub blink: u32,
    pub popup: u32,
    pub motion: u32,
    pub log_line: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            animation: 30,
            collapse: 32,
            whiten: 16,
            blink: 20,
            popup: 90,
            motion: 12,
            log_line: 16,
        }
    }
}

/// Where a battler's sprite starts out and how big it is.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct SpriteSpec {
    pub home: DVec2,
    pub width: f64,
    pub height: f64,
    #[serde(default = "can_move_default")]
    pub can_move: bool,
}

fn can_move_default() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct SpriteState {
    spec: SpriteSpec,
    position: DVec2,
    destination: DVec2,
    move_duration: u32,
    facing: Option<Facing>,
    float_height: f64,
    float_target: f64,
    float_rate: f64,
    float_duration: u32,
    jump_peak: f64,
    jump_duration: u32,
    jump_full: u32,
    opacity: f64,
    opacity_target: f64,
    opacity_rate: f64,
    opacity_duration: i32,
    opacity_changing: bool,
    effect_duration: u32,
    motion_duration: u32,
}

impl SpriteState {
    fn new(spec: SpriteSpec) -> Self {
        Self {
            spec,
            position: spec.home,
            destination: spec.home,
            move_duration: 0,
            facing: None,
            float_height: 0.,
            float_target: 0.,
            float_rate: 0.,
            float_duration: 0,
            jump_peak: 0.,
            jump_duration: 0,
            jump_full: 0,
            opacity: 255.,
            opacity_target: 255.,
            opacity_rate: 0.,
            opacity_duration: 0,
            opacity_changing: false,
            effect_duration: 0,
            motion_duration: 0,
        }
    }

    fn start_move(&mut self, destination: DVec2, frames: u32) {
        self.destination = destination;
        self.move_duration = frames;
        if frames == 0 {
            self.position = destination;
        }
    }

    fn start_float(&mut self, height: f64, frames: u32) {
        let frames = frames.max(1);
        self.float_target = height;
        self.float_duration = frames;
        self.float_rate = (self.float_height - height).abs() / frames as f64;
    }

    fn start_jump(&mut self, peak: f64, frames: u32) {
        self.jump_peak = peak;
        self.jump_duration = frames;
        self.jump_full = frames;
    }

    fn start_opacity(&mut self, opacity: u8, frames: u32) {
        let frames = frames.max(1);
        self.opacity_target = opacity as f64;
        self.opacity_duration = frames as i32;
        self.opacity_rate = (self.opacity - self.opacity_target).abs() / frames as f64;
        self.opacity_changing = true;
    }

    fn jump_height(&self) -> f64 {
        if self.jump_duration == 0 {
            return 0.;
        }
        let x = (self.jump_full - self.jump_duration) as f64;
        let h = self.jump_full as f64 / 2.;
        let k = self.jump_peak;
        let a = -k / h.powi(2);
        a * (x - h).powi(2) + k
    }

    fn update(&mut self) {
        if self.move_duration > 0 {
            let d = self.move_duration as f64;
            self.position = (self.position * (d - 1.) + self.destination) / d;
            self.move_duration -= 1;
        }

        self.float_duration = self.float_duration.saturating_sub(1);
        self.jump_duration = self.jump_duration.saturating_sub(1);
        if self.float_duration == 0 {
            self.float_height = self.float_target;
        } else if self.float_height >= self.float_target {
            self.float_height = (self.float_height - self.float_rate).max(self.float_target);
        } else {
            self.float_height = (self.float_height + self.float_rate).min(self.float_target);
        }

        if self.opacity_changing {
            self.opacity_duration -= 1;
            if self.opacity_duration <= 0 {
                self.opacity = self.opacity_target;
                self.opacity_changing = false;
            } else if self.opacity >= self.opacity_target {
                self.opacity = (self.opacity - self.opacity_rate).max(self.opacity_target);
            } else {
                self.opacity = (self.opacity + self.opacity_rate).min(self.opacity_target);
            }
        }

        self.effect_duration = self.effect_duration.saturating_sub(1);
        self.motion_duration = self.motion_duration.saturating_sub(1);
    }
}

/// A [`Stage`] that simulates timings instead of drawing.
#[derive(Clone, Debug, Default, Serialize)]
pub struct HeadlessStage {
    timings: Timings,
    sprites: IndexMap<BattlerId, SpriteState>,
    animation: u32,
    popup: u32,
    log_busy: u32,
    screen: u32,
    /// Lines currently shown in the battle log.
    pub log: Vec<String>,
    /// Every request received, in order.
    pub history: Vec<StageRequest>,
    pub hud_visible: bool,
}

impl HeadlessStage {
    pub fn new(timings: Timings) -> Self {
        Self {
            timings,
            hud_visible: true,
            ..Default::default()
        }
    }

    pub fn add_sprite(&mut self, battler: BattlerId, spec: SpriteSpec) {
        self.sprites.insert(battler, SpriteState::new(spec));
    }

    pub fn opacity(&self, battler: BattlerId) -> Option<f64> {
        self.sprites.get(&battler).map(|s| s.opacity)
    }

    pub fn facing(&self, battler: BattlerId) -> Option<Facing> {
        self.sprites.get(&battler).and_then(|s| s.facing)
    }

    /// Whether a screen flash, tint, shake or fade is still running.
    pub fn is_screen_busy(&self) -> bool {
        self.screen > 0
    }

    fn write_log(&mut self, line: String) {
        self.log.push(line);
        self.log_busy = self.timings.log_line;
    }
}

impl Stage for HeadlessStage {
    fn request(&mut self, request: StageRequest) {
        trace!("stage request {:?}", request);
        let timings = self.timings;

        match &request {
            StageRequest::DisplayAction { subject, item } => {
                self.write_log(format!("{} uses {}", subject, item));
            }
            StageRequest::DisplayResults { message, .. } => {
                self.write_log(message.clone());
            }
            StageRequest::ClearLog => self.log.clear(),
            StageRequest::CastAnimation { .. }
            | StageRequest::AttackAnimation { .. }
            | StageRequest::Animation { .. } => {
                self.animation = timings.animation;
            }
            StageRequest::ActionEffect { target, .. } | StageRequest::DamagePopup(target) => {
                if self.sprites.contains_key(target) {
                    self.popup = timings.popup;
                }
            }
            StageRequest::Collapse(battler) => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    sprite.effect_duration = timings.collapse;
                }
            }
            StageRequest::Effect { battler, effect } => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    sprite.effect_duration = match effect {
                        SpriteEffect::Whiten => timings.whiten,
                        SpriteEffect::Blink => timings.blink,
                    };
                }
            }
            StageRequest::Motion { battler, .. } | StageRequest::PerformAttack(battler) => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    sprite.motion_duration = timings.motion;
                }
            }
            StageRequest::Move {
                battler,
                destination,
                frames,
            } => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    if sprite.spec.can_move {
                        let point = match *destination {
                            Destination::Home => sprite.spec.home,
                            Destination::Point(point) => point,
                            Destination::Forward(distance) => {
                                // Actors stand on the right and face left.
                                let distance = if battler.is_actor() {
                                    -distance
                                } else {
                                    distance
                                };
                                sprite.destination + DVec2::new(distance, 0.)
                            }
                        };
                        sprite.start_move(point, *frames);
                    }
                }
            }
            StageRequest::Face { battler, facing } => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    sprite.facing = Some(*facing);
                }
            }
            StageRequest::Float {
                battler,
                height,
                frames,
            } => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    if sprite.spec.can_move {
                        sprite.start_float(*height, *frames);
                    }
                }
            }
            StageRequest::Jump {
                battler,
                height,
                frames,
            } => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    if sprite.spec.can_move {
                        sprite.start_jump(*height, *frames);
                    }
                }
            }
            StageRequest::Opacity {
                battler,
                opacity,
                frames,
            } => {
                if let Some(sprite) = self.sprites.get_mut(battler) {
                    sprite.start_opacity(*opacity, *frames);
                }
            }
            StageRequest::Flash { frames, .. }
            | StageRequest::Tint { frames, .. }
            | StageRequest::Shake { frames, .. }
            | StageRequest::Fade { frames, .. } => {
                self.screen = self.screen.max(*frames);
            }
            StageRequest::BattleHud { visible } => self.hud_visible = *visible,
            StageRequest::Perform { .. } | StageRequest::RefreshStatus => {}
        }

        self.history.push(request);
    }

    fn update(&mut self) {
        self.animation = self.animation.saturating_sub(1);
        self.popup = self.popup.saturating_sub(1);
        self.log_busy = self.log_busy.saturating_sub(1);
        self.screen = self.screen.saturating_sub(1);
        for sprite in self.sprites.values_mut() {
            sprite.update();
        }
    }

    fn sprite(&self, battler: BattlerId) -> Option<Sprite> {
        let state = self.sprites.get(&battler)?;
        Some(Sprite {
            position: state.position,
            width: state.spec.width,
            height: state.spec.height,
            float_height: state.float_height,
            jump_height: state.jump_height(),
            can_move: state.spec.can_move,
        })
    }

    fn is_animation_playing(&self) -> bool {
        self.animation > 0
    }

    fn is_effecting(&self) -> bool {
        self.sprites.values().any(|s| s.effect_duration > 0)
    }

    fn is_any_moving(&self) -> bool {
        self.sprites.values().any(|s| s.move_duration > 0)
    }

    fn is_any_floating(&self) -> bool {
        self.sprites.values().any(|s| s.float_duration > 0)
    }

    fn is_any_jumping(&self) -> bool {
        self.sprites.values().any(|s| s.jump_duration > 0)
    }

    fn is_opacity_changing(&self) -> bool {
        self.sprites.values().any(|s| s.opacity_duration > 0)
    }

    fn is_motion_playing(&self, battler: BattlerId) -> bool {
        self.sprites
            .get(&battler)
            .is_some_and(|s| s.motion_duration > 0)
    }

    fn is_popup_playing(&self) -> bool {
        self.popup > 0
    }

    fn is_log_busy(&self) -> bool {
        self.log_busy > 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AudioEvent {
    Play { channel: Channel, track: AudioTrack },
    Stop(Channel),
    Replay { channel: Channel, track: AudioTrack },
    System(SystemSound),
}

/// An [`Audio`] player that only remembers what it was asked to do.
#[derive(Clone, Debug, Default, Serialize)]
pub struct HeadlessMixer {
    playing: IndexMap<Channel, AudioTrack>,
    pub history: Vec<AudioEvent>,
}

impl Audio for HeadlessMixer {
    fn play(&mut self, channel: Channel, track: AudioTrack) {
        if channel != Channel::Se {
            self.playing.insert(channel, track.clone());
        }
        self.history.push(AudioEvent::Play { channel, track });
    }

    fn stop(&mut self, channel: Channel) {
        self.playing.shift_remove(&channel);
        self.history.push(AudioEvent::Stop(channel));
    }

    fn current(&self, channel: Channel) -> Option<AudioTrack> {
        self.playing.get(&channel).cloned()
    }

    fn replay(&mut self, channel: Channel, track: AudioTrack) {
        self.playing.insert(channel, track.clone());
        self.history.push(AudioEvent::Replay { channel, track });
    }

    fn play_system(&mut self, sound: SystemSound) {
        self.history.push(AudioEvent::System(sound));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HERO: BattlerId = BattlerId::Actor(0);

    fn stage() -> HeadlessStage {
        let mut stage = HeadlessStage::new(Timings::default());
        stage.add_sprite(
            HERO,
            SpriteSpec {
                home: DVec2::new(600., 300.),
                width: 64.,
                height: 64.,
                can_move: true,
            },
        );
        stage
    }

    fn tick(stage: &mut HeadlessStage, frames: u32) {
        for _ in 0..frames {
            stage.update();
        }
    }

    #[test]
    fn test_move_forward_goes_left_for_actors() {
        let mut stage = stage();
        stage.request(StageRequest::Move {
            battler: HERO,
            destination: Destination::Forward(48.),
            frames: 4,
        });
        assert!(stage.is_any_moving());
        tick(&mut stage, 4);
        assert!(!stage.is_any_moving());
        assert_eq!(stage.sprite(HERO).unwrap().position, DVec2::new(552., 300.));

        stage.request(StageRequest::Move {
            battler: HERO,
            destination: Destination::Home,
            frames: 0,
        });
        assert_eq!(stage.sprite(HERO).unwrap().position, DVec2::new(600., 300.));
    }

    #[test]
    fn test_float_eases_and_lands() {
        let mut stage = stage();
        stage.request(StageRequest::Float {
            battler: HERO,
            height: 1.,
            frames: 4,
        });
        tick(&mut stage, 1);
        assert_eq!(stage.sprite(HERO).unwrap().float_height, 0.25);
        tick(&mut stage, 3);
        assert!(!stage.is_any_floating());
        assert_eq!(stage.sprite(HERO).unwrap().float_height, 1.);

        stage.request(StageRequest::Float {
            battler: HERO,
            height: 0.,
            frames: 2,
        });
        tick(&mut stage, 2);
        assert_eq!(stage.sprite(HERO).unwrap().float_height, 0.);
    }

    #[test]
    fn test_jump_peaks_halfway() {
        let mut stage = stage();
        stage.request(StageRequest::Jump {
            battler: HERO,
            height: 1.,
            frames: 10,
        });
        tick(&mut stage, 5);
        assert_eq!(stage.sprite(HERO).unwrap().jump_height, 1.);
        tick(&mut stage, 5);
        assert!(!stage.is_any_jumping());
        assert_eq!(stage.sprite(HERO).unwrap().jump_height, 0.);
    }

    #[test]
    fn test_opacity_fades() {
        let mut stage = stage();
        stage.request(StageRequest::Opacity {
            battler: HERO,
            opacity: 0,
            frames: 5,
        });
        assert!(stage.is_opacity_changing());
        tick(&mut stage, 5);
        assert!(!stage.is_opacity_changing());
        assert_eq!(stage.opacity(HERO), Some(0.));
    }

    #[test]
    fn test_timed_effects() {
        let mut stage = stage();
        stage.request(StageRequest::Collapse(HERO));
        stage.request(StageRequest::Animation {
            targets: vec![HERO],
            animation_id: 1,
            mirror: false,
        });
        assert!(stage.is_effecting());
        tick(&mut stage, 30);
        assert!(!stage.is_animation_playing());
        assert!(stage.is_effecting());
        tick(&mut stage, 2);
        assert!(!stage.is_effecting());
        assert_eq!(stage.history.len(), 2);
    }

    #[test]
    fn test_mixer_tracks_channels() {
        let mut mixer = HeadlessMixer::default();
        let track = AudioTrack {
            name: "Battle1".to_string(),
            volume: 90,
            pitch: 100,
            pan: 0,
        };
        mixer.play(Channel::Bgm, track.clone());
        mixer.play(Channel::Se, track.clone());
        assert_eq!(mixer.current(Channel::Bgm), Some(track));
        assert_eq!(mixer.current(Channel::Se), None);
        mixer.stop(Channel::Bgm);
        assert_eq!(mixer.current(Channel::Bgm), None);
    }
}
