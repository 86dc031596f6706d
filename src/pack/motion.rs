use super::targets;
use crate::{
    battle::{Battle, BattlerId},
    camera::{anchor_x, anchor_y, Anchor},
    host::{Audio, Destination, Facing, Fade, Motion, SpriteEffect, Stage, StageRequest},
    interpreter::{ActionContext, ActionPack, Signal, Wait},
    script::{frames_or, parse_float, parse_int, parse_percent, Command},
};
use glam::DVec2;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static PREFIXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(FACE|FLOAT|JUMP|MOTION|MOVE|OPACITY)\s+(.+)$").unwrap());

const POINT_WORDS: [&str; 6] = [
    "POINT",
    "POSITION",
    "COORDINATE",
    "COORDINATES",
    "SCREEN",
    "SCREEN POS",
];

/// Sprite movement, poses and full screen effects.
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionPack;

#[derive(Clone, Debug, PartialEq)]
enum MotionAction {
    AttackAnimation {
        target: Option<String>,
        mirror: bool,
    },
    EnemyEffect {
        target: Option<String>,
        effect: Option<SpriteEffect>,
    },
    Face {
        movers: String,
        facing: FaceTo,
    },
    Fade {
        fade: Fade,
        frames: u32,
    },
    Flash {
        color: [i32; 4],
        frames: u32,
    },
    Float {
        movers: String,
        lift: Lift,
        frames: u32,
    },
    BattleHud(bool),
    Jump {
        movers: String,
        lift: Lift,
        frames: u32,
    },
    Motion {
        keyword: String,
        target: Option<String>,
    },
    Move {
        movers: String,
        to: MoveTo,
    },
    Opacity {
        movers: String,
        opacity: Option<u8>,
        frames: u32,
    },
    Shake {
        power: i32,
        speed: i32,
        frames: u32,
    },
    Tint {
        tone: [i32; 4],
        frames: u32,
    },
    WaitFor(Wait),
}

#[derive(Clone, Debug, PartialEq)]
enum FaceTo {
    Fixed(Facing),
    Point(DVec2),
    AwayFromPoint(DVec2),
    Group(String),
    AwayFromGroup(String),
    Nothing,
}

/// A float or jump height: a fraction of the sprite height plus pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Lift {
    peak: f64,
    pixels: f64,
}

impl Lift {
    fn parse(arg: Option<&str>) -> Self {
        let arg = arg.unwrap_or_default();
        if let Some(percent) = parse_percent(arg) {
            Lift {
                peak: percent * 0.01,
                pixels: 0.,
            }
        } else if let Some(pixels) = parse_int(arg) {
            Lift {
                peak: 0.,
                pixels: pixels as f64,
            }
        } else {
            Lift {
                peak: 1.,
                pixels: 0.,
            }
        }
    }

    fn height(self, sprite_height: f64) -> f64 {
        self.peak + self.pixels / sprite_height.max(1.)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum MoveTo {
    Home { frames: u32 },
    Return { frames: u32 },
    Step { distance: Option<f64>, backward: bool, frames: u32 },
    Point { point: DVec2, frames: u32 },
    Anchor { target: String, anchor: Option<Anchor>, frames: u32 },
    Nowhere,
}

impl MotionAction {
    fn parse(command: &Command) -> Option<Self> {
        let arg = |index| command.arg(index);
        let target = || arg(0).map(str::to_string);

        let action = match command.name.as_str() {
            "ATTACK ANIMATION" => MotionAction::AttackAnimation {
                target: target(),
                mirror: arg(1).is_some_and(|a| a.eq_ignore_ascii_case("MIRROR")),
            },
            "ENEMY EFFECT" => MotionAction::EnemyEffect {
                target: target(),
                effect: match command.arg_upper(1).as_deref() {
                    Some("WHITEN") => Some(SpriteEffect::Whiten),
                    Some("BLINK") => Some(SpriteEffect::Blink),
                    _ => None,
                },
            },
            "FADE IN" | "FADE OUT" => MotionAction::Fade {
                fade: if command.name == "FADE IN" {
                    Fade::In
                } else {
                    Fade::Out
                },
                frames: frames_or(arg(0), 60),
            },
            "FLASH SCREEN" => parse_flash(command),
            "HIDE BATTLE HUD" => MotionAction::BattleHud(false),
            "SHOW BATTLE HUD" => MotionAction::BattleHud(true),
            "SHAKE SCREEN" => MotionAction::Shake {
                power: arg(0).and_then(parse_int).unwrap_or(5),
                speed: arg(1).and_then(parse_int).unwrap_or(5),
                frames: frames_or(arg(2), 60),
            },
            "TINT SCREEN" => parse_tint(command),
            "WAIT FOR FLOAT" => MotionAction::WaitFor(Wait::Float),
            "WAIT FOR JUMP" => MotionAction::WaitFor(Wait::Jump),
            "WAIT FOR OPACITY" => MotionAction::WaitFor(Wait::Opacity),
            name => {
                let c = PREFIXED.captures(name)?;
                let movers = c[2].to_string();
                match &c[1] {
                    "FACE" => MotionAction::Face {
                        movers,
                        facing: parse_face(command),
                    },
                    "FLOAT" => MotionAction::Float {
                        movers,
                        lift: Lift::parse(arg(0)),
                        frames: frames_or(arg(1), 12),
                    },
                    "JUMP" => MotionAction::Jump {
                        movers,
                        lift: Lift::parse(arg(0)),
                        frames: frames_or(arg(1), 12),
                    },
                    // `MOTION WAIT` belongs to the core pack.
                    "MOTION" if movers == "WAIT" => return None,
                    "MOTION" => MotionAction::Motion {
                        keyword: movers,
                        target: target(),
                    },
                    "MOVE" => MotionAction::Move {
                        movers,
                        to: parse_move(command),
                    },
                    _ => MotionAction::Opacity {
                        movers,
                        opacity: arg(0).and_then(parse_opacity),
                        frames: frames_or(arg(1), 12),
                    },
                }
            }
        };
        Some(action)
    }

    /// The battlers named in the opcode itself, as in `MOVE USER`. These
    /// opcodes only claim a line when the name resolves to someone.
    fn movers(&self) -> Option<&str> {
        match self {
            MotionAction::Face { movers, .. }
            | MotionAction::Float { movers, .. }
            | MotionAction::Jump { movers, .. }
            | MotionAction::Move { movers, .. }
            | MotionAction::Opacity { movers, .. } => Some(movers),
            _ => None,
        }
    }
}

fn parse_flash(command: &Command) -> MotionAction {
    let color = match command.arg_upper(0).as_deref() {
        Some("WHITE") => Some([255, 255, 255, 255]),
        Some("RED") => Some([255, 0, 0, 255]),
        Some("ORANGE") => Some([255, 128, 0, 255]),
        Some("YELLOW") => Some([255, 255, 0, 255]),
        Some("GREEN") => Some([0, 255, 0, 255]),
        Some("BLUE") => Some([0, 128, 255, 255]),
        Some("PURPLE") => Some([128, 64, 255, 255]),
        Some("MAGENTA") => Some([255, 0, 255, 255]),
        Some("BLACK") => Some([0, 0, 0, 255]),
        _ => None,
    };
    match color {
        Some(color) => MotionAction::Flash {
            color,
            frames: frames_or(command.arg(1), 60),
        },
        None => MotionAction::Flash {
            color: custom_color(command),
            frames: frames_or(command.arg(4), 60),
        },
    }
}

fn parse_tint(command: &Command) -> MotionAction {
    let tone = match command.arg_upper(0).as_deref() {
        Some("NORMAL") => Some([0, 0, 0, 0]),
        Some("DARK") => Some([-68, -68, -68, 0]),
        Some("SEPIA") => Some([34, -34, -68, 170]),
        Some("SUNSET") => Some([68, -34, -34, 0]),
        Some("NIGHT") => Some([68, -68, 0, 68]),
        _ => None,
    };
    match tone {
        Some(tone) => MotionAction::Tint {
            tone,
            frames: frames_or(command.arg(1), 60),
        },
        None => MotionAction::Tint {
            tone: custom_color(command),
            frames: frames_or(command.arg(4), 60),
        },
    }
}

fn custom_color(command: &Command) -> [i32; 4] {
    let mut color = [0; 4];
    for (index, channel) in color.iter_mut().enumerate() {
        *channel = command.arg(index).and_then(parse_int).unwrap_or(0);
    }
    color
}

fn point(command: &Command, first: usize) -> DVec2 {
    let coordinate = |index| command.arg(index).and_then(parse_float).unwrap_or(0.);
    DVec2::new(coordinate(first), coordinate(first + 1))
}

fn parse_face(command: &Command) -> FaceTo {
    let Some(keyword) = command.arg_upper(0) else {
        return FaceTo::Nothing;
    };
    match keyword.as_str() {
        "FORWARD" | "NORMAL" => FaceTo::Fixed(Facing::Forward),
        "BACKWARD" | "MIRROR" => FaceTo::Fixed(Facing::Backward),
        "HOME" | "ORIGIN" => FaceTo::Fixed(Facing::Home),
        "AWAY FROM HOME" | "AWAY FROM ORIGIN" => FaceTo::Fixed(Facing::AwayFromHome),
        k if POINT_WORDS.contains(&k) => FaceTo::Point(point(command, 1)),
        k => match k.strip_prefix("AWAY FROM ") {
            Some(rest) if POINT_WORDS.contains(&rest) => {
                FaceTo::AwayFromPoint(point(command, 1))
            }
            Some(rest) => FaceTo::AwayFromGroup(rest.to_string()),
            None => FaceTo::Group(keyword.clone()),
        },
    }
}

fn parse_move(command: &Command) -> MoveTo {
    let Some(keyword) = command.arg_upper(0) else {
        return MoveTo::Nowhere;
    };
    match keyword.as_str() {
        "HOME" | "ORIGIN" => MoveTo::Home {
            frames: frames_or(command.arg(1), 12),
        },
        "RETURN" => MoveTo::Return {
            frames: frames_or(command.arg(1), 12),
        },
        "FORWARD" | "FORWARDS" | "BACKWARD" | "BACKWARDS" => MoveTo::Step {
            distance: command.arg(1).and_then(parse_float),
            backward: keyword.starts_with("BACKWARD"),
            frames: frames_or(command.arg(2), 12),
        },
        k if POINT_WORDS.contains(&k) => MoveTo::Point {
            point: point(command, 1),
            frames: frames_or(command.arg(3), 12),
        },
        _ => MoveTo::Anchor {
            target: keyword.clone(),
            anchor: command.arg(1).and_then(Anchor::parse),
            frames: frames_or(command.arg(2), 12),
        },
    }
}

/// `N%` is a share of full opacity, a bare number is taken as is.
fn parse_opacity(arg: &str) -> Option<u8> {
    let value = match parse_percent(arg) {
        Some(percent) => (percent * 0.01 * 255.).trunc(),
        None => parse_int(arg)? as f64,
    };
    Some(value.clamp(0., 255.) as u8)
}

impl<S: Stage, A: Audio> ActionPack<S, A> for MotionPack {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Option<Signal> {
        let action = MotionAction::parse(command)?;
        let movers = match action.movers() {
            Some(spec) => {
                let movers = targets(battle, context, Some(spec));
                if movers.is_empty() {
                    return None;
                }
                movers
            }
            None => Vec::new(),
        };
        Some(perform(action, movers, battle, context))
    }
}

fn perform<S: Stage, A: Audio>(
    action: MotionAction,
    movers: Vec<BattlerId>,
    battle: &mut Battle<S, A>,
    context: &mut ActionContext,
) -> Signal {
    let subject = context.subject;

    match action {
        MotionAction::AttackAnimation { target, mirror } => {
            let mut group: Vec<BattlerId> = Vec::new();
            for id in targets(battle, context, target.as_deref()) {
                if !group.contains(&id) {
                    group.push(id);
                }
            }
            if !group.is_empty() {
                battle.stage.request(StageRequest::AttackAnimation {
                    subject,
                    targets: group,
                    mirror: mirror && subject.is_actor(),
                });
            }
            Signal::Continue
        }
        MotionAction::EnemyEffect { target, effect } => {
            let Some(effect) = effect else {
                return Signal::Continue;
            };
            for battler in targets(battle, context, target.as_deref()) {
                if battler.is_enemy() {
                    battle
                        .stage
                        .request(StageRequest::Effect { battler, effect });
                }
            }
            Signal::Continue
        }
        MotionAction::Face { facing, .. } => {
            let facing = match facing {
                FaceTo::Fixed(facing) => facing,
                FaceTo::Point(point) => Facing::Toward(point),
                FaceTo::AwayFromPoint(point) => Facing::AwayFrom(point),
                FaceTo::Group(spec) => match average_position(battle, context, &spec) {
                    Some(point) => Facing::Toward(point),
                    None => return Signal::Yield,
                },
                FaceTo::AwayFromGroup(spec) => match average_position(battle, context, &spec) {
                    Some(point) => Facing::AwayFrom(point),
                    None => return Signal::Yield,
                },
                FaceTo::Nothing => return Signal::Continue,
            };
            for battler in movers {
                battle.stage.request(StageRequest::Face { battler, facing });
            }
            Signal::Yield
        }
        MotionAction::Fade { fade, frames } => {
            battle.stage.request(StageRequest::Fade { fade, frames });
            Signal::Yield
        }
        MotionAction::Flash { color, frames } => {
            battle.stage.request(StageRequest::Flash { color, frames });
            Signal::Yield
        }
        MotionAction::Float { lift, frames, .. } => {
            if battle.settings.side_view {
                for battler in movers {
                    let Some(sprite) = battle.stage.sprite(battler) else {
                        continue;
                    };
                    let height = lift.height(sprite.height);
                    battle.stage.request(StageRequest::Float {
                        battler,
                        height,
                        frames,
                    });
                }
            }
            Signal::Yield
        }
        MotionAction::BattleHud(visible) => {
            battle.stage.request(StageRequest::BattleHud { visible });
            Signal::Yield
        }
        MotionAction::Jump { lift, frames, .. } => {
            if battle.settings.side_view {
                for battler in movers {
                    let Some(sprite) = battle.stage.sprite(battler) else {
                        continue;
                    };
                    let height = lift.height(sprite.height);
                    battle.stage.request(StageRequest::Jump {
                        battler,
                        height,
                        frames,
                    });
                }
            }
            Signal::Continue
        }
        MotionAction::Motion { keyword, target } => {
            let movers = targets(battle, context, target.as_deref());
            if movers.is_empty() {
                return Signal::Continue;
            }
            if keyword == "ATTACK" {
                for battler in movers {
                    battle.stage.request(StageRequest::PerformAttack(battler));
                }
                return Signal::Yield;
            }

            let motion = Motion::from_keyword(&keyword).unwrap_or(Motion::Wait);
            for battler in movers {
                battle
                    .stage
                    .request(StageRequest::Motion { battler, motion });
            }
            Signal::Yield
        }
        MotionAction::Move { to, .. } => {
            if !battle.settings.side_view {
                return Signal::Continue;
            }
            move_movers(battle, context, movers, to)
        }
        MotionAction::Opacity {
            opacity, frames, ..
        } => {
            let Some(opacity) = opacity else {
                return Signal::Yield;
            };
            for battler in movers {
                battle.stage.request(StageRequest::Opacity {
                    battler,
                    opacity,
                    frames,
                });
            }
            Signal::Yield
        }
        MotionAction::Shake {
            power,
            speed,
            frames,
        } => {
            battle.stage.request(StageRequest::Shake {
                power,
                speed,
                frames,
            });
            Signal::Yield
        }
        MotionAction::Tint { tone, frames } => {
            battle.stage.request(StageRequest::Tint { tone, frames });
            Signal::Yield
        }
        MotionAction::WaitFor(wait) => Signal::Wait(wait),
    }
}

fn move_movers<S: Stage, A: Audio>(
    battle: &mut Battle<S, A>,
    context: &ActionContext,
    movers: Vec<BattlerId>,
    to: MoveTo,
) -> Signal {
    let (destination, frames, motion, facing) = match to {
        MoveTo::Home { frames } => (
            Destination::Home,
            frames,
            Some(Motion::Walk),
            Some(Facing::Home),
        ),
        MoveTo::Return { frames } => (
            Destination::Home,
            frames,
            Some(Motion::Evade),
            Some(Facing::Forward),
        ),
        MoveTo::Step {
            distance,
            backward,
            frames,
        } => {
            let distance = distance.unwrap_or(battle.settings.step_distance);
            let (distance, facing) = if backward {
                (-distance, Facing::Backward)
            } else {
                (distance, Facing::Forward)
            };
            (
                Destination::Forward(distance),
                frames,
                Some(Motion::Walk),
                Some(facing),
            )
        }
        MoveTo::Point { point, frames } => (
            Destination::Point(point),
            frames,
            Some(Motion::Walk),
            Some(Facing::Toward(point)),
        ),
        MoveTo::Anchor {
            target,
            anchor,
            frames,
        } => {
            let group = targets(battle, context, Some(target.as_str()));
            let footprints = battle.ground_footprints(&group);
            let Some(anchor) = anchor.filter(|_| !footprints.is_empty()) else {
                debug!("nowhere to move {:?}", target);
                return Signal::Yield;
            };

            // Movers' half widths carry them to the near edge of the group.
            let reach: f64 = movers
                .iter()
                .filter_map(|&id| battle.stage.sprite(id).map(|s| (id, s)))
                .filter(|(_, sprite)| sprite.can_move)
                .map(|(id, sprite)| {
                    if id.is_actor() {
                        sprite.width / 2.
                    } else {
                        -sprite.width / 2.
                    }
                })
                .sum();

            let bounds = battle.settings.bounds;
            let (Some(x), Some(y)) = (
                anchor_x(&footprints, anchor.x, bounds, reach),
                anchor_y(&footprints, anchor.y, bounds),
            ) else {
                return Signal::Yield;
            };
            let point = DVec2::new(x, y);
            (
                Destination::Point(point),
                frames,
                None,
                Some(Facing::Toward(point)),
            )
        }
        MoveTo::Nowhere => return Signal::Continue,
    };

    for battler in movers {
        battle.stage.request(StageRequest::Move {
            battler,
            destination,
            frames,
        });
        if let Some(motion) = motion {
            battle
                .stage
                .request(StageRequest::Motion { battler, motion });
        }
        if let Some(facing) = facing {
            battle.stage.request(StageRequest::Face { battler, facing });
        }
    }
    Signal::Continue
}

/// The mean ground position of a group's sprites.
fn average_position<S: Stage, A: Audio>(
    battle: &Battle<S, A>,
    context: &ActionContext,
    spec: &str,
) -> Option<DVec2> {
    let group = targets(battle, context, Some(spec));
    let footprints = battle.ground_footprints(&group);
    if footprints.is_empty() {
        return None;
    }
    let sum: DVec2 = footprints.iter().map(|f| f.position).sum();
    Some(sum / footprints.len() as f64)
}
