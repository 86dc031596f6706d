use super::targets;
use crate::{
    battle::Battle,
    camera::{anchor_x, anchor_y, Anchor},
    host::{Audio, Stage},
    interpreter::{ActionContext, ActionPack, Signal, Wait},
    script::{frames_or, parse_float, parse_percent, Command},
};
use glam::DVec2;
use tracing::trace;

/// Battle camera control. Camera commands only take effect in side view
/// battles with the battle camera option turned on.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraPack;

#[derive(Clone, Debug, PartialEq)]
enum CameraAction {
    Clamp(bool),
    Focus {
        target: Option<String>,
        anchor: Anchor,
        frames: u32,
    },
    Offset {
        direction: Option<Direction>,
        amount: f64,
    },
    Pan {
        direction: Option<Direction>,
        amount: f64,
        frames: u32,
    },
    Screen(Screen),
    ResetCamera(u32),
    ResetZoom(u32),
    WaitFor(Wait),
    Zoom {
        scale: f64,
        frames: u32,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn parse(arg: Option<String>) -> Option<Self> {
        match arg?.as_str() {
            "LEFT" => Some(Direction::Left),
            "RIGHT" => Some(Direction::Right),
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            _ => None,
        }
    }

    fn unit(self) -> DVec2 {
        match self {
            Direction::Left => DVec2::NEG_X,
            Direction::Right => DVec2::X,
            Direction::Up => DVec2::NEG_Y,
            Direction::Down => DVec2::Y,
        }
    }
}

/// Where `CAMERA SCREEN` points the camera.
#[derive(Clone, Debug, PartialEq)]
enum Screen {
    /// A named spot, as a fraction of the field size.
    Fixed { spot: DVec2, frames: u32 },
    Point { point: DVec2, frames: u32 },
    Group {
        target: String,
        anchor: Option<Anchor>,
        frames: u32,
    },
    Nowhere,
}

impl Screen {
    fn parse(command: &Command) -> Self {
        let Some(keyword) = command.arg_upper(0) else {
            return Screen::Nowhere;
        };
        let spot = match keyword.as_str() {
            "TOP LEFT" | "UPPER LEFT" => Some((0., 0.)),
            "FAR LEFT" | "ABSOLUTE LEFT" => Some((0., 0.5)),
            "BOTTOM LEFT" | "LOWER LEFT" => Some((0., 1.)),
            "TOP CENTER" | "UPPER CENTER" => Some((0.5, 0.)),
            "CENTER" | "MIDDLE" => Some((0.5, 0.5)),
            "BOTTOM CENTER" | "LOWER CENTER" => Some((0.5, 1.)),
            "TOP RIGHT" | "UPPER RIGHT" => Some((1., 0.)),
            "FAR RIGHT" | "ABSOLUTE RIGHT" => Some((1., 0.5)),
            "BOTTOM RIGHT" | "LOWER RIGHT" => Some((1., 1.)),
            _ => None,
        };
        if let Some((x, y)) = spot {
            return Screen::Fixed {
                spot: DVec2::new(x, y),
                frames: frames_or(command.arg(1), 30),
            };
        }

        match keyword.as_str() {
            "POINT" | "POSITION" | "COORDINATE" | "COORDINATES" | "SCREEN" | "SCREEN POS" => {
                let coordinate = |index| command.arg(index).and_then(parse_float).unwrap_or(0.);
                Screen::Point {
                    point: DVec2::new(coordinate(1), coordinate(2)),
                    frames: frames_or(command.arg(3), 30),
                }
            }
            _ => Screen::Group {
                target: keyword.clone(),
                anchor: command.arg(1).and_then(Anchor::parse),
                frames: frames_or(command.arg(2), 30),
            },
        }
    }
}

/// A distance argument. Missing or zero distances are 100 pixels.
fn distance(arg: Option<&str>) -> f64 {
    match arg.and_then(parse_float) {
        Some(value) if value != 0. => value,
        _ => 100.,
    }
}

/// `N%` or a plain scale. Zero and nonsense mean no zoom.
fn zoom_scale(arg: Option<&str>) -> f64 {
    let scale = arg.and_then(|a| match parse_percent(a) {
        Some(percent) => Some(percent * 0.01),
        None => parse_float(a),
    });
    match scale {
        Some(scale) if scale != 0. => scale,
        _ => 1.,
    }
}

impl CameraAction {
    fn parse(command: &Command) -> Option<Self> {
        let action = match command.name.as_str() {
            "CAMERA CLAMP ON" => CameraAction::Clamp(true),
            "CAMERA CLAMP OFF" => CameraAction::Clamp(false),
            "CAMERA FOCUS" | "FOCUS CAMERA" => CameraAction::Focus {
                target: command.arg(0).map(str::to_string),
                anchor: Anchor::parse_focus(command.arg(1).unwrap_or("CENTER")),
                frames: frames_or(command.arg(2), 30),
            },
            "CAMERA OFFSET" | "OFFSET CAMERA" => CameraAction::Offset {
                direction: Direction::parse(command.arg_upper(0)),
                amount: distance(command.arg(1)),
            },
            "CAMERA PAN" | "PAN CAMERA" => CameraAction::Pan {
                direction: Direction::parse(command.arg_upper(0)),
                amount: distance(command.arg(1)),
                frames: frames_or(command.arg(2), 30),
            },
            "CAMERA SCREEN" => CameraAction::Screen(Screen::parse(command)),
            "RESET CAMERA" => CameraAction::ResetCamera(frames_or(command.arg(0), 30)),
            "RESET ZOOM" => CameraAction::ResetZoom(frames_or(command.arg(0), 30)),
            "WAIT FOR CAMERA" => CameraAction::WaitFor(Wait::Camera),
            "WAIT FOR ZOOM" => CameraAction::WaitFor(Wait::Zoom),
            "ZOOM" => CameraAction::Zoom {
                scale: zoom_scale(command.arg(0)),
                frames: frames_or(command.arg(1), 30),
            },
            _ => return None,
        };
        Some(action)
    }
}

impl<S: Stage, A: Audio> ActionPack<S, A> for CameraPack {
    fn name(&self) -> &'static str {
        "camera"
    }

    fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Option<Signal> {
        let action = CameraAction::parse(command)?;
        Some(perform(action, battle, context))
    }
}

fn perform<S: Stage, A: Audio>(
    action: CameraAction,
    battle: &mut Battle<S, A>,
    context: &mut ActionContext,
) -> Signal {
    let settings = &battle.settings;
    let bounds = settings.bounds;

    match action {
        CameraAction::ResetCamera(frames) => {
            if settings.side_view {
                battle.camera.reset(bounds, frames);
            }
            return Signal::Continue;
        }
        CameraAction::ResetZoom(frames) => {
            if settings.side_view {
                battle.camera.start_zoom(1., frames);
            }
            return Signal::Continue;
        }
        CameraAction::WaitFor(wait) => {
            if !settings.battle_camera {
                return Signal::Continue;
            }
            return Signal::Wait(wait);
        }
        _ if !settings.camera_enabled() => {
            trace!("battle camera is off, skipping {:?}", action);
            return Signal::Continue;
        }
        _ => {}
    }

    let camera = &mut battle.camera;
    match action {
        CameraAction::Clamp(clamp) => camera.clamp = clamp,
        CameraAction::Focus {
            target,
            anchor,
            frames,
        } => {
            let group = targets(battle, context, target.as_deref());
            if group.is_empty() {
                return Signal::Yield;
            }
            battle.camera.focus_on(group, anchor, frames);
        }
        CameraAction::Offset { direction, amount } => match direction {
            Some(Direction::Left | Direction::Right) => {
                camera.offset.x = direction.map_or(0., |d| d.unit().x) * amount;
            }
            Some(Direction::Up | Direction::Down) => {
                camera.offset.y = direction.map_or(0., |d| d.unit().y) * amount;
            }
            None => {}
        },
        CameraAction::Pan {
            direction,
            amount,
            frames,
        } => {
            let shift = direction.map_or(DVec2::ZERO, |d| d.unit() * amount);
            let goal = camera.goal + shift;
            camera.pan_to(goal, frames);
        }
        CameraAction::Screen(screen) => match screen {
            Screen::Fixed { spot, frames } => {
                camera.pan_to(spot * DVec2::new(bounds.width, bounds.height), frames);
            }
            Screen::Point { point, frames } => camera.pan_to(point, frames),
            Screen::Group {
                target,
                anchor,
                frames,
            } => {
                let group = targets(battle, context, Some(target.as_str()));
                let footprints = battle.camera_footprints(&group);
                if footprints.is_empty() {
                    return Signal::Yield;
                }
                let Some(anchor) = anchor else {
                    return Signal::Continue;
                };
                let (Some(x), Some(y)) = (
                    anchor_x(&footprints, anchor.x, bounds, 0.),
                    anchor_y(&footprints, anchor.y, bounds),
                ) else {
                    return Signal::Continue;
                };
                battle.camera.pan_to(DVec2::new(x, y), frames);
            }
            Screen::Nowhere => {}
        },
        CameraAction::Zoom { scale, frames } => camera.start_zoom(scale, frames),
        CameraAction::ResetCamera(_) | CameraAction::ResetZoom(_) | CameraAction::WaitFor(_) => {}
    }
    Signal::Continue
}
