use crate::{
    battle::{BattlerId, Side},
    settings::Bounds,
};
use glam::DVec2;
use serde::Serialize;

/// Horizontal part of an anchor. Front is the side of a battler facing its
/// opponents.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum AnchorX {
    Front,
    Middle,
    Back,
}

/// Vertical part of an anchor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum AnchorY {
    Base,
    Middle,
    Top,
}

/// A point on a group of battler sprites, e.g. `FRONT BASE` or `HEAD`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Anchor {
    pub x: AnchorX,
    pub y: AnchorY,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor {
        x: AnchorX::Middle,
        y: AnchorY::Middle,
    };

    /// Parses a movement anchor. A bare `FRONT` or `BACK` means the base.
    pub fn parse(keyword: &str) -> Option<Self> {
        Self::parse_with(keyword, AnchorY::Base)
    }

    /// Parses a camera focus anchor. A bare `FRONT` or `BACK` means the
    /// middle, and anything unrecognised is the center.
    pub fn parse_focus(keyword: &str) -> Self {
        Self::parse_with(keyword, AnchorY::Middle).unwrap_or(Self::CENTER)
    }

    fn parse_with(keyword: &str, bare: AnchorY) -> Option<Self> {
        let keyword = keyword.trim().to_uppercase();
        let mut words = keyword.split_whitespace();
        let first = words.next()?;

        let (x, rest) = match first {
            "FRONT" => (AnchorX::Front, words.next()),
            "BACK" => (AnchorX::Back, words.next()),
            _ => (AnchorX::Middle, Some(first)),
        };
        if words.next().is_some() {
            return None;
        }

        let y = match rest {
            None => bare,
            Some("BASE" | "FOOT" | "FEET") => AnchorY::Base,
            Some("CENTER" | "MIDDLE") => AnchorY::Middle,
            Some("HEAD" | "TOP") => AnchorY::Top,
            Some(_) => return None,
        };

        Some(Self { x, y })
    }
}

/// Where a battler's sprite stands, as used for anchor math.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub side: Side,
    /// Horizontal center and vertical base of the sprite.
    pub position: DVec2,
    pub width: f64,
    pub height: f64,
}

/// The horizontal anchor of a group. `reach` pushes the front point further
/// toward the group's opponents and the back point further away.
///
/// Extremes are scaled by the group size before the shared division, so
/// they come out as the plain extreme.
pub fn anchor_x(group: &[Footprint], anchor: AnchorX, bounds: Bounds, reach: f64) -> Option<f64> {
    if group.is_empty() {
        return None;
    }
    let len = group.len() as f64;

    let value = match anchor {
        AnchorX::Middle => group.iter().map(|f| f.position.x).sum(),
        AnchorX::Front => {
            let front = group.iter().fold(0f64, |value, f| {
                let offset = match f.side {
                    Side::Actor => -f.width / 2.,
                    Side::Enemy => f.width / 2.,
                };
                value.max(f.position.x + offset + reach)
            });
            front * len
        }
        AnchorX::Back => {
            let back = group.iter().fold(bounds.width, |value, f| {
                let offset = match f.side {
                    Side::Actor => f.width / 2.,
                    Side::Enemy => -f.width / 2.,
                };
                value.min(f.position.x + offset - reach)
            });
            back * len
        }
    };

    Some(value / len)
}

/// The vertical anchor of a group.
pub fn anchor_y(group: &[Footprint], anchor: AnchorY, bounds: Bounds) -> Option<f64> {
    if group.is_empty() {
        return None;
    }
    let len = group.len() as f64;

    let value = match anchor {
        AnchorY::Base => group.iter().fold(0f64, |value, f| value.max(f.position.y)) * len,
        AnchorY::Middle => group.iter().map(|f| f.position.y - f.height / 2.).sum(),
        AnchorY::Top => {
            group
                .iter()
                .fold(bounds.height, |value, f| value.min(f.position.y - f.height))
                * len
        }
    };

    Some(value / len)
}

/// The battle camera: where it looks, what it follows, and its zoom.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Camera {
    /// The point looked at when nothing is focused.
    pub goal: DVec2,
    /// Added to the goal or focus point.
    pub offset: DVec2,
    /// Battlers followed by the camera. Empty for none.
    pub focus: Vec<BattlerId>,
    pub focus_anchor: Anchor,
    /// Whether the view is kept inside the battle field.
    pub clamp: bool,
    /// Frames left to reach the target.
    pub duration: u32,
    /// The point currently looked at.
    pub position: DVec2,
    pub zoom: f64,
    pub zoom_target: f64,
    pub zoom_duration: u32,
}

impl Camera {
    pub fn new(bounds: Bounds) -> Self {
        let center = DVec2::new(bounds.width / 2., bounds.height / 2.);
        Self {
            goal: center,
            offset: DVec2::ZERO,
            focus: Vec::new(),
            focus_anchor: Anchor::CENTER,
            clamp: true,
            duration: 0,
            position: center,
            zoom: 1.,
            zoom_target: 1.,
            zoom_duration: 0,
        }
    }

    /// Returns to the field center with no offset or focus, panning over
    /// `duration` frames.
    pub fn reset(&mut self, bounds: Bounds, duration: u32) {
        self.goal = DVec2::new(bounds.width / 2., bounds.height / 2.);
        self.offset = DVec2::ZERO;
        self.focus.clear();
        self.focus_anchor = Anchor::CENTER;
        self.clamp = true;
        self.duration = duration;
    }

    /// Follows `group`. An empty group leaves the camera untouched.
    pub fn focus_on(&mut self, group: Vec<BattlerId>, anchor: Anchor, duration: u32) {
        if group.is_empty() {
            return;
        }
        self.focus = group;
        self.focus_anchor = anchor;
        self.duration = duration;
    }

    /// Heads for `goal` over `duration` frames. A focus group still takes
    /// precedence over the goal.
    pub fn pan_to(&mut self, goal: DVec2, duration: u32) {
        self.goal = goal;
        self.duration = duration;
    }

    pub fn start_zoom(&mut self, scale: f64, duration: u32) {
        self.zoom_target = scale;
        self.zoom_duration = duration;
    }

    #[inline]
    pub fn is_panning(&self) -> bool {
        self.duration > 0
    }

    #[inline]
    pub fn is_zooming(&self) -> bool {
        self.zoom_duration > 0
    }

    /// The focus group's anchor point, given the group's footprints.
    pub fn focus_point(&self, group: &[Footprint], bounds: Bounds) -> Option<DVec2> {
        let x = anchor_x(group, self.focus_anchor.x, bounds, 0.)?;
        let y = anchor_y(group, self.focus_anchor.y, bounds)?;
        Some(DVec2::new(x, y))
    }

    /// Where the camera is heading: the focus point if there is one,
    /// otherwise the goal, plus the offset.
    pub fn target(&self, focus_point: Option<DVec2>) -> DVec2 {
        let base = match focus_point {
            Some(point) if !self.focus.is_empty() => point,
            _ => self.goal,
        };
        base + self.offset
    }

    /// Advances one frame toward `target` and the zoom target.
    pub fn update(&mut self, target: DVec2) {
        if self.duration > 0 {
            let d = self.duration as f64;
            self.position = (self.position * (d - 1.) + target) / d;
            self.duration -= 1;
        } else {
            self.position = target;
        }

        if self.zoom_duration > 0 {
            let d = self.zoom_duration as f64;
            self.zoom = (self.zoom * (d - 1.) + self.zoom_target) / d;
            self.zoom_duration -= 1;
        }
    }

    /// The screen origin of the battle field for the current position and
    /// zoom.
    pub fn viewport(&self, bounds: Bounds) -> DVec2 {
        let zoom = self.zoom;
        let screen = DVec2::new(
            -self.position.x * zoom + bounds.width / 2.,
            -self.position.y * zoom + bounds.height / 2.,
        );

        let origin = if self.clamp && zoom >= 1. {
            let min = DVec2::new(
                -bounds.width * zoom + bounds.width,
                -bounds.height * zoom + bounds.height,
            );
            screen.clamp(min, DVec2::ZERO)
        } else if self.clamp {
            DVec2::new(
                (bounds.width - bounds.width * zoom) / 2.,
                (bounds.height - bounds.height * zoom) / 2.,
            )
        } else {
            screen
        };

        origin.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn footprint(side: Side, x: f64, y: f64) -> Footprint {
        Footprint {
            side,
            position: DVec2::new(x, y),
            width: 64.,
            height: 96.,
        }
    }

    #[test]
    fn test_parse_anchors() {
        assert_eq!(
            Anchor::parse("front feet"),
            Some(Anchor {
                x: AnchorX::Front,
                y: AnchorY::Base
            })
        );
        assert_eq!(
            Anchor::parse("FRONT"),
            Some(Anchor {
                x: AnchorX::Front,
                y: AnchorY::Base
            })
        );
        assert_eq!(
            Anchor::parse_focus("FRONT"),
            Anchor {
                x: AnchorX::Front,
                y: AnchorY::Middle
            }
        );
        assert_eq!(
            Anchor::parse("head"),
            Some(Anchor {
                x: AnchorX::Middle,
                y: AnchorY::Top
            })
        );
        assert_eq!(Anchor::parse("sideways"), None);
        assert_eq!(Anchor::parse_focus("sideways"), Anchor::CENTER);
    }

    #[test]
    fn test_group_anchors() {
        let bounds = Bounds::default();
        let group = [footprint(Side::Enemy, 200., 300.), footprint(Side::Enemy, 300., 350.)];

        assert_eq!(anchor_x(&group, AnchorX::Middle, bounds, 0.), Some(250.));
        assert_eq!(anchor_x(&group, AnchorX::Front, bounds, 0.), Some(332.));
        assert_eq!(anchor_x(&group, AnchorX::Back, bounds, 0.), Some(168.));
        assert_eq!(anchor_y(&group, AnchorY::Base, bounds), Some(350.));
        assert_eq!(anchor_y(&group, AnchorY::Middle, bounds), Some(277.));
        assert_eq!(anchor_y(&group, AnchorY::Top, bounds), Some(204.));
        assert_eq!(anchor_y(&[], AnchorY::Top, bounds), None);
    }

    #[test]
    fn test_actor_front_faces_left() {
        let bounds = Bounds::default();
        let group = [footprint(Side::Actor, 600., 300.)];
        assert_eq!(anchor_x(&group, AnchorX::Front, bounds, 0.), Some(568.));
        assert_eq!(anchor_x(&group, AnchorX::Back, bounds, 0.), Some(632.));
    }

    #[test]
    fn test_pan_reaches_target_after_duration() {
        let bounds = Bounds::default();
        let mut camera = Camera::new(bounds);
        camera.goal = DVec2::new(100., 200.);
        camera.duration = 4;

        camera.update(camera.target(None));
        assert_eq!(camera.position, DVec2::new(331., 284.));
        for _ in 0..3 {
            camera.update(camera.target(None));
        }
        assert_eq!(camera.position, DVec2::new(100., 200.));
        assert!(!camera.is_panning());
    }

    #[test]
    fn test_focus_ignores_empty_groups() {
        let mut camera = Camera::new(Bounds::default());
        camera.focus_on(Vec::new(), Anchor::CENTER, 30);
        assert!(!camera.is_panning());
    }

    #[test]
    fn test_zoom_eases() {
        let mut camera = Camera::new(Bounds::default());
        camera.start_zoom(2., 2);
        camera.update(camera.position);
        assert_eq!(camera.zoom, 1.5);
        camera.update(camera.position);
        assert_eq!(camera.zoom, 2.);
        assert!(!camera.is_zooming());
    }

    #[test]
    fn test_viewport_clamps() {
        let bounds = Bounds::default();
        let mut camera = Camera::new(bounds);
        assert_eq!(camera.viewport(bounds), DVec2::ZERO);

        camera.zoom = 2.;
        camera.position = DVec2::new(0., 0.);
        assert_eq!(camera.viewport(bounds), DVec2::ZERO);
        camera.position = DVec2::new(816., 624.);
        assert_eq!(camera.viewport(bounds), DVec2::new(-816., -624.));

        camera.zoom = 0.5;
        assert_eq!(camera.viewport(bounds), DVec2::new(204., 156.));

        camera.clamp = false;
        camera.zoom = 1.;
        camera.position = DVec2::new(0., 0.);
        assert_eq!(camera.viewport(bounds), DVec2::new(408., 312.));
    }
}
