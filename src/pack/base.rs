use super::targets;
use crate::{
    battle::Battle,
    host::{Audio, Performance, Stage, StageRequest},
    interpreter::{ActionContext, ActionPack, Signal, Wait},
    notetag::ItemRef,
    script::{parse_bool, parse_int, Command},
};
use tracing::debug;

/// The opcodes every action sequence relies on: waits, the death break, and
/// the steps of the default sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorePack;

#[derive(Clone, Debug, PartialEq)]
enum CoreAction {
    Wait(u32),
    WaitFor(Wait),
    MotionWait(Option<String>),
    DeathBreak,
    DisplayAction,
    ClearBattleLog,
    Perform(Performance),
    CastAnimation,
    ActionAnimation {
        target: Option<String>,
        mirror: bool,
    },
    ActionEffect(Option<String>),
    Immortal {
        target: Option<String>,
        immortal: bool,
    },
}

impl CoreAction {
    fn parse(command: &Command) -> Option<Self> {
        let target = || command.arg(0).map(str::to_string);

        let action = match command.name.as_str() {
            "WAIT" => {
                let frames = command.arg(0).and_then(parse_int).unwrap_or(0);
                CoreAction::Wait(frames.max(0) as u32)
            }
            "WAIT FOR ANIMATION" => CoreAction::WaitFor(Wait::Animation),
            "WAIT FOR EFFECT" => CoreAction::WaitFor(Wait::Effect),
            "WAIT FOR MOVEMENT" => CoreAction::WaitFor(Wait::Movement),
            "WAIT FOR NEW LINE" => CoreAction::WaitFor(Wait::NewLine),
            "WAIT FOR POPUPS" => CoreAction::WaitFor(Wait::Popups),
            "MOTION WAIT" => CoreAction::MotionWait(target()),
            "DEATH BREAK" => CoreAction::DeathBreak,
            "DISPLAY ACTION" => CoreAction::DisplayAction,
            "CLEAR BATTLE LOG" => CoreAction::ClearBattleLog,
            "PERFORM START" => CoreAction::Perform(Performance::Start),
            "PERFORM ACTION" => CoreAction::Perform(Performance::Action),
            "PERFORM FINISH" => CoreAction::Perform(Performance::Finish),
            "CAST ANIMATION" => CoreAction::CastAnimation,
            "ACTION ANIMATION" => CoreAction::ActionAnimation {
                target: target(),
                mirror: command
                    .arg(1)
                    .is_some_and(|a| a.eq_ignore_ascii_case("MIRROR")),
            },
            "ACTION EFFECT" => CoreAction::ActionEffect(target()),
            "IMMORTAL" => CoreAction::Immortal {
                target: target(),
                immortal: command.arg(1).and_then(parse_bool).unwrap_or(false),
            },
            _ => return None,
        };
        Some(action)
    }
}

impl<S: Stage, A: Audio> ActionPack<S, A> for CorePack {
    fn name(&self) -> &'static str {
        "core"
    }

    fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Option<Signal> {
        let action = CoreAction::parse(command)?;
        Some(perform(action, battle, context))
    }
}

fn perform<S: Stage, A: Audio>(
    action: CoreAction,
    battle: &mut Battle<S, A>,
    context: &mut ActionContext,
) -> Signal {
    let subject = context.subject;

    match action {
        CoreAction::Wait(frames) => Signal::Wait(Wait::Frames(frames)),
        CoreAction::WaitFor(wait) => Signal::Wait(wait),
        CoreAction::MotionWait(target) => {
            let battlers = targets(battle, context, target.as_deref());
            if battlers.is_empty() {
                return Signal::Continue;
            }
            Signal::Wait(Wait::Motion(battlers))
        }
        CoreAction::DeathBreak => {
            let fallen = battle
                .roster
                .get(subject)
                .map_or(true, |b| b.is_dead() || b.hp <= 0);
            if fallen {
                debug!("{} has fallen, breaking the action", subject);
                return Signal::Abort;
            }
            Signal::Continue
        }
        CoreAction::DisplayAction => {
            battle.stage.request(StageRequest::DisplayAction {
                subject,
                item: context.item,
            });
            Signal::Continue
        }
        CoreAction::ClearBattleLog => {
            battle.stage.request(StageRequest::ClearLog);
            Signal::Continue
        }
        CoreAction::Perform(performance) => {
            battle.stage.request(StageRequest::Perform {
                battler: subject,
                performance,
            });
            match performance {
                Performance::Start => Signal::Continue,
                Performance::Action => Signal::Yield,
                Performance::Finish => {
                    if battle.settings.side_view {
                        battle.camera.reset(battle.settings.bounds, 30);
                        battle.camera.start_zoom(1., 30);
                    }
                    Signal::Continue
                }
            }
        }
        CoreAction::CastAnimation => {
            // Only skills carry a cast animation.
            if matches!(context.item, ItemRef::Skill(_)) {
                battle.stage.request(StageRequest::CastAnimation {
                    subject,
                    item: context.item,
                });
            }
            Signal::Continue
        }
        CoreAction::ActionAnimation { target, mirror } => {
            let group = match target {
                Some(target) => targets(battle, context, Some(target.as_str())),
                None => context.targets.clone(),
            };
            let animation_id = battle
                .database
                .get(context.item)
                .map_or(0, |item| item.animation_id);
            if group.is_empty() || animation_id == 0 {
                return Signal::Continue;
            }

            let mut unique = Vec::with_capacity(group.len());
            for id in group {
                if !unique.contains(&id) {
                    unique.push(id);
                }
            }
            battle.stage.request(StageRequest::Animation {
                targets: unique,
                animation_id,
                mirror,
            });
            Signal::Continue
        }
        CoreAction::ActionEffect(target) => {
            let group = match target {
                Some(target) => targets(battle, context, Some(target.as_str())),
                None => context.targets.clone(),
            };
            for target in group {
                battle.stage.request(StageRequest::ActionEffect {
                    subject,
                    target,
                    item: context.item,
                });
                battle.apply_cooldown_changes(target, context.item);
            }
            Signal::Continue
        }
        CoreAction::Immortal { target, immortal } => {
            for id in targets(battle, context, target.as_deref()) {
                let Some(battler) = battle.roster.get_mut(id) else {
                    continue;
                };
                let already_dead = battler.is_dead();
                battler.set_immortal(immortal);
                if !already_dead && battler.is_dead() && battler.mark_collapsed() {
                    battle.stage.request(StageRequest::Collapse(id));
                }
            }
            Signal::Continue
        }
    }
}
