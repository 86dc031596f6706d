//! Plays a skill or item from start to finish.
//!
//! An action runs its five phases in order. The target phase runs once per
//! declared target with the context narrowed to that one battler. A
//! `DEATH BREAK` abort drops the remaining targets and carries on with the
//! follow and finish phases.

use crate::{
    battle::{Battle, BattlerId},
    host::{Audio, Stage},
    interpreter::{ActionContext, Interpreter, PackChain, State},
    notetag::{ActionSequence, Phase},
};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionRunner {
    sequence: ActionSequence,
    /// The context handed to the interpreter.
    context: ActionContext,
    /// Targets as declared, restored after the target phase.
    declared: Vec<BattlerId>,
    /// Targets still to go through the target phase.
    pending: VecDeque<BattlerId>,
    phase: Option<Phase>,
    interpreter: Interpreter,
}

impl ActionRunner {
    /// Puts the subject's skills on cooldown and loads the setup phase.
    pub fn start<S: Stage, A: Audio>(battle: &mut Battle<S, A>, context: ActionContext) -> Self {
        let sequence = battle
            .database
            .sequence(context.item)
            .cloned()
            .unwrap_or_default();
        battle.pay_cooldowns(context.subject, context.item);
        debug!("{} starts {}", context.subject, context.item);

        let mut runner = Self {
            sequence,
            declared: context.targets.clone(),
            pending: VecDeque::new(),
            context,
            phase: None,
            interpreter: Interpreter::default(),
        };
        runner.enter(Phase::Setup);
        runner
    }

    /// The phase being played, or `None` once the action is over.
    #[inline]
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    #[inline]
    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase.is_none()
    }

    /// Runs one frame. A phase that completes hands over to the next one
    /// within the same frame.
    pub fn update<S: Stage, A: Audio>(
        &mut self,
        battle: &mut Battle<S, A>,
        chain: &PackChain<S, A>,
    ) {
        while let Some(phase) = self.phase {
            match self.interpreter.update(battle, &mut self.context, chain) {
                State::Completed => self.advance(battle, phase),
                State::Aborted => {
                    debug!("{} phase aborted, dropping targets", phase);
                    self.declared.clear();
                    self.pending.clear();
                    self.context.targets.clear();
                    let next = match phase {
                        Phase::Setup | Phase::Whole | Phase::Target => Phase::Target,
                        other => other,
                    };
                    self.advance(battle, next);
                }
                _ => break,
            }
        }
    }

    /// Steps both the battle and the action until the action is over or
    /// `max_frames` pass. Returns the frames it took.
    pub fn run_to_end<S: Stage, A: Audio>(
        &mut self,
        battle: &mut Battle<S, A>,
        chain: &PackChain<S, A>,
        max_frames: u64,
    ) -> u64 {
        let mut frames = 0;
        while !self.is_finished() {
            if frames >= max_frames {
                warn!(
                    "action still in its {:?} phase after {} frames",
                    self.phase, frames
                );
                break;
            }
            battle.update();
            self.update(battle, chain);
            frames += 1;
        }
        frames
    }

    fn advance<S: Stage, A: Audio>(&mut self, battle: &mut Battle<S, A>, finished: Phase) {
        let next = match finished {
            Phase::Whole => {
                self.pending = self.declared.iter().copied().collect();
                Some(Phase::Target)
            }
            Phase::Target if !self.pending.is_empty() => Some(Phase::Target),
            other => other.next(),
        };

        match next {
            Some(Phase::Target) => match self.pending.pop_front() {
                Some(target) => {
                    self.context.targets = vec![target];
                    self.enter(Phase::Target);
                }
                None => {
                    self.context.targets = self.declared.clone();
                    self.enter(Phase::Follow);
                }
            },
            Some(Phase::Follow) => {
                self.context.targets = self.declared.clone();
                self.enter(Phase::Follow);
            }
            Some(phase) => self.enter(phase),
            None => {
                debug!("{} finished {}", self.context.subject, self.context.item);
                self.phase = None;
                battle.camera.reset(battle.settings.bounds, 30);
                battle.camera.start_zoom(1., 30);
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!("entering {} phase", phase);
        self.phase = Some(phase);
        self.interpreter.load(self.sequence.phase(phase).clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        battle::Pool,
        database::UsableItem,
        host::{HeadlessMixer, HeadlessStage, StageRequest},
        notetag::ItemRef,
        testing::{self, BAT, HERO, SLIME},
    };
    use pretty_assertions::assert_eq;

    const PHASES: &str = "\
<setup action>
common event: 1
</setup action>
<whole action>
common event: 2
</whole action>
<target action>
common event: 3
death break
</target action>
<follow action>
common event: 4
</follow action>
<finish action>
common event: 5
</finish action>";

    fn battle_with(note: &str) -> Battle<HeadlessStage, HeadlessMixer> {
        let mut battle = testing::battle();
        battle
            .database
            .insert_skill(UsableItem::new(20, "Sweep", 1, 0, note).unwrap());
        battle
    }

    #[test]
    fn test_phases_run_in_order_per_target() {
        let mut battle = battle_with(PHASES);
        let chain = PackChain::standard();
        let context = ActionContext::new(HERO, vec![SLIME, BAT], ItemRef::Skill(20));

        let mut runner = ActionRunner::start(&mut battle, context);
        assert_eq!(runner.phase(), Some(Phase::Setup));
        runner.run_to_end(&mut battle, &chain, 600);

        assert!(runner.is_finished());
        assert_eq!(battle.common_events, vec![1, 2, 3, 3, 4, 5]);
        assert_eq!(runner.context().targets, vec![SLIME, BAT]);
    }

    #[test]
    fn test_death_break_skips_to_follow() {
        let mut battle = battle_with(PHASES);
        let chain = PackChain::standard();
        let context = ActionContext::new(HERO, vec![SLIME, BAT], ItemRef::Skill(20));
        battle.roster.get_mut(HERO).unwrap().gain(Pool::Hp, -1000);

        let mut runner = ActionRunner::start(&mut battle, context);
        runner.run_to_end(&mut battle, &chain, 600);

        assert_eq!(battle.common_events, vec![1, 2, 3, 4, 5]);
        assert!(runner.context().targets.is_empty());
    }

    #[test]
    fn test_target_phase_sees_one_target() {
        let mut battle = battle_with("<target action>\nhp -10: targets\n</target action>");
        let chain = PackChain::standard();
        let context = ActionContext::new(HERO, vec![SLIME, BAT, SLIME], ItemRef::Skill(20));

        let mut runner = ActionRunner::start(&mut battle, context);
        runner.run_to_end(&mut battle, &chain, 600);

        assert_eq!(battle.roster.get(SLIME).unwrap().hp, 80);
        assert_eq!(battle.roster.get(BAT).unwrap().hp, 30);
    }

    #[test]
    fn test_default_sequence() {
        let mut battle = testing::battle();
        let chain = PackChain::standard();

        let mut runner = ActionRunner::start(&mut battle, testing::context());
        assert_eq!(battle.cooldowns.cooldown(HERO, 10), 2);
        let frames = runner.run_to_end(&mut battle, &chain, 600);
        assert!(runner.is_finished());
        assert!(frames < 600);

        let history = &battle.stage.history;
        assert!(matches!(
            history.first(),
            Some(StageRequest::DisplayAction { subject: HERO, .. })
        ));
        assert!(history.contains(&StageRequest::Animation {
            targets: vec![SLIME],
            animation_id: 6,
            mirror: false,
        }));
        assert!(history.contains(&StageRequest::ActionEffect {
            subject: HERO,
            target: SLIME,
            item: ItemRef::Skill(10),
        }));
        assert!(!battle.roster.get(SLIME).unwrap().is_immortal());
        assert_eq!(battle.camera.duration, 30);
    }

    #[test]
    fn test_gives_up_after_max_frames() {
        let mut battle = battle_with("<setup action>\nwait: 1000\n</setup action>");
        let chain = PackChain::standard();
        let context = ActionContext::new(HERO, vec![SLIME], ItemRef::Skill(20));

        let mut runner = ActionRunner::start(&mut battle, context);
        assert_eq!(runner.run_to_end(&mut battle, &chain, 50), 50);
        assert_eq!(runner.phase(), Some(Phase::Setup));
    }
}
