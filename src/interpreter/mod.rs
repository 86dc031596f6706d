//! The line-by-line script interpreter.
//!
//! One [`Interpreter`] plays one script at a time. Each call to
//! [`Interpreter::update`] is one host frame: commands run back to back until
//! one of them yields the frame, suspends on a [`Wait`], aborts, or the
//! script runs out.

mod chain;

pub use chain::*;

use crate::{
    battle::{Battle, BattlerId},
    host::{Audio, Stage},
    notetag::ItemRef,
    script::{Command, Script},
};
use serde::Serialize;
use tracing::{debug, trace};

/// What a handler tells the interpreter after running a command.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Signal {
    /// Run the next command in this same frame.
    Continue,
    /// Let a frame pass before the next command.
    Yield,
    /// Suspend until the condition clears.
    Wait(Wait),
    /// Skip the rest of the script.
    Abort,
}

/// A condition a script is suspended on. Polled once per frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Wait {
    /// Frames left to wait.
    Frames(u32),
    Animation,
    Effect,
    Movement,
    Float,
    Jump,
    Opacity,
    Camera,
    Zoom,
    NewLine,
    Popups,
    /// Motions of these battlers.
    Motion(Vec<BattlerId>),
}

impl Wait {
    /// Whether the wait still holds this frame. Frame waits count down as
    /// they are polled.
    fn poll<S: Stage, A: Audio>(&mut self, battle: &Battle<S, A>) -> bool {
        let stage = &battle.stage;
        match self {
            Wait::Frames(count) => {
                if *count > 0 {
                    *count -= 1;
                    true
                } else {
                    false
                }
            }
            Wait::Animation => stage.is_animation_playing(),
            Wait::Effect => stage.is_effecting(),
            Wait::Movement => stage.is_any_moving(),
            Wait::Float => stage.is_any_floating(),
            Wait::Jump => stage.is_any_jumping(),
            Wait::Opacity => stage.is_opacity_changing(),
            Wait::Camera => battle.camera.is_panning(),
            Wait::Zoom => battle.camera.is_zooming(),
            Wait::NewLine => stage.is_log_busy(),
            Wait::Popups => stage.is_popup_playing(),
            Wait::Motion(battlers) => battlers.iter().any(|&b| stage.is_motion_playing(b)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub enum State {
    #[default]
    Idle,
    Running,
    Waiting(Wait),
    Completed,
    Aborted,
}

/// The action being played: who acts, on whom, with what.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionContext {
    pub subject: BattlerId,
    /// The declared targets. Narrowed to one battler during the target
    /// phase.
    pub targets: Vec<BattlerId>,
    pub item: ItemRef,
}

impl ActionContext {
    pub fn new(subject: BattlerId, targets: Vec<BattlerId>, item: ItemRef) -> Self {
        Self {
            subject,
            targets,
            item,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Interpreter {
    script: Script,
    cursor: usize,
    state: State,
}

impl Interpreter {
    /// Starts playing `script` from its first line.
    pub fn load(&mut self, script: Script) {
        self.script = script;
        self.cursor = 0;
        self.state = State::Running;
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The index of the next line to run.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether there is nothing left to play.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Idle | State::Completed | State::Aborted)
    }

    /// Runs one frame's worth of the script.
    pub fn update<S: Stage, A: Audio>(
        &mut self,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
        chain: &PackChain<S, A>,
    ) -> &State {
        loop {
            match &mut self.state {
                State::Idle | State::Completed | State::Aborted => break,
                State::Waiting(wait) => {
                    if wait.poll(battle) {
                        break;
                    }
                    trace!("wait cleared at line {}", self.cursor);
                    self.state = State::Running;
                }
                State::Running => {
                    let Some(line) = self.script.get(self.cursor) else {
                        self.state = State::Completed;
                        break;
                    };
                    self.cursor += 1;

                    let command = Command::parse(line);
                    match chain.dispatch(&command, battle, context) {
                        Signal::Continue => {}
                        Signal::Yield => break,
                        Signal::Wait(wait) => {
                            trace!("waiting on {:?}", wait);
                            self.state = State::Waiting(wait);
                            break;
                        }
                        Signal::Abort => {
                            debug!("script aborted at line {}", self.cursor);
                            self.state = State::Aborted;
                            break;
                        }
                    }
                }
            }
        }

        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::{HeadlessMixer, HeadlessStage},
        testing,
    };
    use pretty_assertions::assert_eq;

    type TestBattle = Battle<HeadlessStage, HeadlessMixer>;

    struct Echo(&'static str);

    impl ActionPack<HeadlessStage, HeadlessMixer> for Echo {
        fn name(&self) -> &'static str {
            self.0
        }

        fn dispatch(
            &self,
            command: &Command,
            battle: &mut TestBattle,
            _context: &mut ActionContext,
        ) -> Option<Signal> {
            if command.name != "PING" {
                return None;
            }
            battle.common_events.push(self.0.len() as u32);
            Some(Signal::Continue)
        }
    }

    fn run(interpreter: &mut Interpreter, battle: &mut TestBattle, context: &mut ActionContext) {
        let chain = PackChain::standard();
        battle.update();
        interpreter.update(battle, context, &chain);
    }

    #[test]
    fn test_last_installed_pack_wins() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        let mut chain = PackChain::default();
        chain.install(Echo("first"));
        chain.install(Echo("second!"));
        assert_eq!(chain.names(), vec!["second!", "first"]);

        let signal = chain.dispatch(&Command::parse("PING"), &mut battle, &mut context);
        assert_eq!(signal, Signal::Continue);
        assert_eq!(battle.common_events, vec![7]);
    }

    #[test]
    fn test_wait_blocks_for_exactly_n_frames() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        let mut interpreter = Interpreter::default();
        interpreter.load(Script::from_iter(["WAIT: 60", "COMMON EVENT: 9"]));

        run(&mut interpreter, &mut battle, &mut context);
        assert_eq!(interpreter.state(), &State::Waiting(Wait::Frames(60)));

        for _ in 0..60 {
            run(&mut interpreter, &mut battle, &mut context);
            assert!(battle.common_events.is_empty());
        }

        run(&mut interpreter, &mut battle, &mut context);
        assert_eq!(battle.common_events, vec![9]);
    }

    #[test]
    fn test_unknown_commands_are_skipped() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        let mut interpreter = Interpreter::default();
        interpreter.load(Script::from_iter(["DANCE WILDLY: user", "", "HP +10: user"]));

        run(&mut interpreter, &mut battle, &mut context);
        assert_eq!(interpreter.state(), &State::Completed);
        assert_eq!(interpreter.cursor(), 3);
    }

    #[test]
    fn test_death_break_aborts() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        let mut interpreter = Interpreter::default();
        interpreter.load(Script::from_iter([
            "HP -100%: user",
            "DEATH BREAK",
            "REMOVE STATE 1: user",
            "HP +100%: user",
        ]));

        run(&mut interpreter, &mut battle, &mut context);
        assert_eq!(interpreter.state(), &State::Aborted);
        assert_eq!(interpreter.cursor(), 2);

        let hero = battle.roster.get(context.subject).unwrap();
        assert!(hero.is_dead());
        assert_eq!(hero.hp, 0);

        run(&mut interpreter, &mut battle, &mut context);
        assert!(battle.roster.get(context.subject).unwrap().is_dead());
    }

    #[test]
    fn test_yield_resumes_next_frame() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        let mut interpreter = Interpreter::default();
        interpreter.load(Script::from_iter(["COMMON EVENT: 1", "COMMON EVENT: 2"]));

        run(&mut interpreter, &mut battle, &mut context);
        assert_eq!(battle.common_events, vec![1]);
        run(&mut interpreter, &mut battle, &mut context);
        assert_eq!(battle.common_events, vec![1, 2]);
        run(&mut interpreter, &mut battle, &mut context);
        assert!(interpreter.is_finished());
    }
}
