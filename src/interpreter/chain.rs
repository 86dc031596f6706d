use super::{ActionContext, Signal};
use crate::{
    battle::Battle,
    host::{Audio, Stage},
    pack::{CameraPack, CooldownPack, CorePack, EffectsPack, MotionPack},
    script::Command,
};
use tracing::{debug, trace};

/// A table of opcodes. A pack claims a command by returning a signal, or
/// passes it down the chain with `None`.
pub trait ActionPack<S: Stage, A: Audio> {
    fn name(&self) -> &'static str;

    fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Option<Signal>;
}

/// Installed packs, tried from the most recently installed to the first.
pub struct PackChain<S, A> {
    packs: Vec<Box<dyn ActionPack<S, A>>>,
}

impl<S: Stage, A: Audio> Default for PackChain<S, A> {
    fn default() -> Self {
        Self { packs: Vec::new() }
    }
}

impl<S: Stage + 'static, A: Audio + 'static> PackChain<S, A> {
    /// Every built-in pack: core, effects, motion, camera then cooldowns.
    pub fn standard() -> Self {
        let mut chain = Self::default();
        chain.install(CorePack);
        chain.install(EffectsPack);
        chain.install(MotionPack);
        chain.install(CameraPack);
        chain.install(CooldownPack);
        chain
    }

    /// Puts `pack` at the head of the chain, ahead of everything installed
    /// before it.
    pub fn install(&mut self, pack: impl ActionPack<S, A> + 'static) {
        debug!("installing action pack {}", pack.name());
        self.packs.push(Box::new(pack));
    }
}

impl<S: Stage, A: Audio> PackChain<S, A> {
    pub fn names(&self) -> Vec<&'static str> {
        self.packs.iter().rev().map(|p| p.name()).collect()
    }

    /// Runs `command` through the chain. Commands nobody claims do nothing.
    pub fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Signal {
        for pack in self.packs.iter().rev() {
            if let Some(signal) = pack.dispatch(command, battle, context) {
                trace!("{} handled {:?} with {:?}", pack.name(), command.name, signal);
                return signal;
            }
        }

        debug!("ignoring unrecognised command {:?}", command.line);
        Signal::Continue
    }
}
