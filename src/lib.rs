pub mod battle;
pub mod camera;
pub mod cooldown;
pub mod database;
pub mod host;
pub mod interpreter;
pub mod notetag;
pub mod pack;
pub mod runner;
pub mod scenario;
pub mod script;
pub mod settings;
pub mod target;

#[cfg(test)]
mod testing;

pub mod prelude {
    #[doc(hidden)]
    pub use crate::battle::{Battle, Battler, BattlerId, Roster};
    #[doc(hidden)]
    pub use crate::host::{Audio, HeadlessMixer, HeadlessStage, Stage, StageRequest};
    #[doc(hidden)]
    pub use crate::interpreter::{ActionContext, ActionPack, Interpreter, PackChain, Signal, Wait};
    #[doc(hidden)]
    pub use crate::notetag::{ActionSequence, ItemRef, Phase};
    #[doc(hidden)]
    pub use crate::runner::ActionRunner;
    #[doc(hidden)]
    pub use crate::scenario::{Report, Scenario};
    #[doc(hidden)]
    pub use crate::settings::Settings;
}
