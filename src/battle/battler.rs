use bitflags::bitflags;
use indexmap::IndexSet;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type StateId = u32;
pub type SkillId = u32;

/// The highest buff or debuff level a parameter can stack to.
const MAX_BUFF_LEVEL: i32 = 2;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Side {
    Actor,
    Enemy,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Actor => Side::Enemy,
            Side::Enemy => Side::Actor,
        }
    }
}

/// A reference to a battler's slot in the roster. Party slots are
/// [`BattlerId::Actor`] and troop slots are [`BattlerId::Enemy`], both
/// zero-based.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum BattlerId {
    Actor(usize),
    Enemy(usize),
}

impl BattlerId {
    #[inline]
    pub fn side(self) -> Side {
        match self {
            BattlerId::Actor(_) => Side::Actor,
            BattlerId::Enemy(_) => Side::Enemy,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            BattlerId::Actor(i) | BattlerId::Enemy(i) => i,
        }
    }

    #[inline]
    pub fn is_actor(self) -> bool {
        self.side() == Side::Actor
    }

    #[inline]
    pub fn is_enemy(self) -> bool {
        self.side() == Side::Enemy
    }
}

impl fmt::Display for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattlerId::Actor(i) => write!(f, "actor {}", i + 1),
            BattlerId::Enemy(i) => write!(f, "enemy {}", i + 1),
        }
    }
}

/// The eight battle parameters, in database order.
#[repr(u8)]
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    IntoPrimitive,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    TryFromPrimitive,
)]
pub enum Param {
    MaxHp = 0,
    MaxMp = 1,
    Attack = 2,
    Defense = 3,
    MagicAttack = 4,
    MagicDefense = 5,
    Agility = 6,
    Luck = 7,
}

impl Param {
    pub const COUNT: usize = 8;

    /// Maps a stat keyword as written in scripts to a parameter.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_uppercase().as_str() {
            "HP" | "MAXHP" | "MAX HP" => Some(Param::MaxHp),
            "MP" | "MAXMP" | "MAX MP" | "SP" | "MAXSP" | "MAX SP" => Some(Param::MaxMp),
            "ATK" | "STR" => Some(Param::Attack),
            "DEF" => Some(Param::Defense),
            "MAT" | "INT" | "SPI" => Some(Param::MagicAttack),
            "MDF" | "RES" => Some(Param::MagicDefense),
            "AGI" | "SPD" => Some(Param::Agility),
            "LUK" => Some(Param::Luck),
            _ => None,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        u8::from(self) as usize
    }
}

/// The three resource pools a battler spends and regains.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Pool {
    Hp,
    Mp,
    Tp,
}

bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
    pub struct BattlerFlags: u32 {
        const NONE = 0;
        /// HP reaching zero does not add the death state.
        const IMMORTAL = 1 << 0;
        /// The collapse effect has been played for the current death.
        const COLLAPSED = 1 << 1;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Battler {
    pub name: String,
    /// The actor or enemy database id.
    pub data_id: u32,
    pub hp: i32,
    pub mp: i32,
    pub tp: i32,
    /// Base values of each [`Param`], before buffs.
    pub params: [i32; Param::COUNT],
    /// Buff level per parameter, from -2 to 2.
    pub buffs: [i32; Param::COUNT],
    /// Remaining turns per buff or debuff.
    pub buff_turns: [u32; Param::COUNT],
    pub states: IndexSet<StateId>,
    pub skills: Vec<SkillId>,
    pub flags: BattlerFlags,
    #[serde(skip)]
    pub(crate) max_tp: i32,
    #[serde(skip)]
    pub(crate) death_state_id: StateId,
}

impl Battler {
    pub fn new(name: impl Into<String>, data_id: u32, mhp: i32, mmp: i32) -> Self {
        let mut params = [10; Param::COUNT];
        params[Param::MaxHp.slot()] = mhp.max(1);
        params[Param::MaxMp.slot()] = mmp.max(0);

        Self {
            name: name.into(),
            data_id,
            hp: mhp.max(1),
            mp: mmp.max(0),
            tp: 0,
            params,
            buffs: [0; Param::COUNT],
            buff_turns: [0; Param::COUNT],
            states: IndexSet::new(),
            skills: Vec::new(),
            flags: BattlerFlags::NONE,
            max_tp: 100,
            death_state_id: 1,
        }
    }

    /// The parameter value with buffs applied. Each buff level is worth 25%.
    pub fn param(&self, param: Param) -> i32 {
        let base = self.params[param.slot()] as f64;
        let rate = 1. + 0.25 * self.buffs[param.slot()] as f64;
        (base * rate).round().max(0.) as i32
    }

    #[inline]
    pub fn mhp(&self) -> i32 {
        self.param(Param::MaxHp).max(1)
    }

    #[inline]
    pub fn mmp(&self) -> i32 {
        self.param(Param::MaxMp)
    }

    pub fn pool(&self, pool: Pool) -> i32 {
        match pool {
            Pool::Hp => self.hp,
            Pool::Mp => self.mp,
            Pool::Tp => self.tp,
        }
    }

    pub fn max_pool(&self, pool: Pool) -> i32 {
        match pool {
            Pool::Hp => self.mhp(),
            Pool::Mp => self.mmp(),
            Pool::Tp => self.max_tp,
        }
    }

    /// Adds `value` to a pool, clamped to the pool's range, and refreshes the
    /// death state when HP changes.
    pub fn gain(&mut self, pool: Pool, value: i32) {
        let max = self.max_pool(pool);
        match pool {
            Pool::Hp => self.hp = self.hp.saturating_add(value).clamp(0, max),
            Pool::Mp => self.mp = self.mp.saturating_add(value).clamp(0, max),
            Pool::Tp => self.tp = self.tp.saturating_add(value).clamp(0, max),
        }
        self.refresh();
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.states.contains(&self.death_state_id)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    #[inline]
    pub fn is_immortal(&self) -> bool {
        self.flags.contains(BattlerFlags::IMMORTAL)
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.flags.contains(BattlerFlags::COLLAPSED)
    }

    pub fn set_immortal(&mut self, immortal: bool) {
        self.flags.set(BattlerFlags::IMMORTAL, immortal);
        self.refresh();
    }

    pub fn is_state_affected(&self, state_id: StateId) -> bool {
        self.states.contains(&state_id)
    }

    /// Adds a state. Returns `true` if the state was newly added.
    pub fn add_state(&mut self, state_id: StateId) -> bool {
        if self.states.contains(&state_id) {
            return false;
        }
        if state_id == self.death_state_id {
            if self.is_immortal() {
                return false;
            }
            self.die();
        } else if self.is_dead() {
            return false;
        }
        self.states.insert(state_id);
        true
    }

    /// Removes a state. Returns `true` if the battler had it.
    pub fn remove_state(&mut self, state_id: StateId) -> bool {
        if !self.states.shift_remove(&state_id) {
            return false;
        }
        if state_id == self.death_state_id {
            self.revive();
        }
        true
    }

    pub fn add_buff(&mut self, param: Param, turns: u32) {
        if self.is_dead() {
            return;
        }
        let slot = param.slot();
        if self.buffs[slot] < MAX_BUFF_LEVEL {
            self.buffs[slot] += 1;
        }
        self.settle_buff(slot, turns);
    }

    pub fn add_debuff(&mut self, param: Param, turns: u32) {
        if self.is_dead() {
            return;
        }
        let slot = param.slot();
        if self.buffs[slot] > -MAX_BUFF_LEVEL {
            self.buffs[slot] -= 1;
        }
        self.settle_buff(slot, turns);
    }

    pub fn remove_buff(&mut self, param: Param) {
        let slot = param.slot();
        self.buffs[slot] = 0;
        self.buff_turns[slot] = 0;
        self.refresh();
    }

    #[inline]
    pub fn is_buff_affected(&self, param: Param) -> bool {
        self.buffs[param.slot()] > 0
    }

    #[inline]
    pub fn is_debuff_affected(&self, param: Param) -> bool {
        self.buffs[param.slot()] < 0
    }

    /// Counts down buff turns, erasing the ones that run out.
    pub fn update_buff_turns(&mut self) {
        for slot in 0..Param::COUNT {
            if self.buff_turns[slot] > 0 {
                self.buff_turns[slot] -= 1;
                if self.buff_turns[slot] == 0 {
                    self.buffs[slot] = 0;
                }
            }
        }
        self.refresh();
    }

    /// Marks the collapse effect as played. Returns `false` if it already
    /// was.
    pub(crate) fn mark_collapsed(&mut self) -> bool {
        if self.is_collapsed() {
            return false;
        }
        self.flags.insert(BattlerFlags::COLLAPSED);
        true
    }

    fn settle_buff(&mut self, slot: usize, turns: u32) {
        if self.buffs[slot] == 0 {
            self.buff_turns[slot] = 0;
        } else if self.buff_turns[slot] < turns {
            self.buff_turns[slot] = turns;
        }
        self.refresh();
    }

    fn die(&mut self) {
        self.hp = 0;
        self.states.clear();
        self.buffs = [0; Param::COUNT];
        self.buff_turns = [0; Param::COUNT];
    }

    fn revive(&mut self) {
        if self.hp == 0 {
            self.hp = 1;
        }
        self.flags.remove(BattlerFlags::COLLAPSED);
    }

    fn refresh(&mut self) {
        self.hp = self.hp.min(self.mhp());
        self.mp = self.mp.min(self.mmp());
        self.tp = self.tp.min(self.max_tp);

        if self.hp == 0 {
            if !self.is_immortal() && !self.is_dead() {
                self.die();
                self.states.insert(self.death_state_id);
            }
        } else if self.is_dead() {
            self.states.shift_remove(&self.death_state_id);
            self.flags.remove(BattlerFlags::COLLAPSED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hp_clamps_and_adds_death_state() {
        let mut battler = Battler::new("Harold", 1, 100, 20);
        battler.gain(Pool::Hp, 50);
        assert_eq!(battler.hp, 100);

        battler.gain(Pool::Hp, -150);
        assert_eq!(battler.hp, 0);
        assert!(battler.is_dead());

        battler.remove_state(1);
        assert_eq!(battler.hp, 1);
        assert!(battler.is_alive());
    }

    #[test]
    fn test_immortal_battler_survives_zero_hp() {
        let mut battler = Battler::new("Slime", 1, 30, 0);
        battler.set_immortal(true);
        battler.gain(Pool::Hp, -30);
        assert_eq!(battler.hp, 0);
        assert!(battler.is_alive());

        battler.set_immortal(false);
        assert!(battler.is_dead());
    }

    #[test]
    fn test_max_hp_buff_changes_max() {
        let mut battler = Battler::new("Harold", 1, 100, 0);
        battler.add_buff(Param::MaxHp, 5);
        assert_eq!(battler.mhp(), 125);
        assert_eq!(battler.buff_turns[0], 5);

        battler.add_buff(Param::MaxHp, 3);
        battler.add_buff(Param::MaxHp, 3);
        assert_eq!(battler.buffs[0], 2);
        assert_eq!(battler.buff_turns[0], 5);

        battler.remove_buff(Param::MaxHp);
        assert_eq!(battler.mhp(), 100);
        assert!(!battler.is_buff_affected(Param::MaxHp));
    }

    #[test]
    fn test_buff_turns_expire() {
        let mut battler = Battler::new("Harold", 1, 100, 0);
        battler.add_debuff(Param::Agility, 1);
        assert!(battler.is_debuff_affected(Param::Agility));
        battler.update_buff_turns();
        assert!(!battler.is_debuff_affected(Param::Agility));
    }

    #[test]
    fn test_dead_battlers_take_no_states() {
        let mut battler = Battler::new("Harold", 1, 10, 0);
        assert!(battler.add_state(4));
        assert!(!battler.add_state(4));
        assert!(battler.add_state(1));
        assert_eq!(battler.states.iter().copied().collect::<Vec<_>>(), vec![1]);
        assert!(!battler.add_state(5));
    }

    #[test]
    fn test_param_keywords() {
        assert_eq!(Param::from_keyword("atk"), Some(Param::Attack));
        assert_eq!(Param::from_keyword("SPI"), Some(Param::MagicAttack));
        assert_eq!(Param::from_keyword("max mp"), Some(Param::MaxMp));
        assert_eq!(Param::from_keyword("CRI"), None);
        assert_eq!(Param::try_from(6u8).ok(), Some(Param::Agility));
    }
}
