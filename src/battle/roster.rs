use super::*;
use serde::Serialize;

/// The battlers taking part in one battle: the party and the troop.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Roster {
    pub party: Vec<Battler>,
    pub troop: Vec<Battler>,
}

impl Roster {
    pub fn new(party: Vec<Battler>, troop: Vec<Battler>) -> Self {
        Self { party, troop }
    }

    pub fn get(&self, id: BattlerId) -> Option<&Battler> {
        match id {
            BattlerId::Actor(i) => self.party.get(i),
            BattlerId::Enemy(i) => self.troop.get(i),
        }
    }

    pub fn get_mut(&mut self, id: BattlerId) -> Option<&mut Battler> {
        match id {
            BattlerId::Actor(i) => self.party.get_mut(i),
            BattlerId::Enemy(i) => self.troop.get_mut(i),
        }
    }

    /// Every slot on one side, in slot order.
    pub fn members(&self, side: Side) -> impl Iterator<Item = BattlerId> + '_ {
        let (len, make): (usize, fn(usize) -> BattlerId) = match side {
            Side::Actor => (self.party.len(), BattlerId::Actor),
            Side::Enemy => (self.troop.len(), BattlerId::Enemy),
        };
        (0..len).map(make)
    }

    pub fn alive_members(&self, side: Side) -> impl Iterator<Item = BattlerId> + '_ {
        self.members(side).filter(|&id| self.is_alive(id))
    }

    pub fn dead_members(&self, side: Side) -> impl Iterator<Item = BattlerId> + '_ {
        self.members(side).filter(|&id| !self.is_alive(id))
    }

    /// Every slot on both sides, party first.
    pub fn all(&self) -> impl Iterator<Item = BattlerId> + '_ {
        self.members(Side::Actor).chain(self.members(Side::Enemy))
    }

    pub fn is_alive(&self, id: BattlerId) -> bool {
        self.get(id).is_some_and(Battler::is_alive)
    }

    /// The party slot holding the actor with database id `actor_id`.
    pub fn find_actor(&self, actor_id: u32) -> Option<BattlerId> {
        self.party
            .iter()
            .position(|a| a.data_id == actor_id)
            .map(BattlerId::Actor)
    }

    pub(crate) fn set_death_state(&mut self, state_id: StateId, max_tp: i32) {
        for battler in self.party.iter_mut().chain(self.troop.iter_mut()) {
            battler.death_state_id = state_id;
            battler.max_tp = max_tp;
        }
    }
}
