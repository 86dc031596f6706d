use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Game-wide boolean switches, indexed by positive id. Unset switches read
/// as off.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Switches(IndexMap<u32, bool>);

impl Switches {
    pub fn get(&self, id: u32) -> bool {
        self.0.get(&id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: u32, value: bool) {
        if id > 0 {
            self.0.insert(id, value);
        }
    }
}

/// Game-wide numeric variables, indexed by positive id. Unset variables
/// read as zero.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(IndexMap<u32, i32>);

impl Variables {
    pub fn get(&self, id: u32) -> i32 {
        self.0.get(&id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, id: u32, value: i32) {
        if id > 0 {
            self.0.insert(id, value);
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ItemKind {
    Item,
    Weapon,
    Armor,
}

/// The party's gold and possessions.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Inventory {
    pub gold: i32,
    pub items: IndexMap<u32, i32>,
    pub weapons: IndexMap<u32, i32>,
    pub armors: IndexMap<u32, i32>,
}

impl Inventory {
    pub const MAX_GOLD: i32 = 99_999_999;
    pub const MAX_ITEMS: i32 = 99;

    pub fn gain_gold(&mut self, amount: i32) {
        self.gold = self.gold.saturating_add(amount).clamp(0, Self::MAX_GOLD);
    }

    pub fn count(&self, kind: ItemKind, id: u32) -> i32 {
        self.container(kind).get(&id).copied().unwrap_or(0)
    }

    /// Adds (or with a negative amount, removes) items. Emptied entries are
    /// dropped.
    pub fn gain_item(&mut self, kind: ItemKind, id: u32, amount: i32) {
        let container = match kind {
            ItemKind::Item => &mut self.items,
            ItemKind::Weapon => &mut self.weapons,
            ItemKind::Armor => &mut self.armors,
        };
        let count = container.get(&id).copied().unwrap_or(0);
        let count = count.saturating_add(amount).clamp(0, Self::MAX_ITEMS);
        if count == 0 {
            container.shift_remove(&id);
        } else {
            container.insert(id, count);
        }
    }

    fn container(&self, kind: ItemKind) -> &IndexMap<u32, i32> {
        match kind {
            ItemKind::Item => &self.items,
            ItemKind::Weapon => &self.weapons,
            ItemKind::Armor => &self.armors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unset_entries_read_as_defaults() {
        let mut switches = Switches::default();
        assert!(!switches.get(3));
        switches.set(3, true);
        switches.set(0, true);
        assert!(switches.get(3));
        assert!(!switches.get(0));

        let variables = Variables::default();
        assert_eq!(variables.get(12), 0);
    }

    #[test]
    fn test_inventory_clamps() {
        let mut inventory = Inventory::default();
        inventory.gain_item(ItemKind::Weapon, 4, 120);
        assert_eq!(inventory.count(ItemKind::Weapon, 4), 99);
        inventory.gain_item(ItemKind::Weapon, 4, -200);
        assert_eq!(inventory.count(ItemKind::Weapon, 4), 0);
        assert!(inventory.weapons.is_empty());

        inventory.gain_gold(-10);
        assert_eq!(inventory.gold, 0);
    }
}
