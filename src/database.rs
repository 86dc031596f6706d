use crate::{
    battle::SkillId,
    cooldown::CooldownRules,
    notetag::{ActionSequence, DecodeError, Decoder, ItemRef, Notes},
};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Cursor;
use tracing::warn;

/// A skill or item definition as far as actions are concerned.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsableItem {
    pub id: u32,
    pub name: String,
    /// The skill type. Always zero for items.
    pub stype_id: u32,
    /// The animation shown by `ACTION ANIMATION`. Zero for none.
    pub animation_id: u32,
    pub notes: Notes,
}

impl UsableItem {
    /// Builds a definition, decoding its notes field.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        stype_id: u32,
        animation_id: u32,
        note: &str,
    ) -> Result<Self, DecodeError> {
        let notes = Decoder::new(Cursor::new(note.as_bytes())).decode()?;

        Ok(Self {
            id,
            name: name.into(),
            stype_id,
            animation_id,
            notes,
        })
    }

    #[inline]
    pub fn cooldown(&self) -> &CooldownRules {
        &self.notes.cooldown
    }
}

/// The skills and items that actions can refer to.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Database {
    pub skills: IndexMap<SkillId, UsableItem>,
    pub items: IndexMap<u32, UsableItem>,
}

impl Database {
    pub fn insert_skill(&mut self, skill: UsableItem) {
        self.skills.insert(skill.id, skill);
    }

    pub fn insert_item(&mut self, item: UsableItem) {
        self.items.insert(item.id, item);
    }

    #[inline]
    pub fn skill(&self, id: SkillId) -> Option<&UsableItem> {
        self.skills.get(&id)
    }

    pub fn get(&self, item: ItemRef) -> Option<&UsableItem> {
        match item {
            ItemRef::Skill(id) => self.skills.get(&id),
            ItemRef::Item(id) => self.items.get(&id),
        }
    }

    /// The action sequence `item` runs with, following `<action copy>`
    /// directives. A copy that points at a missing entry or back into the
    /// chain is ignored and the last entry reached keeps its own sequence.
    pub fn sequence(&self, item: ItemRef) -> Option<&ActionSequence> {
        let mut entry = self.get(item)?;
        let mut seen = vec![item];

        while let Some(next) = entry.notes.copy {
            if seen.contains(&next) {
                warn!("action copy from {} loops back to {}", item, next);
                break;
            }
            let Some(copied) = self.get(next) else {
                warn!("action copy refers to missing {}", next);
                break;
            };
            seen.push(next);
            entry = copied;
        }

        Some(&entry.notes.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use pretty_assertions::assert_eq;

    fn database() -> Database {
        let mut database = Database::default();
        database.insert_skill(
            UsableItem::new(1, "Attack", 1, 1, "<target action>\nwait: 1\n</target action>")
                .unwrap(),
        );
        database.insert_skill(UsableItem::new(2, "Double", 1, 0, "<action copy: skill:1>").unwrap());
        database.insert_item(UsableItem::new(3, "Bomb", 0, 0, "<action copy: skill:2>").unwrap());
        database.insert_skill(UsableItem::new(4, "Loop A", 1, 0, "<action copy: skill:5>").unwrap());
        database.insert_skill(
            UsableItem::new(
                5,
                "Loop B",
                1,
                0,
                "<action copy: skill:4>\n<setup>\nwait: 9\n</setup>",
            )
            .unwrap(),
        );
        database
    }

    #[test]
    fn test_copy_chains_resolve_to_source() {
        let database = database();
        let expected = Script::new(vec!["wait: 1".to_string()]);
        assert_eq!(database.sequence(ItemRef::Skill(2)).unwrap().target, expected);
        assert_eq!(database.sequence(ItemRef::Item(3)).unwrap().target, expected);
    }

    #[test]
    fn test_copy_cycle_stops() {
        let database = database();
        let sequence = database.sequence(ItemRef::Skill(4)).unwrap();
        assert_eq!(sequence.setup, Script::new(vec!["wait: 9".to_string()]));
    }

    #[test]
    fn test_missing_entry() {
        assert_eq!(database().sequence(ItemRef::Item(99)), None);
    }
}
