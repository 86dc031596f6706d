//! Target specifiers such as `user`, `enemies not user` or `actor 2`, and
//! their resolution against the roster.

use crate::{
    battle::{BattlerId, Roster, Side},
    interpreter::ActionContext,
};
use once_cell::sync::Lazy;
use regex::Regex;

static GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(EXISTING|ALIVE|ALL|DEAD)\s+)?(ACTORS|ENEMIES|FRIENDS|OPPONENTS)(\s+NOT\s+USER)?$",
    )
    .unwrap()
});
static SLOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ACTOR|ENEMY|FRIEND|OPPONENT|CHARACTER)\s+(\d+)$").unwrap());

/// A side named either outright or relative to the acting battler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SideRef {
    Fixed(Side),
    Friends,
    Opponents,
}

impl SideRef {
    fn resolve(self, subject: BattlerId) -> Side {
        match self {
            SideRef::Fixed(side) => side,
            SideRef::Friends => subject.side(),
            SideRef::Opponents => subject.side().opposite(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Life {
    Alive,
    Any,
    Dead,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetSpec {
    User,
    Targets,
    Group {
        side: SideRef,
        life: Life,
        exclude_user: bool,
    },
    /// A one-based roster slot.
    Slot { side: SideRef, index: usize },
    /// The party member with this actor id.
    Character(u32),
    AllAlive,
    AllMembers,
    AllDead,
    AllNotUser,
    Focus,
    NotFocus,
}

impl TargetSpec {
    /// Parses a specifier, ignoring case and surrounding space. Unknown text
    /// yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();

        let spec = match s.as_str() {
            "USER" | "SUBJECT" => TargetSpec::User,
            "TARGET" | "TARGETS" => TargetSpec::Targets,
            "ALL ALIVE" => TargetSpec::AllAlive,
            "ALL MEMBERS" => TargetSpec::AllMembers,
            "ALL DEAD" => TargetSpec::AllDead,
            "ALL NOT USER" => TargetSpec::AllNotUser,
            "FOCUS" | "PARTICIPANTS" => TargetSpec::Focus,
            "NOT FOCUS" | "NONPARTICIPANTS" => TargetSpec::NotFocus,
            _ => return Self::parse_group(&s).or_else(|| Self::parse_slot(&s)),
        };
        Some(spec)
    }

    fn parse_group(s: &str) -> Option<Self> {
        let c = GROUP.captures(s)?;
        let life = match c.get(1).map(|m| m.as_str()) {
            None | Some("EXISTING" | "ALIVE") => Life::Alive,
            Some("ALL") => Life::Any,
            _ => Life::Dead,
        };
        Some(TargetSpec::Group {
            side: side_ref(&c[2]),
            life,
            exclude_user: c.get(3).is_some(),
        })
    }

    fn parse_slot(s: &str) -> Option<Self> {
        let c = SLOT.captures(s)?;
        let number: u32 = c[2].parse().ok()?;
        if &c[1] == "CHARACTER" {
            return Some(TargetSpec::Character(number));
        }
        Some(TargetSpec::Slot {
            side: side_ref(&c[1]),
            index: number as usize,
        })
    }

    /// The battlers this specifier names, in roster order for groups. The
    /// context's targets come back as they are, repeats included; every
    /// other list names each battler once.
    pub fn resolve(&self, context: &ActionContext, roster: &Roster) -> Vec<BattlerId> {
        let subject = context.subject;

        let list: Vec<BattlerId> = match *self {
            TargetSpec::User => vec![subject],
            TargetSpec::Targets => return context.targets.clone(),
            TargetSpec::Group {
                side,
                life,
                exclude_user,
            } => roster
                .members(side.resolve(subject))
                .filter(|&id| match life {
                    Life::Alive => roster.is_alive(id),
                    Life::Any => true,
                    Life::Dead => !roster.is_alive(id),
                })
                .filter(|&id| !(exclude_user && id == subject))
                .collect(),
            TargetSpec::Slot { side, index } => {
                let side = side.resolve(subject);
                roster
                    .members(side)
                    .nth(index.wrapping_sub(1))
                    .into_iter()
                    .collect()
            }
            TargetSpec::Character(actor_id) => roster.find_actor(actor_id).into_iter().collect(),
            TargetSpec::AllAlive => roster.all().filter(|&id| roster.is_alive(id)).collect(),
            TargetSpec::AllMembers => roster.all().collect(),
            TargetSpec::AllDead => roster.all().filter(|&id| !roster.is_alive(id)).collect(),
            TargetSpec::AllNotUser => roster
                .all()
                .filter(|&id| roster.is_alive(id) && id != subject)
                .collect(),
            TargetSpec::Focus => focus(context),
            TargetSpec::NotFocus => {
                let focus = focus(context);
                roster.all().filter(|id| !focus.contains(id)).collect()
            }
        };

        dedup(list)
    }
}

/// Resolves a specifier straight from text. Unknown specifiers and missing
/// text resolve to nobody.
pub fn resolve(spec: Option<&str>, context: &ActionContext, roster: &Roster) -> Vec<BattlerId> {
    spec.and_then(TargetSpec::parse)
        .map(|spec| spec.resolve(context, roster))
        .unwrap_or_default()
}

fn side_ref(word: &str) -> SideRef {
    match word {
        "ACTOR" | "ACTORS" => SideRef::Fixed(Side::Actor),
        "ENEMY" | "ENEMIES" => SideRef::Fixed(Side::Enemy),
        "FRIEND" | "FRIENDS" => SideRef::Friends,
        _ => SideRef::Opponents,
    }
}

fn focus(context: &ActionContext) -> Vec<BattlerId> {
    std::iter::once(context.subject)
        .chain(context.targets.iter().copied())
        .collect()
}

fn dedup(list: Vec<BattlerId>) -> Vec<BattlerId> {
    let mut out = Vec::with_capacity(list.len());
    for id in list {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
