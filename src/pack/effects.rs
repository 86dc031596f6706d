use super::{name_of, show_result, targets};
use crate::{
    battle::{Battle, ItemKind, Param, Pool, StateId},
    host::{Audio, AudioTrack, Channel, Stage, StageRequest, SystemSound},
    interpreter::{ActionContext, ActionPack, Signal},
    script::{parse_int, Amount, Command},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;
use tracing::{debug, trace};

static BUFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ADD|REMOVE)\s+(.+?)\s+(BUFF|DEBUFF)$").unwrap());
static STATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ADD|REMOVE)[ _]STATES?\s+(\d+(?:\s*,\s*\d+)*)$").unwrap());
static ANIMATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ANIMATION\s+(\d+)$").unwrap());
static SWITCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^CHANGE\s+SWITCH\s+(\d+)(?:\s*(?:\.\.|-|TO|THROUGH)\s*(\d+))?$").unwrap()
});
static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^CHANGE\s+(?:VARIABLE|VAR)\s+(\d+)\s+(\S+)\s+(?:(?:VARIABLE|VAR)\s+(\d+)|([+-]?\d+))$",
    )
    .unwrap()
});
static GAIN_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(GAIN|LOSE)\s+(ITEM|WPN|WEAPON|ARM|ARMOR|ARMOUR)\s+(\d+)$").unwrap()
});
static GOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^GOLD\s+([+-]\d+)$").unwrap());
static POOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(HP|MP|TP)\s+(.+)$").unwrap());

/// Opcodes that change battlers and the game state directly: pools, buffs,
/// states, the party's inventory, switches and variables, audio and
/// collapses.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectsPack;

#[derive(Clone, Debug, PartialEq)]
enum EffectAction {
    Buff {
        add: bool,
        debuff: bool,
        param: Option<Param>,
        target: Option<String>,
        turns: u32,
        show: bool,
    },
    State {
        add: bool,
        states: Vec<StateId>,
        target: Option<String>,
        show: bool,
    },
    Animation {
        animation_id: u32,
        target: Option<String>,
        mirror: bool,
    },
    Audio {
        channel: Channel,
        cue: Option<Cue>,
    },
    Collapse {
        target: Option<String>,
        force: bool,
    },
    CommonEvent(Option<u32>),
    Switch {
        ids: RangeInclusive<u32>,
        value: Option<SwitchValue>,
    },
    Variable {
        id: u32,
        operator: Option<Operator>,
        operand: Operand,
    },
    GainItem {
        kind: ItemKind,
        id: u32,
        amount: i32,
    },
    Gold(i32),
    Pool {
        pool: Pool,
        amount: Option<Amount>,
        target: Option<String>,
        show: bool,
    },
    RefreshStatus,
}

#[derive(Clone, Debug, PartialEq)]
enum Cue {
    Stop,
    Memorize,
    Recall,
    System(SystemSound),
    Play {
        name: String,
        volume: Option<i32>,
        pitch: Option<i32>,
        pan: Option<i32>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SwitchValue {
    Set(bool),
    Toggle,
    CopyFrom(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Operator {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        let operator = match s {
            "=" => Operator::Set,
            "+=" | "+" => Operator::Add,
            "-=" | "-" => Operator::Sub,
            "*=" | "*" => Operator::Mul,
            "/=" | "/" => Operator::Div,
            "%=" | "%" => Operator::Mod,
            _ => return None,
        };
        Some(operator)
    }

    /// Applies the operator. Division and remainder by zero give `None`.
    fn apply(self, current: i32, operand: i32) -> Option<i32> {
        let value = match self {
            Operator::Set => operand,
            Operator::Add => current.saturating_add(operand),
            Operator::Sub => current.saturating_sub(operand),
            Operator::Mul => current.saturating_mul(operand),
            Operator::Div if operand == 0 => return None,
            Operator::Div => (current as f64 / operand as f64).floor() as i32,
            Operator::Mod => current.checked_rem(operand)?,
        };
        Some(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Operand {
    Value(i32),
    Variable(u32),
}

impl EffectAction {
    fn parse(command: &Command) -> Option<Self> {
        let name = command.name.as_str();
        let target = || command.arg(0).map(str::to_string);
        let show = command.has_flag("SHOW");

        if let Some(c) = BUFF.captures(name) {
            let turns = match command.arg(1).and_then(parse_int) {
                Some(turns) if turns > 0 => turns as u32,
                _ => 5,
            };
            return Some(EffectAction::Buff {
                add: &c[1] == "ADD",
                debuff: &c[3] == "DEBUFF",
                param: Param::from_keyword(&c[2]),
                target: target(),
                turns,
                show,
            });
        }

        if let Some(c) = STATE.captures(name) {
            let states = c[2]
                .split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect();
            return Some(EffectAction::State {
                add: &c[1] == "ADD",
                states,
                target: target(),
                show,
            });
        }

        if let Some(c) = ANIMATION.captures(name) {
            return Some(EffectAction::Animation {
                animation_id: c[1].parse().unwrap_or(0),
                target: target(),
                mirror: command
                    .arg(1)
                    .is_some_and(|a| a.eq_ignore_ascii_case("MIRROR")),
            });
        }

        if let Some(c) = SWITCH.captures(name) {
            let first: u32 = c[1].parse().ok()?;
            let last = c
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(first);
            return Some(EffectAction::Switch {
                ids: first.min(last)..=first.max(last),
                value: command.arg(0).and_then(switch_value),
            });
        }

        if let Some(c) = VARIABLE.captures(name) {
            let operand = match (c.get(3), c.get(4)) {
                (Some(id), _) => Operand::Variable(id.as_str().parse().ok()?),
                (None, Some(value)) => Operand::Value(value.as_str().parse().ok()?),
                (None, None) => return None,
            };
            return Some(EffectAction::Variable {
                id: c[1].parse().ok()?,
                operator: Operator::parse(&c[2]),
                operand,
            });
        }

        if let Some(c) = GAIN_ITEM.captures(name) {
            let kind = match &c[2] {
                "ITEM" => ItemKind::Item,
                "WPN" | "WEAPON" => ItemKind::Weapon,
                _ => ItemKind::Armor,
            };
            let amount = command.arg(0).and_then(parse_int).unwrap_or(1).max(1);
            return Some(EffectAction::GainItem {
                kind,
                id: c[3].parse().ok()?,
                amount: if &c[1] == "LOSE" { -amount } else { amount },
            });
        }

        if let Some(c) = GOLD.captures(name) {
            return Some(EffectAction::Gold(parse_int(&c[1])?));
        }

        if let Some(c) = POOL.captures(name) {
            let pool = match &c[1] {
                "HP" => Pool::Hp,
                "MP" => Pool::Mp,
                _ => Pool::Tp,
            };
            return Some(EffectAction::Pool {
                pool,
                amount: Amount::parse(&c[2]),
                target: target(),
                show,
            });
        }

        if let Some(channel) = Channel::from_keyword(name) {
            return Some(EffectAction::Audio {
                channel,
                cue: command.arg(0).map(|first| cue(channel, first, command)),
            });
        }

        let action = match name {
            "COLLAPSE" => EffectAction::Collapse {
                target: target(),
                force: command
                    .arg(1)
                    .is_some_and(|a| a.eq_ignore_ascii_case("FORCE")),
            },
            "COMMON EVENT" => EffectAction::CommonEvent(
                command
                    .arg(0)
                    .and_then(parse_int)
                    .and_then(|id| u32::try_from(id).ok()),
            ),
            "REFRESH STATUS" | "REFRESH WINDOW" => EffectAction::RefreshStatus,
            _ => return None,
        };
        Some(action)
    }
}

fn switch_value(arg: &str) -> Option<SwitchValue> {
    let arg = arg.to_uppercase();
    let value = match arg.as_str() {
        "ON" | "TRUE" => SwitchValue::Set(true),
        "OFF" | "FALSE" => SwitchValue::Set(false),
        "TOGGLE" | "OPPOSITE" | "REVERSE" => SwitchValue::Toggle,
        _ => {
            let id = arg.strip_prefix("SWITCH")?.trim().parse().ok()?;
            SwitchValue::CopyFrom(id)
        }
    };
    Some(value)
}

/// Reads the first audio argument. Keywords a channel does not support are
/// taken as file names.
fn cue(channel: Channel, first: &str, command: &Command) -> Cue {
    let keyword = first.to_uppercase();
    let music = matches!(channel, Channel::Bgm | Channel::Bgs);

    match keyword.as_str() {
        "STOP" if channel != Channel::Se => return Cue::Stop,
        "MEMORIZE" if music => return Cue::Memorize,
        "MEMORY" if music => return Cue::Recall,
        _ => {}
    }
    if channel == Channel::Se {
        if let Some(sound) = keyword
            .strip_prefix("PLAY ")
            .and_then(SystemSound::from_keyword)
        {
            return Cue::System(sound);
        }
    }

    let number = |index| command.arg(index).and_then(parse_int);
    Cue::Play {
        name: first.to_string(),
        volume: number(1),
        pitch: number(2),
        pan: number(3),
    }
}

impl<S: Stage, A: Audio> ActionPack<S, A> for EffectsPack {
    fn name(&self) -> &'static str {
        "effects"
    }

    fn dispatch(
        &self,
        command: &Command,
        battle: &mut Battle<S, A>,
        context: &mut ActionContext,
    ) -> Option<Signal> {
        let action = EffectAction::parse(command)?;
        Some(perform(action, battle, context))
    }
}

fn perform<S: Stage, A: Audio>(
    action: EffectAction,
    battle: &mut Battle<S, A>,
    context: &mut ActionContext,
) -> Signal {
    match action {
        EffectAction::Buff {
            add,
            debuff,
            param,
            target,
            turns,
            show,
        } => {
            let group = targets(battle, context, target.as_deref());
            if group.is_empty() {
                return Signal::Yield;
            }
            let Some(param) = param else {
                debug!("unknown buff parameter");
                return Signal::Continue;
            };

            let mut refresh = false;
            for id in group {
                let Some(battler) = battle.roster.get_mut(id) else {
                    continue;
                };
                let message = match (add, debuff) {
                    (true, _) if battler.is_dead() => continue,
                    (true, false) => {
                        battler.add_buff(param, turns);
                        "went up"
                    }
                    (true, true) => {
                        battler.add_debuff(param, turns);
                        "went down"
                    }
                    (false, false) if battler.is_buff_affected(param) => {
                        battler.remove_buff(param);
                        "returned to normal"
                    }
                    (false, true) if battler.is_debuff_affected(param) => {
                        battler.remove_buff(param);
                        "returned to normal"
                    }
                    _ => continue,
                };
                if show {
                    let name = battler.name.clone();
                    show_result(battle, id, format!("{}'s {} {}", name, label(param), message));
                }
                refresh |= id.is_actor();
            }
            refresh_status(battle, refresh);
            Signal::Continue
        }
        EffectAction::State {
            add,
            states,
            target,
            show,
        } => {
            let group = targets(battle, context, target.as_deref());
            if group.is_empty() {
                return Signal::Yield;
            }

            let mut refresh = false;
            for id in group {
                for &state_id in &states {
                    let Some(battler) = battle.roster.get_mut(id) else {
                        continue;
                    };
                    let message = if add {
                        battler.add_state(state_id);
                        format!("{} is affected by state {}", battler.name, state_id)
                    } else if battler.remove_state(state_id) {
                        format!("{} is no longer affected by state {}", battler.name, state_id)
                    } else {
                        continue;
                    };
                    if show {
                        show_result(battle, id, message);
                    }
                    refresh |= id.is_actor();
                }
            }
            refresh_status(battle, refresh);
            Signal::Continue
        }
        EffectAction::Animation {
            animation_id,
            target,
            mirror,
        } => {
            if animation_id == 0 {
                return Signal::Continue;
            }
            let group = targets(battle, context, target.as_deref());
            if group.is_empty() {
                return Signal::Yield;
            }
            battle.stage.request(StageRequest::Animation {
                targets: group,
                animation_id,
                mirror,
            });
            Signal::Continue
        }
        EffectAction::Audio { channel, cue } => {
            if let Some(cue) = cue {
                play(battle, channel, cue);
            }
            Signal::Continue
        }
        EffectAction::Collapse { target, force } => {
            for id in targets(battle, context, target.as_deref()) {
                let Some(battler) = battle.roster.get_mut(id) else {
                    continue;
                };
                if force {
                    battler.set_immortal(false);
                    battler.add_state(battler.death_state_id);
                }
                if battler.is_dead() && battler.mark_collapsed() {
                    battle.stage.request(StageRequest::Collapse(id));
                }
            }
            Signal::Yield
        }
        EffectAction::CommonEvent(id) => {
            match id {
                Some(id) if id > 0 => battle.common_events.push(id),
                _ => debug!("ignoring common event without an id"),
            }
            Signal::Yield
        }
        EffectAction::Switch { ids, value } => {
            let Some(value) = value else {
                debug!("ignoring switch change without a value");
                return Signal::Continue;
            };
            let value = match value {
                SwitchValue::CopyFrom(source) => SwitchValue::Set(battle.switches.get(source)),
                value => value,
            };
            for id in ids {
                let next = match value {
                    SwitchValue::Set(on) => on,
                    _ => !battle.switches.get(id),
                };
                battle.switches.set(id, next);
            }
            Signal::Continue
        }
        EffectAction::Variable {
            id,
            operator,
            operand,
        } => {
            let Some(operator) = operator else {
                debug!("unknown variable operator");
                return Signal::Continue;
            };
            let operand = match operand {
                Operand::Value(value) => value,
                Operand::Variable(source) => battle.variables.get(source),
            };
            match operator.apply(battle.variables.get(id), operand) {
                Some(value) => battle.variables.set(id, value),
                None => debug!("variable {} left unchanged by a zero divisor", id),
            }
            Signal::Continue
        }
        EffectAction::GainItem { kind, id, amount } => {
            battle.inventory.gain_item(kind, id, amount);
            Signal::Continue
        }
        EffectAction::Gold(value) => {
            battle.inventory.gain_gold(value);
            Signal::Continue
        }
        EffectAction::Pool {
            pool,
            amount,
            target,
            show,
        } => {
            let group = targets(battle, context, target.as_deref());
            let Some(amount) = amount.filter(|_| !group.is_empty()) else {
                return Signal::Yield;
            };

            let mut refresh = false;
            for id in group {
                let variables = &battle.variables;
                let Some(battler) = battle.roster.get_mut(id) else {
                    continue;
                };
                let before = battler.pool(pool);
                let delta = amount.resolve(|v| variables.get(v), battler.max_pool(pool));
                battler.gain(pool, delta);
                let change = battler.pool(pool) - before;
                trace!("{} {:?} changed by {}", id, pool, change);

                if show {
                    battle.stage.request(StageRequest::DamagePopup(id));
                    let message = pool_message(&name_of(battle, id), pool, change);
                    show_result(battle, id, message);
                    refresh |= id.is_actor();
                }
            }
            refresh_status(battle, refresh);
            Signal::Continue
        }
        EffectAction::RefreshStatus => {
            battle.stage.request(StageRequest::RefreshStatus);
            Signal::Yield
        }
    }
}

fn play<S: Stage, A: Audio>(battle: &mut Battle<S, A>, channel: Channel, cue: Cue) {
    match cue {
        Cue::Stop => battle.audio.stop(channel),
        Cue::Memorize => match battle.audio.current(channel) {
            Some(track) => {
                battle.memorized.insert(channel, track);
            }
            None => {
                battle.memorized.shift_remove(&channel);
            }
        },
        Cue::Recall => {
            if let Some(track) = battle.memorized.get(&channel).cloned() {
                battle.audio.replay(channel, track);
            }
        }
        Cue::System(sound) => battle.audio.play_system(sound),
        Cue::Play {
            name,
            volume,
            pitch,
            pan,
        } => {
            let settings = &battle.settings;
            let track = AudioTrack {
                name,
                volume: volume.unwrap_or(settings.default_volume),
                pitch: pitch.unwrap_or(settings.default_pitch),
                pan: pan.unwrap_or(settings.default_pan),
            };
            battle.audio.play(channel, track);
        }
    }
}

fn refresh_status<S: Stage, A: Audio>(battle: &mut Battle<S, A>, refresh: bool) {
    if refresh {
        battle.stage.request(StageRequest::RefreshStatus);
    }
}

fn label(param: Param) -> &'static str {
    match param {
        Param::MaxHp => "Max HP",
        Param::MaxMp => "Max MP",
        Param::Attack => "Attack",
        Param::Defense => "Defense",
        Param::MagicAttack => "M.Attack",
        Param::MagicDefense => "M.Defense",
        Param::Agility => "Agility",
        Param::Luck => "Luck",
    }
}

fn pool_message(name: &str, pool: Pool, change: i32) -> String {
    let pool = match pool {
        Pool::Hp => "HP",
        Pool::Mp => "MP",
        Pool::Tp => "TP",
    };
    match change {
        0 => format!("{} was not affected", name),
        c if c > 0 => format!("{} recovered {} {}", name, c, pool),
        c if pool == "HP" => format!("{} took {} damage", name, -c),
        c => format!("{} lost {} {}", name, -c, pool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::{headless::AudioEvent, HeadlessMixer, HeadlessStage},
        testing::{self, HERO, MAGE, SLIME},
    };
    use pretty_assertions::assert_eq;

    fn run(
        battle: &mut Battle<HeadlessStage, HeadlessMixer>,
        context: &mut ActionContext,
        line: &str,
    ) -> Option<Signal> {
        EffectsPack.dispatch(&Command::parse(line), battle, context)
    }

    #[test]
    fn test_buffs() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        let signal = run(&mut battle, &mut context, "add atk buff: target, 3, show");
        assert_eq!(signal, Some(Signal::Continue));
        let slime = battle.roster.get(SLIME).unwrap();
        assert!(slime.is_buff_affected(Param::Attack));
        assert_eq!(slime.buff_turns[2], 3);
        assert_eq!(battle.stage.log.last().unwrap(), "Slime's Attack went up");

        let lines = battle.stage.log.len();
        run(&mut battle, &mut context, "remove atk debuff: target, show");
        assert_eq!(battle.stage.log.len(), lines);
        assert!(battle.roster.get(SLIME).unwrap().is_buff_affected(Param::Attack));

        run(&mut battle, &mut context, "remove atk buff: target");
        assert!(!battle.roster.get(SLIME).unwrap().is_buff_affected(Param::Attack));

        run(&mut battle, &mut context, "add def debuff: user");
        assert_eq!(battle.roster.get(HERO).unwrap().buff_turns[3], 5);
        assert_eq!(
            battle.stage.history.last(),
            Some(&StageRequest::RefreshStatus)
        );

        assert_eq!(
            run(&mut battle, &mut context, "add charm buff: target"),
            Some(Signal::Continue)
        );
        assert_eq!(
            run(&mut battle, &mut context, "add atk buff: actor 7"),
            Some(Signal::Yield)
        );
    }

    #[test]
    fn test_states_share_one_show_flag() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "add state 4, 5: target, show");
        let slime = battle.roster.get(SLIME).unwrap();
        assert_eq!(slime.states.iter().copied().collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(battle.stage.log.len(), 2);

        run(&mut battle, &mut context, "remove_state 5, 6: target, show");
        let slime = battle.roster.get(SLIME).unwrap();
        assert_eq!(slime.states.iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(
            battle.stage.log.last().unwrap(),
            "Slime is no longer affected by state 5"
        );
        assert_eq!(battle.stage.log.len(), 3);
    }

    #[test]
    fn test_pool_changes() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        battle.roster.get_mut(SLIME).unwrap().hp = 70;
        run(&mut battle, &mut context, "hp -50%: target, show");
        assert_eq!(battle.roster.get(SLIME).unwrap().hp, 20);
        assert_eq!(battle.stage.log.last().unwrap(), "Slime took 50 damage");
        assert!(battle.stage.is_popup_playing());

        battle.variables.set(3, 12);
        run(&mut battle, &mut context, "mp -variable 3: user");
        assert_eq!(battle.roster.get(HERO).unwrap().mp, 18);

        run(&mut battle, &mut context, "tp +150: user");
        assert_eq!(battle.roster.get(HERO).unwrap().tp, 100);

        assert_eq!(
            run(&mut battle, &mut context, "hp lots: target"),
            Some(Signal::Yield)
        );
        assert_eq!(
            run(&mut battle, &mut context, "hp +10: nobody"),
            Some(Signal::Yield)
        );
    }

    #[test]
    fn test_negated_variable_saturates() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "change variable 1 = -2000000000");
        run(&mut battle, &mut context, "change variable 1 -= 2000000000");
        assert_eq!(battle.variables.get(1), i32::MIN);

        battle.roster.get_mut(HERO).unwrap().hp = 40;
        assert_eq!(
            run(&mut battle, &mut context, "hp -variable 1: user"),
            Some(Signal::Continue)
        );
        assert_eq!(battle.roster.get(HERO).unwrap().hp, 100);

        run(&mut battle, &mut context, "hp +variable 1: user");
        assert_eq!(battle.roster.get(HERO).unwrap().hp, 0);
    }

    #[test]
    fn test_dead_battlers_take_no_buffs() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        battle.roster.get_mut(SLIME).unwrap().gain(Pool::Hp, -1000);
        assert!(battle.roster.get(SLIME).unwrap().is_dead());

        assert_eq!(
            run(&mut battle, &mut context, "add atk buff: target, 3, show"),
            Some(Signal::Continue)
        );
        assert_eq!(
            run(&mut battle, &mut context, "add def debuff: target, 3, show"),
            Some(Signal::Continue)
        );
        let slime = battle.roster.get(SLIME).unwrap();
        assert!(!slime.is_buff_affected(Param::Attack));
        assert!(!slime.is_debuff_affected(Param::Defense));
        assert!(battle.stage.log.is_empty());
    }

    #[test]
    fn test_percent_follows_current_max() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        battle.roster.get_mut(HERO).unwrap().hp = 1;

        run(&mut battle, &mut context, "hp +10%: user");
        assert_eq!(battle.roster.get(HERO).unwrap().hp, 11);

        run(&mut battle, &mut context, "add max hp buff: user");
        assert_eq!(battle.roster.get(HERO).unwrap().mhp(), 125);
        run(&mut battle, &mut context, "hp +10%: user");
        assert_eq!(battle.roster.get(HERO).unwrap().hp, 24);
    }

    #[test]
    fn test_collapse_needs_death() {
        let mut battle = testing::battle();
        let mut context = testing::context();
        let collapses = |battle: &Battle<HeadlessStage, HeadlessMixer>| {
            battle
                .stage
                .history
                .iter()
                .filter(|r| matches!(r, StageRequest::Collapse(_)))
                .count()
        };

        assert_eq!(
            run(&mut battle, &mut context, "collapse: target"),
            Some(Signal::Yield)
        );
        assert_eq!(collapses(&battle), 0);

        run(&mut battle, &mut context, "collapse: target, force");
        assert!(battle.roster.get(SLIME).unwrap().is_dead());
        run(&mut battle, &mut context, "collapse: target, force");
        assert_eq!(collapses(&battle), 1);
    }

    #[test]
    fn test_switches() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "change switch 2..4: on");
        assert!((2..=4).all(|id| battle.switches.get(id)));
        assert!(!battle.switches.get(5));

        run(&mut battle, &mut context, "change switch 3 to 5: toggle");
        assert_eq!(
            (1..=5).map(|id| battle.switches.get(id)).collect::<Vec<_>>(),
            vec![false, true, false, false, true]
        );

        run(&mut battle, &mut context, "change switch 1: switch 5");
        assert!(battle.switches.get(1));

        run(&mut battle, &mut context, "change switch 1: maybe");
        assert!(battle.switches.get(1));
    }

    #[test]
    fn test_variables() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "change variable 1 = 7");
        run(&mut battle, &mut context, "change variable 1 *= 3");
        assert_eq!(battle.variables.get(1), 21);

        battle.variables.set(2, 4);
        run(&mut battle, &mut context, "change variable 1 / variable 2");
        assert_eq!(battle.variables.get(1), 5);
        run(&mut battle, &mut context, "change var 1 %= 3");
        assert_eq!(battle.variables.get(1), 2);
        run(&mut battle, &mut context, "change variable 1 -= -3");
        assert_eq!(battle.variables.get(1), 5);

        run(&mut battle, &mut context, "change variable 1 /= 0");
        assert_eq!(battle.variables.get(1), 5);
        run(&mut battle, &mut context, "change variable 1 ^= 2");
        assert_eq!(battle.variables.get(1), 5);
    }

    #[test]
    fn test_inventory() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "gain item 3: 4");
        run(&mut battle, &mut context, "lose item 3");
        run(&mut battle, &mut context, "gain armour 2: -6");
        run(&mut battle, &mut context, "gold +120");
        run(&mut battle, &mut context, "gold -20");

        assert_eq!(battle.inventory.count(ItemKind::Item, 3), 3);
        assert_eq!(battle.inventory.count(ItemKind::Armor, 2), 1);
        assert_eq!(battle.inventory.gold, 100);
    }

    #[test]
    fn test_audio() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "bgm: Battle1, 80");
        run(&mut battle, &mut context, "music: memorize");
        run(&mut battle, &mut context, "song: Theme2");
        run(&mut battle, &mut context, "bgm: memory");
        run(&mut battle, &mut context, "bgs: memory");
        run(&mut battle, &mut context, "se: play boss collapse 1");
        run(&mut battle, &mut context, "me: stop");

        let battle1 = AudioTrack {
            name: "Battle1".to_string(),
            volume: 80,
            pitch: 100,
            pan: 0,
        };
        assert_eq!(battle.memorized.get(&Channel::Bgm), Some(&battle1));
        assert_eq!(
            battle.audio.history,
            vec![
                AudioEvent::Play {
                    channel: Channel::Bgm,
                    track: battle1.clone(),
                },
                AudioEvent::Play {
                    channel: Channel::Bgm,
                    track: AudioTrack {
                        name: "Theme2".to_string(),
                        volume: 90,
                        pitch: 100,
                        pan: 0,
                    },
                },
                AudioEvent::Replay {
                    channel: Channel::Bgm,
                    track: battle1,
                },
                AudioEvent::System(SystemSound::BossCollapse1),
                AudioEvent::Stop(Channel::Me),
            ]
        );
    }

    #[test]
    fn test_common_events_and_refresh_yield() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        assert_eq!(
            run(&mut battle, &mut context, "common event: 12"),
            Some(Signal::Yield)
        );
        assert_eq!(battle.common_events, vec![12]);
        assert_eq!(
            run(&mut battle, &mut context, "refresh window"),
            Some(Signal::Yield)
        );
        assert_eq!(run(&mut battle, &mut context, "eval: user.gainHp(5)"), None);
    }

    #[test]
    fn test_animation() {
        let mut battle = testing::battle();
        let mut context = testing::context();

        run(&mut battle, &mut context, "animation 41: actors, mirror");
        assert_eq!(
            battle.stage.history.last(),
            Some(&StageRequest::Animation {
                targets: vec![HERO, MAGE],
                animation_id: 41,
                mirror: true,
            })
        );
        assert_eq!(
            run(&mut battle, &mut context, "animation 41: dead enemies"),
            Some(Signal::Yield)
        );
    }
}
