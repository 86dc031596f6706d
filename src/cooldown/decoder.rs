use super::*;
use once_cell::sync::Lazy;
use regex::Regex;

static COOLDOWN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<cooldown:\s*(\d+)>").unwrap());
static AFTER_BATTLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<after battle cooldown:\s*([+-]\d+)>").unwrap());
static STEPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<cooldown steps:\s*(\d+)>").unwrap());
static WARMUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<warmup:\s*(\d+)>").unwrap());
static SKILL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<skill\s+(\d+)\s+cooldown:\s*([+-]?)(\d+)>").unwrap());
static STYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<stype\s+(\d+)\s+cooldown:\s*([+-]?)(\d+)>").unwrap());
static GLOBAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<global cooldown:\s*([+-]?)(\d+)>").unwrap());
static BYPASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<bypass cooldowns?>").unwrap());

/// Applies one notes line to `rules`. Lines that are not cooldown tags are
/// ignored.
///
/// A signed value (`<skill 4 cooldown: +2>`) is a change applied to whoever
/// the skill or item affects; an unsigned one is a cost paid by the user.
pub(crate) fn decode_line(line: &str, rules: &mut CooldownRules) {
    if let Some(c) = COOLDOWN.captures(line) {
        rules.cooldown = c[1].parse().ok();
    } else if let Some(c) = AFTER_BATTLE.captures(line) {
        rules.after_battle = c[1].parse().ok();
    } else if let Some(c) = STEPS.captures(line) {
        rules.steps = c[1].parse().ok();
    } else if let Some(c) = WARMUP.captures(line) {
        rules.warmup = c[1].parse().unwrap_or(0);
    } else if let Some(c) = SKILL.captures(line) {
        let (Ok(id), Some(value)) = (c[1].parse::<u32>(), signed(&c[2], &c[3])) else {
            return;
        };
        if c[2].is_empty() {
            rules.skill_cooldown.insert(id, value);
        } else {
            rules.skill_change.insert(id, value);
        }
    } else if let Some(c) = STYPE.captures(line) {
        let (Ok(id), Some(value)) = (c[1].parse::<u32>(), signed(&c[2], &c[3])) else {
            return;
        };
        if c[2].is_empty() {
            rules.stype_cooldown.insert(id, value);
        } else {
            rules.stype_change.insert(id, value);
        }
    } else if let Some(c) = GLOBAL.captures(line) {
        let Some(value) = signed(&c[1], &c[2]) else {
            return;
        };
        if c[1].is_empty() {
            rules.global_cooldown = value;
        } else {
            rules.global_change = value;
        }
    } else if BYPASS.is_match(line) {
        rules.bypass = true;
    }
}

fn signed(sign: &str, digits: &str) -> Option<i32> {
    let value: i32 = digits.parse().ok()?;
    Some(if sign == "-" { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(lines: &[&str]) -> CooldownRules {
        let mut rules = CooldownRules::default();
        for line in lines {
            decode_line(line, &mut rules);
        }
        rules
    }

    #[test]
    fn test_costs_and_changes_are_told_apart_by_sign() {
        let rules = decode(&[
            "<Cooldown: 3>",
            "<Skill 7 Cooldown: 2>",
            "<Skill 8 Cooldown: -1>",
            "<SType 2 Cooldown: 4>",
            "<stype 3 cooldown: +2>",
            "<Global Cooldown: 1>",
            "<Global Cooldown: -5>",
        ]);

        assert_eq!(rules.cooldown, Some(3));
        assert_eq!(rules.skill_cooldown.get(&7), Some(&2));
        assert_eq!(rules.skill_change.get(&8), Some(&-1));
        assert_eq!(rules.stype_cooldown.get(&2), Some(&4));
        assert_eq!(rules.stype_change.get(&3), Some(&2));
        assert_eq!(rules.global_cooldown, 1);
        assert_eq!(rules.global_change, -5);
    }

    #[test]
    fn test_timers_and_flags() {
        let rules = decode(&[
            "<Warmup: 2>",
            "<Cooldown Steps: 10>",
            "<After Battle Cooldown: +3>",
            "<Bypass Cooldown>",
        ]);

        assert_eq!(rules.warmup, 2);
        assert_eq!(rules.steps, Some(10));
        assert_eq!(rules.after_battle, Some(3));
        assert!(rules.bypass);
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        assert_eq!(decode(&["<cooldown eval>", "hello"]), CooldownRules::default());
    }
}
