use super::domain::Blacklist;
use regex::Regex;
use std::sync::OnceLock;

static GROUP_LABEL: OnceLock<Regex> = OnceLock::new();

fn group_label_pattern() -> &'static Regex {
    GROUP_LABEL.get_or_init(|| Regex::new(r"^\d+조$").expect("group label pattern is valid"))
}

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

fn is_korean_name(token: &str) -> bool {
    let length = token.chars().count();
    (2..=3).contains(&length) && token.chars().all(is_hangul_syllable)
}

fn is_id_style(token: &str) -> bool {
    token.chars().count() >= 4
        && token
            .chars()
            .all(|c| is_hangul_syllable(c) || c.is_ascii_alphanumeric() || c == '_')
}

/// Collapses a raw name span to the key participants are counted under.
///
/// Group labels and blacklisted words are dropped first. A 2-3 syllable
/// Hangul token wins (the first of the longest), then the last ID-like token
/// of four or more characters, then the sorted remainder.
pub fn normalize_name(raw: &str, blacklist: &Blacklist) -> String {
    let tokens: Vec<&str> = raw
        .trim()
        .split(|c: char| c.is_whitespace() || c == '/')
        .filter(|token| !token.is_empty())
        .filter(|token| !group_label_pattern().is_match(token) && !blacklist.contains(token))
        .collect();

    let mut korean_name: Option<&str> = None;
    for &token in tokens.iter().filter(|token| is_korean_name(token)) {
        let longer = korean_name.map_or(true, |best| token.chars().count() > best.chars().count());
        if longer {
            korean_name = Some(token);
        }
    }
    if let Some(name) = korean_name {
        return name.to_string();
    }

    if let Some(id) = tokens.iter().rev().find(|token| is_id_style(token)) {
        return id.to_string();
    }

    let mut remainder = tokens;
    remainder.sort_unstable();
    remainder.join(" ")
}
