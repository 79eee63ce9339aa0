//! Shared pieces for writing migration rules.
//!
//! Every coercion either converts without losing information or returns a
//! [`Decline`], so a rule can use `?` and never half-transform a block.

use crate::document::Block;
use crate::rules::{Decline, MigrationOutcome, Replacement};
use std::time::Duration;
use toml::{Table, Value};

/// Moves the value of `from` to `to`, keeping its position in the table.
/// Returns `Ok(false)` when `from` is not set.
pub fn rename_option(options: &mut Table, from: &str, to: &str) -> Result<bool, Decline> {
    let Some(old) = options.get(from) else {
        return Ok(false);
    };

    if let Some(new) = options.get(to) {
        if old != new {
            return Err(Decline::new(format!(
                "both {:?} and {:?} are set with different values",
                from, to
            )));
        }
        remove_option(options, from);
        return Ok(true);
    }

    let renamed = std::mem::take(options)
        .into_iter()
        .map(|(k, v)| if k == from { (to.to_string(), v) } else { (k, v) })
        .collect();
    *options = renamed;
    Ok(true)
}

/// Removes `key` without reordering the remaining options.
pub fn remove_option(options: &mut Table, key: &str) -> Option<Value> {
    if !options.contains_key(key) {
        return None;
    }

    let mut removed = None;
    let mut kept = Table::new();
    for (k, v) in std::mem::take(options) {
        if k == key {
            removed = Some(v);
        } else {
            kept.insert(k, v);
        }
    }
    *options = kept;
    removed
}

/// Inserts `key`, declining when it already holds a different value.
pub fn set_option(options: &mut Table, key: &str, value: Value) -> Result<(), Decline> {
    match options.get(key) {
        Some(existing) if existing != &value => Err(Decline::new(format!(
            "{:?} would be set twice with different values",
            key
        ))),
        _ => {
            options.insert(key.to_string(), value);
            Ok(())
        }
    }
}

/// Folds `secondary` into `primary`. Keys present in both must agree.
pub fn merge_into(primary: &mut Table, secondary: &Table) -> Result<(), Decline> {
    for (key, value) in secondary {
        set_option(primary, key, value.clone())?;
    }
    Ok(())
}

/// True when both tables hold the same options once `ignore` is left out.
pub fn options_equal_except(a: &Table, b: &Table, ignore: &[&str]) -> bool {
    let relevant = |t: &Table| -> Vec<(String, Value)> {
        let mut entries: Vec<_> = t
            .iter()
            .filter(|(k, _)| !ignore.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|x, y| x.0.cmp(&y.0));
        entries
    };
    relevant(a) == relevant(b)
}

/// Go-style durations: `10s`, `1m30s`, `500ms`, `1.5h`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let number: f64 = rest[..number_end].parse().ok()?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        nanos += number * scale;
        rest = &rest[unit_end..];
    }

    Some(Duration::from_nanos(nanos.round() as u64))
}

/// Duration string, or whole seconds given as an integer.
pub fn to_duration(key: &str, value: &Value) -> Result<Value, Decline> {
    match value {
        Value::String(s) if parse_duration(s).is_some() => Ok(value.clone()),
        Value::Integer(n) if *n >= 0 => Ok(Value::String(format!("{}s", n))),
        other => Err(Decline::new(format!(
            "{}: {} is not a duration",
            key, other
        ))),
    }
}

/// Numbers pass through unchanged. Strings are never parsed into numbers.
pub fn to_number(key: &str, value: &Value) -> Result<Value, Decline> {
    match value {
        Value::Integer(_) | Value::Float(_) => Ok(value.clone()),
        other => Err(Decline::new(format!(
            "{}: {} is not a number",
            key, other
        ))),
    }
}

pub fn to_integer(key: &str, value: &Value) -> Result<i64, Decline> {
    value
        .as_integer()
        .ok_or_else(|| Decline::new(format!("{}: {} is not an integer", key, value)))
}

/// Looks a string value up in `codes`, e.g. `"green"` → `1`.
pub fn to_enum_code(key: &str, value: &Value, codes: &Table) -> Result<Value, Decline> {
    let name = value
        .as_str()
        .ok_or_else(|| Decline::new(format!("{}: {} is not a string", key, value)))?;
    codes
        .get(name)
        .cloned()
        .ok_or_else(|| Decline::new(format!("{}: no code for {:?}", key, name)))
}

/// A single string or an array of strings.
pub fn to_string_list(key: &str, value: &Value) -> Result<Vec<String>, Decline> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Decline::new(format!("{}: {} is not a string", key, item))
                })
            })
            .collect(),
        other => Err(Decline::new(format!(
            "{}: {} is not a list of strings",
            key, other
        ))),
    }
}

/// The block is superseded by exactly one successor.
pub fn replace(block: Block) -> MigrationOutcome {
    MigrationOutcome::Replaced(Replacement::single(block))
}

/// The block is superseded by several successors, kept in this order.
pub fn split(blocks: Vec<Block>) -> MigrationOutcome {
    MigrationOutcome::Replaced(Replacement::new(blocks))
}
