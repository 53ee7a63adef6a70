//! Per-instruction value normalization.
//!
//! The dispatcher hands every instruction's argument string to one method of
//! a [`Normalizer`]. Cumulative instructions also receive the value collected
//! so far (an empty list or map on first use) and return its replacement.

use crate::error::Error;
use crate::instruction::Keyword;
use crate::value::{Map, Value};

pub trait Normalizer {
    fn from(&self, raw: &str) -> Result<Value, Error> {
        image_reference(raw).map(Value::Object)
    }

    fn maintainer(&self, raw: &str) -> Result<Value, Error> {
        Ok(Value::from(raw))
    }

    fn run(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        append(accumulated, command(Keyword::Run, raw)?)
    }

    fn cmd(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        append(accumulated, command(Keyword::Cmd, raw)?)
    }

    fn entrypoint(&self, raw: &str) -> Result<Value, Error> {
        command(Keyword::Entrypoint, raw)
    }

    fn label(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        merge_pairs(Keyword::Label, accumulated, raw)
    }

    fn env(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        merge_pairs(Keyword::Env, accumulated, raw)
    }

    fn expose(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        if raw.is_empty() {
            return Err(invalid(Keyword::Expose, "requires at least one port"));
        }
        let ports = raw.split_whitespace().map(|port| match port.split_once('/') {
            Some((number, protocol)) => format!("{number}/{}", protocol.to_ascii_lowercase()),
            None => format!("{port}/tcp"),
        });
        extend(accumulated, ports.map(Value::String))
    }

    fn volume(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        if raw.is_empty() {
            return Err(invalid(Keyword::Volume, "requires at least one path"));
        }
        let paths = if raw.starts_with('[') {
            serde_json::from_str::<Vec<String>>(raw)
                .map_err(|err| invalid(Keyword::Volume, format!("invalid JSON array: {err}")))?
        } else {
            raw.split_whitespace().map(str::to_string).collect()
        };
        extend(accumulated, paths.into_iter().map(Value::String))
    }

    fn add(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        append(accumulated, transfer(Keyword::Add, raw)?)
    }

    fn copy(&self, accumulated: Value, raw: &str) -> Result<Value, Error> {
        append(accumulated, transfer(Keyword::Copy, raw)?)
    }
}

/// Uses every provided [`Normalizer`] method as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {}

fn invalid(keyword: Keyword, msg: impl Into<String>) -> Error {
    Error::normalize(keyword.as_str(), msg)
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn into_map(value: Value) -> Map {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn append(accumulated: Value, item: Value) -> Result<Value, Error> {
    extend(accumulated, std::iter::once(item))
}

fn extend(accumulated: Value, items: impl Iterator<Item = Value>) -> Result<Value, Error> {
    let mut values = into_list(accumulated);
    values.extend(items);
    Ok(Value::Array(values))
}

/// Exec form (`["a", "b"]`) becomes a list, anything else stays a shell string.
fn command(keyword: Keyword, raw: &str) -> Result<Value, Error> {
    if raw.is_empty() {
        return Err(invalid(keyword, "requires a command"));
    }
    if raw.starts_with('[') {
        if let Ok(args) = serde_json::from_str::<Vec<String>>(raw) {
            return Ok(Value::from(args));
        }
    }
    Ok(Value::from(raw))
}

/// `[--flag=value...] image[:tag][@digest] [AS name]`
fn image_reference(raw: &str) -> Result<Map, Error> {
    let mut words = raw.split_whitespace().peekable();
    let mut flags = Vec::new();
    while let Some(flag) = words.next_if(|word| word.starts_with("--")) {
        flags.push(split_flag(flag));
    }

    let reference = words
        .next()
        .ok_or_else(|| invalid(Keyword::From, "requires an image reference"))?;
    let (name_tag, digest) = match reference.split_once('@') {
        Some((name_tag, digest)) => (name_tag, Some(digest)),
        None => (reference, None),
    };
    let name_start = name_tag.rfind('/').map_or(0, |idx| idx + 1);
    let (image, tag) = match name_tag[name_start..].rfind(':') {
        Some(idx) => (
            &name_tag[..name_start + idx],
            Some(&name_tag[name_start + idx + 1..]),
        ),
        None => (name_tag, None),
    };

    let mut map = Map::new();
    map.insert("image".to_string(), Value::from(image));
    if let Some(tag) = tag {
        map.insert("tag".to_string(), Value::from(tag));
    }
    if let Some(digest) = digest {
        map.insert("digest".to_string(), Value::from(digest));
    }
    for (name, value) in flags {
        map.insert(name, Value::String(value));
    }
    if words.next().is_some_and(|word| word.eq_ignore_ascii_case("AS")) {
        let alias = words
            .next()
            .ok_or_else(|| invalid(Keyword::From, "AS requires a stage name"))?;
        map.insert("alias".to_string(), Value::from(alias));
    }
    Ok(map)
}

/// `--name=value` flags; a bare `--name` is recorded as `"true"`.
fn split_flag(flag: &str) -> (String, String) {
    let flag = flag.trim_start_matches('-');
    match flag.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (flag.to_string(), "true".to_string()),
    }
}

/// `KEY=VALUE...` pairs, or the legacy `KEY VALUE` form.
fn merge_pairs(keyword: Keyword, accumulated: Value, raw: &str) -> Result<Value, Error> {
    let words = shell_words(raw).ok_or_else(|| invalid(keyword, "unbalanced quotes"))?;
    let Some((first, first_end)) = words.first() else {
        return Err(invalid(keyword, "requires at least one KEY=VALUE pair"));
    };

    let mut map = into_map(accumulated);
    if !first.contains('=') {
        let value = raw[*first_end..].trim();
        if value.is_empty() {
            return Err(invalid(keyword, format!("missing value for key {first:?}")));
        }
        map.insert(first.clone(), Value::from(value));
        return Ok(Value::Object(map));
    }

    for (word, _) in &words {
        let (key, value) = word
            .split_once('=')
            .ok_or_else(|| invalid(keyword, format!("expected KEY=VALUE, found {word:?}")))?;
        if key.is_empty() {
            return Err(invalid(keyword, format!("empty key in {word:?}")));
        }
        map.insert(key.to_string(), Value::from(value));
    }
    Ok(Value::Object(map))
}

/// Splits on unquoted whitespace and strips quotes, pairing every word with
/// the byte offset just past its end in `raw`. `#` is an ordinary character.
/// Returns `None` when a quote is left open.
fn shell_words(raw: &str) -> Option<Vec<(String, usize)>> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match (quote, ch) {
            (Some(open), _) if ch == open => quote = None,
            (Some('"'), '\\') => {
                let current = word.get_or_insert_with(String::new);
                match chars.next_if(|&(_, next)| matches!(next, '"' | '\\' | '$')) {
                    Some((_, escaped)) => current.push(escaped),
                    None => current.push(ch),
                }
            }
            (Some(_), _) => word.get_or_insert_with(String::new).push(ch),
            (None, '"' | '\'') => {
                word.get_or_insert_with(String::new);
                quote = Some(ch);
            }
            (None, '\\') => {
                let current = word.get_or_insert_with(String::new);
                current.push(chars.next().map_or(ch, |(_, escaped)| escaped));
            }
            (None, _) if ch.is_whitespace() => {
                if let Some(done) = word.take() {
                    words.push((done, idx));
                }
            }
            (None, _) => word.get_or_insert_with(String::new).push(ch),
        }
    }

    if quote.is_some() {
        return None;
    }
    if let Some(done) = word {
        words.push((done, raw.len()));
    }
    Some(words)
}

/// `[--flag=value...] src... dest`, shell or JSON form.
fn transfer(keyword: Keyword, raw: &str) -> Result<Value, Error> {
    let mut words = raw.split_whitespace().peekable();
    let mut flags = Vec::new();
    while let Some(flag) = words.next_if(|word| word.starts_with("--")) {
        flags.push(split_flag(flag));
    }

    let rest = words.collect::<Vec<_>>().join(" ");
    let mut paths = if rest.starts_with('[') {
        serde_json::from_str::<Vec<String>>(&rest)
            .map_err(|err| invalid(keyword, format!("invalid JSON array: {err}")))?
    } else {
        rest.split(' ')
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect()
    };
    if paths.len() < 2 {
        return Err(invalid(
            keyword,
            "requires at least one source and a destination",
        ));
    }
    let dest = paths.pop().unwrap_or_default();

    let mut map = Map::new();
    map.insert("src".to_string(), Value::from(paths));
    map.insert("dest".to_string(), Value::String(dest));
    for (name, value) in flags {
        map.insert(name, Value::String(value));
    }
    Ok(Value::Object(map))
}
