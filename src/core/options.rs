// Backend option strings (`key='value', other=value`) parsed into a typed map.
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Options {
    entries: BTreeMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a flattened option string. An empty string yields no options.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut entries = BTreeMap::new();
        let mut chars = input.chars().peekable();

        loop {
            skip_separators(&mut chars);
            if chars.peek().is_none() {
                break;
            }

            let key = read_key(&mut chars);
            if key.is_empty() {
                let found = chars.peek().copied().unwrap_or_default();
                return Err(usage(format!("expected option name, found {found:?}")));
            }

            skip_whitespace(&mut chars);
            if chars.next() != Some('=') {
                return Err(usage(format!("missing '=' after option {key:?}")));
            }
            skip_whitespace(&mut chars);

            let value = if chars.peek() == Some(&'\'') {
                chars.next();
                read_quoted(&mut chars)
                    .ok_or_else(|| usage(format!("unterminated quote in option {key:?}")))?
            } else {
                read_bare(&mut chars)
            };
            entries.insert(key, value);
        }

        Ok(Self { entries })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, Error> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        match value.to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => Ok(Some(true)),
            "no" | "false" | "0" => Ok(Some(false)),
            _ => Err(usage(format!("option {key:?} expects yes/no, got {value:?}"))),
        }
    }

    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, Error> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .parse::<usize>()
            .map(Some)
            .map_err(|err| {
                usage(format!("option {key:?} expects a non-negative integer, got {value:?}"))
                    .with_source(err)
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

fn usage(message: String) -> Error {
    Error::new(ErrorKind::Usage)
        .with_message(message)
        .with_hint("Options look like: key='value', other=value")
}

fn skip_separators(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn read_key(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut key = String::new();
    while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || matches!(*c, '-' | '_' | '.')) {
        key.push(c);
    }
    key
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\\' => value.push(chars.next()?),
            '\'' => return Some(value),
            c => value.push(c),
        }
    }
}

fn read_bare(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut value = String::new();
    while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ',') {
        value.push(c);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::Options;
    use crate::core::error::ErrorKind;

    #[test]
    fn empty_string_has_no_options() {
        assert!(Options::parse("").expect("parse").is_empty());
        assert!(Options::parse("  ,  ").expect("parse").is_empty());
    }

    #[test]
    fn quoted_and_bare_values() {
        let options =
            Options::parse("hash-type='memory', dir='/tmp/a b', contexts=yes").expect("parse");
        assert_eq!(options.len(), 3);
        assert_eq!(options.get("hash-type"), Some("memory"));
        assert_eq!(options.get("dir"), Some("/tmp/a b"));
        assert_eq!(options.get_bool("contexts").expect("bool"), Some(true));
        assert_eq!(options.get_bool("missing").expect("bool"), None);
    }

    #[test]
    fn escapes_inside_quotes() {
        let options = Options::parse(r"name='it\'s', path='c:\\x'").expect("parse");
        assert_eq!(options.get("name"), Some("it's"));
        assert_eq!(options.get("path"), Some(r"c:\x"));
    }

    #[test]
    fn typed_getters_reject_bad_values() {
        let options = Options::parse("max-size=ten, contexts=maybe").expect("parse");
        assert_eq!(options.get_usize("max-size").expect_err("usize").kind(), ErrorKind::Usage);
        assert_eq!(options.get_bool("contexts").expect_err("bool").kind(), ErrorKind::Usage);
    }

    #[test]
    fn malformed_strings_are_usage_errors() {
        for input in ["novalue", "='x'", "a='open", "a b='c'"] {
            let err = Options::parse(input).expect_err(input);
            assert_eq!(err.kind(), ErrorKind::Usage, "{input}");
        }
    }
}
