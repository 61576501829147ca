//! Block state strings: `name` or `name[key=value,key=value]`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// Block ids that count as empty space and are left out of a structure.
const AIR_BLOCKS: [&str; 3] = ["air", "cave_air", "void_air"];

/// A block id plus its properties, kept sorted by key so that equal states
/// always print, hash and serialize the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Parse `name[k=v,...]`. Backslash escapes a literal `,` `=` `]` or `\`
    /// inside a key or value.
    pub fn parse(state: &str) -> Result<Self, SchemaError> {
        let invalid = |reason| SchemaError::InvalidBlockState {
            state: state.to_owned(),
            reason,
        };

        let (name, body) = match state.split_once('[') {
            Some((name, rest)) => {
                let body = rest
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("missing closing `]`"))?;
                (name, Some(body))
            }
            None if state.contains(']') => return Err(invalid("unbalanced `]`")),
            None => (state, None),
        };
        if name.is_empty() {
            return Err(invalid("empty block id"));
        }

        let mut properties = BTreeMap::new();
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            for pair in split_unescaped(body, ',') {
                let mut parts = split_unescaped(pair, '=').into_iter();
                let key = parts.next().map(unescape).unwrap_or_default();
                let rest: Vec<&str> = parts.collect();
                if rest.is_empty() {
                    return Err(invalid("property without `=`"));
                }
                if key.is_empty() {
                    return Err(invalid("empty property name"));
                }
                // Only the first `=` separates; later ones belong to the value.
                let value = unescape(&rest.join("="));
                properties.insert(key, value);
            }
        }

        Ok(Self {
            name: name.to_owned(),
            properties,
        })
    }

    /// Whether this state is empty space (`air`, `cave_air`, `void_air`,
    /// with or without the `minecraft:` namespace).
    pub fn is_air(&self) -> bool {
        let id = self.name.strip_prefix("minecraft:").unwrap_or(&self.name);
        AIR_BLOCKS.contains(&id)
    }
}

impl FromStr for BlockState {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.properties.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, (key, value)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", escape(key), escape(value))?;
        }
        f.write_str("]")
    }
}

/// Split on `sep` where it is not preceded by a backslash escape.
fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | '=' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
