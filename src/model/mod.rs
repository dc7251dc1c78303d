use std::fmt;

use crate::error::{Error, Result};

/// One parsed unit of a pattern. A whole pattern is an ordered sequence of
/// nodes; subpatterns, branches and repeats nest further sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single fixed character.
    Literal(char),
    /// A character class `[...]`; generation walks the contained elements.
    CharIn(Vec<Node>),
    /// An inclusive range `a-z` inside a class.
    Range(char, char),
    /// `{n}`, `{n,m}` or `?`, collapsed to the minimum count.
    BoundedRepeat { count: usize, body: Vec<Node> },
    /// A capturing group `(...)`, numbered 1-based in textual order.
    Subpattern { index: usize, body: Vec<Node> },
    /// An alternation `a|b`; exactly one branch gets instantiated.
    Branch(Vec<Vec<Node>>),
    /// `\1`-style reference to an already captured group.
    BackReference(usize),
    /// A shorthand class like `\d`.
    Category(Category),
    /// `.`
    Wildcard,
    /// Marker for `[^...]`, kept in the tree and rejected when generating.
    Negated,
    /// A recognized construct this tool refuses to instantiate.
    Unsupported(&'static str),
}

/// Shorthand character classes. Only digits and whitespace can be
/// instantiated; the rest exist so they can be rejected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Digit,
    NotDigit,
    Space,
    NotSpace,
    Word,
    NotWord,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Digit => r"\d",
            Category::NotDigit => r"\D",
            Category::Space => r"\s",
            Category::NotSpace => r"\S",
            Category::Word => r"\w",
            Category::NotWord => r"\W",
        })
    }
}

/// Values captured by each completed group during one generation pass.
///
/// The table starts empty on every pass and groups have to complete in
/// index order, so entry `index - 1` always belongs to group `index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(Vec<String>);

impl Captures {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Records the value generated for group `index`.
    pub fn capture(&mut self, index: usize, value: String) -> Result<()> {
        if index != self.0.len() + 1 {
            return Err(Error::UnsupportedConstruct("group captured out of order"));
        }
        self.0.push(value);
        Ok(())
    }

    /// Looks up an already captured group, 1-based.
    pub fn resolve(&self, index: usize) -> Result<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
            .ok_or(Error::Reference(index))
    }
}
