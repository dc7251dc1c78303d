use crate::model::Category;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The pattern uses a construct with no finite-length random
    /// instantiation, such as `[^...]` or an unbounded repeat.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(&'static str),

    /// A back-reference points at a group that has not been captured yet
    /// or does not exist at all.
    #[error("unknown group reference \\{0}")]
    Reference(usize),

    /// A shorthand class outside `\d` and `\s` was asked to produce a
    /// character.
    #[error("unsupported category {0}")]
    UnsupportedCategory(Category),

    /// Every generated candidate collided with the exclusion list.
    #[error("no unique id found after {attempts} attempts")]
    Exhausted { attempts: usize },

    /// Bad command line: missing method, empty pattern.
    #[error("{0}")]
    Configuration(String),

    /// The pattern text itself could not be parsed.
    #[error("invalid pattern: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, Error>;
