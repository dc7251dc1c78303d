use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Ids already handed out, one per line in the backing file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    entries: Vec<String>,
}

impl ExclusionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the list from `path`. Line endings are stripped, so a file
    /// without a trailing newline still yields its last id intact.
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self {
            entries: text.lines().map(str::to_string).collect(),
        })
    }

    /// Exact string equality, nothing fuzzier.
    pub fn contains(&self, candidate: &str) -> bool {
        self.entries.iter().any(|entry| entry == candidate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for ExclusionList {
    fn from(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

/// Appends a freshly issued id to the exclusion file, creating it if needed.
pub fn append(path: &Path, id: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(file, "{id}")
}
