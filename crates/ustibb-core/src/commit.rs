//! Commit and file change records as reported by the version-control backend.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;

static CARD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)card ([0-9]+)").expect("valid regex"));
static TASK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)task ([0-9]+)").expect("valid regex"));

/// How a commit changed a file (`git diff-tree --name-status` letter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
    Other(char),
}

impl ChangeStatus {
    /// Parse from a status token such as `A`, `M` or `R100`. Only the first letter counts.
    pub fn from_token(token: &str) -> Option<Self> {
        token.chars().next().map(Self::from_letter)
    }

    pub fn from_letter(letter: char) -> Self {
        match letter {
            'A' => Self::Added,
            'M' => Self::Modified,
            'D' => Self::Deleted,
            'R' => Self::Renamed,
            'C' => Self::Copied,
            'T' => Self::TypeChanged,
            'U' => Self::Unmerged,
            other => Self::Other(other),
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
            Self::Copied => 'C',
            Self::TypeChanged => 'T',
            Self::Unmerged => 'U',
            Self::Other(c) => *c,
        }
    }

    /// Only additions count as creation; every other status bills as modification
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Added)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One file touched by one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub status: ChangeStatus,
}

impl FileChange {
    pub fn new(path: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// One commit returned by the history query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub subject: String,
    /// Card/task number found in the subject
    pub reference: Option<u64>,
}

impl CommitRecord {
    /// Create a record, extracting the reference number from the subject
    pub fn new(hash: impl Into<String>, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        let reference = extract_reference(&subject);
        Self {
            hash: hash.into(),
            author_name: String::new(),
            author_email: String::new(),
            date: None,
            subject,
            reference,
        }
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    pub fn with_date(mut self, date: Option<DateTime<FixedOffset>>) -> Self {
        self.date = date;
        self
    }

    /// First 10 characters of the hash (or the whole hash if shorter)
    pub fn short_hash(&self) -> &str {
        match self.hash.char_indices().nth(10) {
            Some((idx, _)) => &self.hash[..idx],
            None => &self.hash,
        }
    }
}

/// A commit together with the files it changed
#[derive(Debug, Clone)]
pub struct CommitChanges {
    pub commit: CommitRecord,
    pub files: Vec<FileChange>,
}

impl CommitChanges {
    pub fn new(commit: CommitRecord, files: Vec<FileChange>) -> Self {
        Self { commit, files }
    }
}

/// Reference number from a commit subject.
///
/// `card N` is looked for first, then `task N`, both case-insensitive.
pub fn extract_reference(subject: &str) -> Option<u64> {
    CARD_RE
        .captures(subject)
        .or_else(|| TASK_RE.captures(subject))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_reference_card() {
        assert_eq!(extract_reference("card 42 fix"), Some(42));
        assert_eq!(extract_reference("Fix login (CARD 1234)"), Some(1234));
    }

    #[test]
    fn test_extract_reference_task_fallback() {
        assert_eq!(extract_reference("Task 7: tidy up"), Some(7));
    }

    #[test]
    fn test_extract_reference_card_wins_over_task() {
        assert_eq!(extract_reference("task 1 and card 2"), Some(2));
    }

    #[test]
    fn test_extract_reference_ascii_digits_only() {
        assert_eq!(extract_reference("card ٣ task 5"), Some(5));
        assert_eq!(extract_reference("card ٣"), None);
    }

    #[test]
    fn test_extract_reference_leading_zeros_dropped() {
        assert_eq!(extract_reference("card 007"), Some(7));
    }

    #[test]
    fn test_extract_reference_absent() {
        assert_eq!(extract_reference("refactor parser"), None);
        assert_eq!(extract_reference("card: 12"), None);
    }

    #[test]
    fn test_extract_reference_overflow_is_absent() {
        assert_eq!(extract_reference("card 99999999999999999999999"), None);
    }

    #[test]
    fn test_status_from_token() {
        assert_eq!(ChangeStatus::from_token("A"), Some(ChangeStatus::Added));
        assert_eq!(ChangeStatus::from_token("R100"), Some(ChangeStatus::Renamed));
        assert_eq!(ChangeStatus::from_token("X"), Some(ChangeStatus::Other('X')));
        assert_eq!(ChangeStatus::from_token(""), None);
        assert!(ChangeStatus::Added.is_creation());
        assert!(!ChangeStatus::Copied.is_creation());
    }

    #[test]
    fn test_short_hash() {
        let commit = CommitRecord::new("abcdef1234567890", "x");
        assert_eq!(commit.short_hash(), "abcdef1234");
        let short = CommitRecord::new("abc", "x");
        assert_eq!(short.short_hash(), "abc");
    }
}
