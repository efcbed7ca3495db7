//! Workspace and branch filters for webhook delivery.
//!
//! A [`MatchRule`] pairs two [`StringPredicate`]s. An event qualifies when
//! the workspace predicate accepts its workspace AND the branch predicate
//! accepts its base branch. Patterns are compiled up front, so evaluation
//! cannot fail.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ApplyResult;

/// Pattern used when a workspace or branch filter is not configured.
pub const MATCH_ALL: &str = ".*";

// ---------------------------------------------------------------------------
// StringPredicate
// ---------------------------------------------------------------------------

/// A compiled test over a single string value.
pub trait StringPredicate: fmt::Debug + Send + Sync {
    /// Returns `true` when `value` is accepted.
    fn matches(&self, value: &str) -> bool;
}

/// Regular expression with search semantics: the pattern may match anywhere
/// in the value unless it is anchored with `^` / `$`.
#[derive(Debug, Clone)]
pub struct RegexPredicate(Regex);

impl RegexPredicate {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }
}

impl StringPredicate for RegexPredicate {
    fn matches(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

/// Shell-style wildcard over the whole value.
///
/// `*` matches any run of characters, `?` matches exactly one character and
/// everything else is literal.
#[derive(Debug, Clone)]
pub struct GlobPredicate(Regex);

impl GlobPredicate {
    pub fn new(glob: &str) -> Result<Self, regex::Error> {
        let mut translated = String::with_capacity(glob.len() + 8);
        translated.push_str("(?s)^");
        let mut buf = [0u8; 4];
        for ch in glob.chars() {
            match ch {
                '*' => translated.push_str(".*"),
                '?' => translated.push('.'),
                other => translated.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        translated.push('$');

        Regex::new(&translated).map(Self)
    }
}

impl StringPredicate for GlobPredicate {
    fn matches(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

/// Byte-for-byte equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactPredicate(String);

impl ExactPredicate {
    pub fn new(expected: impl Into<String>) -> Self {
        Self(expected.into())
    }
}

impl StringPredicate for ExactPredicate {
    fn matches(&self, value: &str) -> bool {
        self.0 == value
    }
}

/// Accepts every value.
#[derive(Debug, Clone, Copy)]
pub struct AnyValue;

impl StringPredicate for AnyValue {
    fn matches(&self, _value: &str) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// PatternSyntax
// ---------------------------------------------------------------------------

/// How a configured pattern string is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntax {
    #[default]
    Regex,
    Glob,
    Exact,
}

impl PatternSyntax {
    /// Compile `pattern` into a predicate. `field` names the filter in the
    /// error message (`"workspace"` or `"branch"`).
    pub fn compile(
        self,
        field: &'static str,
        pattern: &str,
    ) -> Result<Arc<dyn StringPredicate>, CoreError> {
        let invalid = |e: regex::Error| CoreError::InvalidPattern {
            field,
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };

        Ok(match self {
            Self::Regex => Arc::new(RegexPredicate::new(pattern).map_err(invalid)?),
            Self::Glob => Arc::new(GlobPredicate::new(pattern).map_err(invalid)?),
            Self::Exact => Arc::new(ExactPredicate::new(pattern)),
        })
    }
}

impl FromStr for PatternSyntax {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regex" => Ok(Self::Regex),
            "glob" => Ok(Self::Glob),
            "exact" => Ok(Self::Exact),
            _ => Err(CoreError::UnknownPatternSyntax(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchRule
// ---------------------------------------------------------------------------

/// Decides whether an [`ApplyResult`] should be sent to a webhook.
#[derive(Debug, Clone)]
pub struct MatchRule {
    workspace: Arc<dyn StringPredicate>,
    branch: Arc<dyn StringPredicate>,
}

impl MatchRule {
    /// Build a rule from already-compiled predicates.
    pub fn new(workspace: Arc<dyn StringPredicate>, branch: Arc<dyn StringPredicate>) -> Self {
        Self { workspace, branch }
    }

    /// Compile both patterns with the same syntax.
    pub fn compile(
        syntax: PatternSyntax,
        workspace_pattern: &str,
        branch_pattern: &str,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            workspace: syntax.compile("workspace", workspace_pattern)?,
            branch: syntax.compile("branch", branch_pattern)?,
        })
    }

    /// A rule that accepts every event.
    pub fn match_all() -> Self {
        Self::new(Arc::new(AnyValue), Arc::new(AnyValue))
    }

    pub fn matches(&self, event: &ApplyResult) -> bool {
        self.workspace.matches(&event.workspace) && self.branch.matches(&event.base_branch)
    }
}
