//! The apply-result event delivered to webhooks.

use serde::{Deserialize, Serialize};

/// Outcome of an apply run on a pull request.
///
/// The serde representation is the wire format posted to HTTP webhooks:
/// a flat JSON object with the keys `workspace`, `repo`, `pull_num`,
/// `pull_url`, `base_branch`, `user` and `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Workspace the apply ran in, e.g. `"production"`.
    pub workspace: String,

    /// Repository full name, e.g. `"org/repo"`.
    #[serde(rename = "repo")]
    pub repo_full_name: String,

    /// Pull request number.
    pub pull_num: u64,

    /// Pull request URL.
    pub pull_url: String,

    /// Branch the pull request targets.
    pub base_branch: String,

    /// User that triggered the apply.
    pub user: String,

    /// Whether the apply succeeded.
    pub success: bool,
}
