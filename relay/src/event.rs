//! Serde model of the Bitbucket Server repository push payload.
//!
//! Only the fields the relay acts on are modeled; the rest of the payload
//! is ignored during deserialization.

use serde::Deserialize;

/// Ref type Bitbucket Server reports for branch pushes.
pub const BRANCH_REF_TYPE: &str = "BRANCH";

/// A `repo:refs_changed` push notification.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// Repository the push targeted
    pub repository: Repository,
    /// Refs updated by the push; the relay acts on the first one
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// Repository identity within the event.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    /// Owning project
    pub project: Project,
    /// Repository slug
    pub name: String,
}

/// Project owning the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Project key, e.g. "PROJ"
    pub key: String,
}

/// One updated ref in the push.
#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    /// The ref that moved
    #[serde(rename = "ref")]
    pub git_ref: RefInfo,
}

/// Source-control reference identified by type and display name.
#[derive(Debug, Clone, Deserialize)]
pub struct RefInfo {
    /// "BRANCH" or "TAG"
    #[serde(rename = "type")]
    pub ref_type: String,
    /// Human-readable ref name, e.g. "feature/login"
    #[serde(rename = "displayId")]
    pub display_id: String,
}
