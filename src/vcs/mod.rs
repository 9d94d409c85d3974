//! Source-control snapshot: branch, commit, tags and remote

pub mod version;

use crate::toolchain::{CommandRunner, ToolError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub use version::{derive_version, discover_version, SemVer};

const GIT_TIMEOUT_SECS: u64 = 30;

/// Repository state captured once at the start of a build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub branch: Option<String>,
    pub commit: Option<String>,
    /// Tags pointing at HEAD
    pub tags: Vec<String>,
    pub remote_url: Option<String>,
}

impl RepositoryInfo {
    /// Snapshot the repository at `root`
    ///
    /// A missing `git` or a directory outside any repository produces an
    /// empty snapshot, never an error.
    pub async fn discover(root: &Path) -> Self {
        let git = Git::new(root);

        let Some(raw_branch) = git.query(&["rev-parse", "--abbrev-ref", "HEAD"]).await else {
            warn!("No git repository information available for {}", root.display());
            return Self::default();
        };

        let info = Self {
            branch: resolve_branch(&raw_branch, |name| std::env::var(name).ok()),
            commit: git.query(&["rev-parse", "HEAD"]).await,
            tags: git
                .query(&["tag", "--points-at", "HEAD"])
                .await
                .map(|out| out.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
                .unwrap_or_default(),
            remote_url: git.query(&["remote", "get-url", "origin"]).await,
        };
        debug!("Repository snapshot: {:?}", info);
        info
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    fn branch_name(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(|b| b.strip_prefix("refs/heads/").unwrap_or(b))
    }

    fn branch_is(&self, names: &[&str]) -> bool {
        self.branch_name()
            .is_some_and(|b| names.iter().any(|n| b.eq_ignore_ascii_case(n)))
    }

    fn branch_starts_with(&self, prefix: &str) -> bool {
        self.branch_name().is_some_and(|b| {
            b.len() > prefix.len()
                && b.get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
    }

    pub fn is_on_main_branch(&self) -> bool {
        self.branch_is(&["main"])
    }

    pub fn is_on_main_or_master_branch(&self) -> bool {
        self.branch_is(&["main", "master"])
    }

    pub fn is_on_develop_branch(&self) -> bool {
        self.branch_is(&["dev", "develop", "development"])
    }

    /// `release/*`
    pub fn is_on_release_branch(&self) -> bool {
        self.branch_starts_with("release/")
    }

    /// `hotfix/*`
    pub fn is_on_hotfix_branch(&self) -> bool {
        self.branch_starts_with("hotfix/")
    }

    /// `feature/*`
    pub fn is_on_feature_branch(&self) -> bool {
        self.branch_starts_with("feature/")
    }

    /// `https://host/owner/repo`
    pub fn https_url(&self) -> Option<String> {
        let (host, path) = parse_remote(self.remote_url.as_deref()?)?;
        Some(format!("https://{}/{}", host, path))
    }

    /// `git@host:owner/repo.git`
    pub fn ssh_url(&self) -> Option<String> {
        let (host, path) = parse_remote(self.remote_url.as_deref()?)?;
        Some(format!("git@{}:{}.git", host, path))
    }
}

/// Detached checkouts report `HEAD`; CI exposes the real branch instead
fn resolve_branch(raw: &str, env: impl Fn(&str) -> Option<String>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw != "HEAD" {
        return Some(raw.to_string());
    }
    ["GITHUB_HEAD_REF", "GITHUB_REF_NAME"]
        .iter()
        .filter_map(|name| env(name))
        .find(|value| !value.is_empty())
}

/// Split a remote URL into host and `owner/repo`
fn parse_remote(url: &str) -> Option<(String, String)> {
    let url = url.trim();
    let (host, path) = if let Some(rest) = url.split_once("://").map(|(_, rest)| rest) {
        // https://host/owner/repo, ssh://git@host/owner/repo
        let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
        let (host, path) = rest.split_once('/')?;
        let host = host.split(':').next().unwrap_or(host);
        (host, path)
    } else {
        // git@host:owner/repo.git
        let rest = url.split_once('@').map_or(url, |(_, r)| r);
        rest.split_once(':')?
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some((host.to_string(), path.to_string()))
}

/// Thin wrapper running `git` queries in one directory
pub(crate) struct Git {
    runner: CommandRunner,
}

impl Git {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            runner: CommandRunner::new(dir, GIT_TIMEOUT_SECS),
        }
    }

    /// Trimmed stdout, or `None` when git fails or prints nothing
    pub(crate) async fn query(&self, args: &[&str]) -> Option<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        match self.runner.run("git", &args).await {
            Ok(output) => Some(output.stdout.trim().to_string()).filter(|s| !s.is_empty()),
            Err(ToolError::Spawn { source, .. }) => {
                debug!("git unavailable: {}", source);
                None
            }
            Err(e) => {
                debug!("git {} failed: {}", args.join(" "), e);
                None
            }
        }
    }
}
