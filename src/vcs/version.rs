//! Version derivation from the latest tag and the commit height since it

use crate::vcs::Git;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Prerelease identifiers used when the version has to be invented
const DEFAULT_PRERELEASE: &str = "alpha.0";

/// A `MAJOR.MINOR.PATCH[-PRERELEASE]` version; build metadata is dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl SemVer {
    /// Parse a tag like `v1.2.3` or `1.2.3-rc.1`; `None` for anything else
    pub fn parse_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let tag = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);
        let tag = tag.split_once('+').map_or(tag, |(version, _)| version);

        let (core, prerelease) = match tag.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return None,
            None => (tag, None),
        };

        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

/// Compute the version for a commit `height` commits after `tag`
///
/// - height 0: the tag version as-is
/// - after a release tag: next patch, `-alpha.0.HEIGHT`
/// - after a prerelease tag: the tag version with `.HEIGHT` appended
/// - no (valid) tag: `0.0.0-alpha.0.HEIGHT`
pub fn derive_version(tag: Option<&str>, height: u64) -> String {
    let Some(tagged) = tag.and_then(SemVer::parse_tag) else {
        return format!("0.0.0-{}.{}", DEFAULT_PRERELEASE, height);
    };

    if height == 0 {
        return tagged.to_string();
    }

    if tagged.is_prerelease() {
        return format!("{}.{}", tagged, height);
    }

    let Some(patch) = tagged.patch.checked_add(1) else {
        warn!("Cannot bump patch of {}; ignoring the tag", tagged);
        return format!("0.0.0-{}.{}", DEFAULT_PRERELEASE, height);
    };
    let next = SemVer {
        patch,
        prerelease: Some(format!("{}.{}", DEFAULT_PRERELEASE, height)),
        ..tagged
    };
    next.to_string()
}

/// Tag globs git should consider; [`SemVer::parse_tag`] has the final say
const VERSION_TAG_PATTERNS: &[&str] = &["v[0-9]*.[0-9]*.[0-9]*", "[0-9]*.[0-9]*.[0-9]*"];

/// Nearest tag reachable from HEAD that parses as a version
async fn nearest_version_tag(git: &Git) -> Option<String> {
    let mut rejected: Vec<String> = Vec::new();
    loop {
        let tag = {
            let mut args = vec!["describe", "--tags", "--abbrev=0"];
            for pattern in VERSION_TAG_PATTERNS {
                args.extend(["--match", *pattern]);
            }
            for tag in &rejected {
                args.extend(["--exclude", tag.as_str()]);
            }
            git.query(&args).await?
        };
        if SemVer::parse_tag(&tag).is_some() {
            return Some(tag);
        }
        debug!("Ignoring non-version tag {}", tag);
        rejected.push(tag);
    }
}

/// Derive the version of HEAD in the repository at `root`
pub async fn discover_version(root: &Path) -> String {
    let git = Git::new(root);

    let tag = nearest_version_tag(&git).await;

    let range = match &tag {
        Some(tag) => format!("{}..HEAD", tag),
        None => "HEAD".to_string(),
    };
    let height = match git.query(&["rev-list", "--count", &range]).await {
        Some(count) => count.parse().unwrap_or(0),
        None => {
            warn!("Could not determine commit height in {}", root.display());
            0
        }
    };

    let version = derive_version(tag.as_deref(), height);
    debug!("Version {} (tag {:?}, height {})", version, tag, height);
    version
}
