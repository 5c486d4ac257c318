//! Build identity, stamped in by the build script.

use serde::Serialize;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNKNOWN: &str = "unknown";
const SHORT_SHA_LEN: usize = 7;

/// Where this binary came from. Fields the build script could not fill in
/// (e.g. a build outside a git checkout) read `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_branch: &'static str,
    pub git_sha: &'static str,
    pub git_dirty: bool,
    pub built_at: &'static str,
}

impl BuildInfo {
    /// Identity of the running build.
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            git_branch: or_unknown(option_env!("VERGEN_GIT_BRANCH")),
            git_sha: or_unknown(option_env!("VERGEN_GIT_SHA")),
            git_dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
            built_at: or_unknown(option_env!("VERGEN_BUILD_TIMESTAMP")),
        }
    }

    /// The commit SHA cut to its usual short form.
    pub fn short_sha(&self) -> &'static str {
        self.git_sha
            .get(..SHORT_SHA_LEN)
            .unwrap_or(self.git_sha)
    }
}

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(value) => value,
        None => UNKNOWN,
    }
}

/// `{version}+{branch}.{short sha}`, with `.dirty` appended for builds from
/// a modified tree, e.g. `0.1.0+main.abc1234`.
pub fn version_string() -> String {
    let build = BuildInfo::current();
    let dirty = if build.git_dirty { ".dirty" } else { "" };
    format!(
        "{}+{}.{}{dirty}",
        build.version,
        build.git_branch,
        build.short_sha()
    )
}
