//! Build and version information

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the binary was built from, set through `GIT_COMMIT` at build time
pub const GIT_COMMIT: &str = match option_env!("GIT_COMMIT") {
    Some(commit) => commit,
    None => "dev",
};

/// Date the binary was built, set through `BUILD_DATE` at build time
pub const BUILD_DATE: &str = match option_env!("BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Multi-line report printed by `--version`
#[must_use]
pub fn info() -> String {
    format!(
        "tailnginx version {VERSION}\nGit commit: {GIT_COMMIT}\nBuild date: {BUILD_DATE}\nOS/Arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Version with an abbreviated commit, for headers
#[must_use]
pub fn short() -> String {
    short_for(GIT_COMMIT)
}

fn short_for(commit: &str) -> String {
    if commit == "dev" {
        return VERSION.to_string();
    }
    let abbrev: String = commit.chars().take(7).collect();
    format!("{VERSION} ({abbrev})")
}
