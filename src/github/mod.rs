// GitHub API module.
// HTTP transport plus a memoizing organization client built on top of it.

pub mod client;
pub mod org;

pub use client::{GitHubClient, JsonSource, RateLimit};
pub use org::{GITHUB_API_BASE, OrgClient, has_license};
