// Organization client with memoized lookups.
// Fetches an organization and its public repositories at most once per instance.

use serde_json::Value;

use crate::cache::Memo;
use crate::error::{LazyOrgError, Result};
use crate::nested::{access_nested_map, access_str};

use super::client::JsonSource;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const ORG_KEY: &str = "org";
const REPOS_PAYLOAD_KEY: &str = "repos_payload";

/// Client for one GitHub organization.
///
/// `org` and `repos_payload` are each fetched once and then served from the
/// instance's [`Memo`]. A failed fetch is not cached.
pub struct OrgClient<S> {
    source: S,
    base_url: String,
    org_name: String,
    memo: Memo,
}

impl<S: JsonSource> OrgClient<S> {
    pub fn new(source: S, base_url: &str, org_name: &str) -> Self {
        Self {
            source,
            base_url: base_url.trim_end_matches('/').to_string(),
            org_name: org_name.to_string(),
            memo: Memo::new(),
        }
    }

    /// Client against the public GitHub API.
    pub fn github(source: S, org_name: &str) -> Self {
        Self::new(source, GITHUB_API_BASE, org_name)
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    /// URL of the organization document.
    pub fn org_url(&self) -> String {
        format!("{}/orgs/{}", self.base_url, self.org_name)
    }

    /// Organization document, fetched on first access.
    pub async fn org(&mut self) -> Result<&Value> {
        let url = self.org_url();
        let source = &mut self.source;
        self.memo
            .get_or_try_init(ORG_KEY, move || async move { source.get_json(&url).await })
            .await
    }

    /// The organization's `repos_url`.
    pub async fn repos_url(&mut self) -> Result<String> {
        let org = self.org().await?;
        Ok(access_str(org, &["repos_url"])?.to_string())
    }

    /// Repository list behind `repos_url`, fetched on first access.
    pub async fn repos_payload(&mut self) -> Result<&Value> {
        // Only resolved when the payload still has to be fetched.
        let url = if self.memo.contains(REPOS_PAYLOAD_KEY) {
            String::new()
        } else {
            self.repos_url().await?
        };
        let source = &mut self.source;
        self.memo
            .get_or_try_init(REPOS_PAYLOAD_KEY, move || async move {
                source.get_json(&url).await
            })
            .await
    }

    /// Names of public repositories, optionally restricted to one license key.
    pub async fn list_public_repos(&mut self, license: Option<&str>) -> Result<Vec<String>> {
        let payload = self.repos_payload().await?;
        let repos = payload.as_array().ok_or_else(|| {
            LazyOrgError::Other(format!("expected a list of repositories, found {}", payload))
        })?;

        let mut names = Vec::with_capacity(repos.len());
        for repo in repos {
            if let Some(key) = license {
                if !has_license(repo, Some(key))? {
                    continue;
                }
            }
            names.push(access_str(repo, &["name"])?.to_string());
        }
        Ok(names)
    }
}

/// Whether `repo` declares the license `license_key`.
///
/// A `None` key is a caller bug and fails with [`LazyOrgError::Precondition`].
/// Any missing or malformed license data on the repository is simply `false`.
pub fn has_license(repo: &Value, license_key: Option<&str>) -> Result<bool> {
    let license_key = license_key
        .ok_or_else(|| LazyOrgError::Precondition("license_key must not be None".into()))?;

    Ok(matches!(
        access_nested_map(repo, &["license", "key"]),
        Ok(Value::String(key)) if key == license_key
    ))
}
