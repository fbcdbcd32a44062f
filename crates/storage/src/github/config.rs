use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::table_store::DEFAULT_COMMIT_MESSAGE;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GitHubConfigError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("repository must look like owner/name, got {0:?}")]
    InvalidRepo(String),
    #[error("invalid api base url {raw:?}: {reason}")]
    InvalidApiBase { raw: String, reason: String },
}

/// `owner/name` of the target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    owner: String,
    name: String,
}

impl RepoSlug {
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoSlug {
    type Err = GitHubConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(GitHubConfigError::InvalidRepo(s.to_owned())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub repo: RepoSlug,
    pub api_base: Url,
    pub branch: Option<String>,
    pub commit_message: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("repo", &self.repo)
            .field("api_base", &self.api_base.as_str())
            .field("branch", &self.branch)
            .field("commit_message", &self.commit_message)
            .finish()
    }
}

impl GitHubConfig {
    /// # Errors
    ///
    /// Returns `GitHubConfigError` if the token is blank or the repository
    /// slug is malformed.
    pub fn new(token: impl Into<String>, repo: &str) -> Result<Self, GitHubConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GitHubConfigError::Missing("github token"));
        }
        Ok(Self {
            token,
            repo: repo.parse()?,
            api_base: default_api_base(),
            branch: None,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
        })
    }

    /// # Errors
    ///
    /// Returns `GitHubConfigError::InvalidApiBase` if `raw` is not an absolute URL.
    pub fn with_api_base(mut self, raw: &str) -> Result<Self, GitHubConfigError> {
        self.api_base = Url::parse(raw).map_err(|e| GitHubConfigError::InvalidApiBase {
            raw: raw.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(self)
    }

    #[must_use]
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch.filter(|b| !b.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// URL of the repository resource.
    #[must_use]
    pub fn repo_url(&self) -> Url {
        self.endpoint(&["repos", self.repo.owner(), self.repo.name()])
    }

    /// URL of a file in the contents API. `path` may contain `/`.
    #[must_use]
    pub fn contents_url(&self, path: &str) -> Url {
        let mut segments = vec!["repos", self.repo.owner(), self.repo.name(), "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.endpoint(&segments);
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_BASE).unwrap_or_else(|_| unreachable!("constant url parses"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_slug_parsing() {
        let slug: RepoSlug = "ana/study-data".parse().unwrap();
        assert_eq!(slug.owner(), "ana");
        assert_eq!(slug.name(), "study-data");
        assert_eq!(slug.to_string(), "ana/study-data");

        for bad in ["", "ana", "ana/", "/x", "a/b/c"] {
            assert!(bad.parse::<RepoSlug>().is_err(), "{bad}");
        }
    }

    #[test]
    fn blank_token_is_rejected() {
        assert_eq!(
            GitHubConfig::new("  ", "a/b").unwrap_err(),
            GitHubConfigError::Missing("github token")
        );
    }

    #[test]
    fn builds_contents_urls() {
        let config = GitHubConfig::new("t", "ana/data").unwrap();
        assert_eq!(
            config.contents_url("subjects.csv").as_str(),
            "https://api.github.com/repos/ana/data/contents/subjects.csv"
        );
        assert_eq!(
            config.repo_url().as_str(),
            "https://api.github.com/repos/ana/data"
        );

        let config = config
            .with_api_base("https://ghe.example.com/api/v3/")
            .unwrap()
            .with_branch(Some("study".into()));
        assert_eq!(
            config.contents_url("data/reviews.csv").as_str(),
            "https://ghe.example.com/api/v3/repos/ana/data/contents/data/reviews.csv?ref=study"
        );
    }

    #[test]
    fn debug_hides_token() {
        let config = GitHubConfig::new("secret-token", "a/b").unwrap();
        assert!(!format!("{config:?}").contains("secret-token"));
    }
}
