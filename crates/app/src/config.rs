use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use storage::github::{GitHubConfig, GitHubConfigError};

pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    GitHub(GitHubConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
            ConfigError::GitHub(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<GitHubConfigError> for ConfigError {
    fn from(value: GitHubConfigError) -> Self {
        Self::GitHub(value)
    }
}

/// Keys accepted in the secrets file.
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(rename = "GITHUB_TOKEN")]
    github_token: Option<String>,
    #[serde(rename = "REPO_NAME")]
    repo_name: Option<String>,
    #[serde(rename = "GITHUB_API")]
    github_api: Option<String>,
    #[serde(rename = "GITHUB_BRANCH")]
    github_branch: Option<String>,
    #[serde(rename = "COMMIT_MESSAGE")]
    commit_message: Option<String>,
}

/// Environment variables win over the secrets file, key by key.
struct Lookup<'a> {
    env: &'a dyn Fn(&str) -> Option<String>,
    file: SecretsFile,
}

impl Lookup<'_> {
    fn get(&self, var: &str, from_file: Option<&String>) -> Option<String> {
        (self.env)(var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| from_file.cloned())
    }
}

/// Resolve the GitHub configuration from the environment and the secrets
/// file at `path`. A missing secrets file is not an error.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, or if the
/// token or repository are missing or invalid.
pub fn load_github_config(path: &Path) -> Result<GitHubConfig, ConfigError> {
    let env = |key: &str| std::env::var(key).ok();
    resolve(path, &env)
}

fn resolve(
    path: &Path,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<GitHubConfig, ConfigError> {
    let file = read_secrets(path)?;
    let lookup = Lookup { env, file };

    let token = lookup
        .get("STUDY_GITHUB_TOKEN", lookup.file.github_token.as_ref())
        .ok_or(GitHubConfigError::Missing("STUDY_GITHUB_TOKEN / GITHUB_TOKEN"))?;
    let repo = lookup
        .get("STUDY_REPO_NAME", lookup.file.repo_name.as_ref())
        .ok_or(GitHubConfigError::Missing("STUDY_REPO_NAME / REPO_NAME"))?;

    let mut config = GitHubConfig::new(token, &repo)?.with_branch(
        lookup.get("STUDY_GITHUB_BRANCH", lookup.file.github_branch.as_ref()),
    );
    if let Some(api) = lookup.get("STUDY_GITHUB_API", lookup.file.github_api.as_ref()) {
        config = config.with_api_base(&api)?;
    }
    if let Some(message) = lookup.get("STUDY_COMMIT_MESSAGE", lookup.file.commit_message.as_ref()) {
        config = config.with_commit_message(message);
    }
    Ok(config)
}

fn read_secrets(path: &Path) -> Result<SecretsFile, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SecretsFile::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_secrets(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("studyos-{name}-{}.toml", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_secrets_file_keys() {
        let path = temp_secrets(
            "file",
            "GITHUB_TOKEN = \"ghp_x\"\nREPO_NAME = \"ana/notes\"\nGITHUB_BRANCH = \"data\"\n",
        );
        let config = resolve(&path, &env_of(&[])).unwrap();
        assert_eq!(config.token, "ghp_x");
        assert_eq!(config.repo.to_string(), "ana/notes");
        assert_eq!(config.branch.as_deref(), Some("data"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn environment_overrides_file() {
        let path = temp_secrets("env", "GITHUB_TOKEN = \"from-file\"\nREPO_NAME = \"a/b\"\n");
        let env = env_of(&[("STUDY_GITHUB_TOKEN", "from-env"), ("STUDY_COMMIT_MESSAGE", "sync")]);
        let config = resolve(&path, &env).unwrap();
        assert_eq!(config.token, "from-env");
        assert_eq!(config.repo.to_string(), "a/b");
        assert_eq!(config.commit_message, "sync");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_everything_is_an_error() {
        let path = std::env::temp_dir().join("studyos-does-not-exist.toml");
        let err = resolve(&path, &env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::GitHub(GitHubConfigError::Missing(_))));
    }

    #[test]
    fn malformed_file_is_reported() {
        let path = temp_secrets("bad", "GITHUB_TOKEN = \n");
        assert!(matches!(
            resolve(&path, &env_of(&[])),
            Err(ConfigError::Parse { .. })
        ));
        std::fs::remove_file(path).unwrap();
    }
}
