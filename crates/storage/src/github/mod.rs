//! Remote file store backed by the GitHub repository contents API.

mod client;
mod config;

pub use client::{ConnectError, GitHubFileStore};
pub use config::{GitHubConfig, GitHubConfigError, RepoSlug};
