use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::Deserialize;

pub type Str = CompactString;

/// Registry and organization prefix of the images published by the release pipeline.
pub const DEFAULT_REGISTRY_PREFIX: &str = "ghcr.io/drogue-iot";

/// Controls which `image` fields get a sibling `imagePullPolicy`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyScope {
    /// Every mapping with an `image` key, whether or not the image was rewritten.
    #[default]
    Always,
    /// Only mappings whose image was rewritten.
    Rewritten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Replaces the `:latest` tag.
    pub version: Str,
    /// Written verbatim into `imagePullPolicy`.
    pub policy: Str,
    pub directory: PathBuf,
    /// Replaces `registry_prefix` of matching images.
    pub organization: Option<Str>,
    /// Mirrored output root. Files are rewritten in place when absent.
    pub output_directory: Option<PathBuf>,
    /// Only images starting with this prefix are rewritten. Empty matches everything.
    pub registry_prefix: Str,
    pub follow_symlinks: bool,
    pub policy_scope: PolicyScope,
}

impl Config {
    pub fn new(
        version: impl Into<Str>,
        policy: impl Into<Str>,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            version: version.into(),
            policy: policy.into(),
            directory: directory.into(),
            organization: None,
            output_directory: None,
            registry_prefix: Str::from(DEFAULT_REGISTRY_PREFIX),
            follow_symlinks: false,
            policy_scope: PolicyScope::default(),
        }
    }

    pub fn with_organization(mut self, organization: impl Into<Str>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_output_directory(mut self, output_directory: impl AsRef<Path>) -> Self {
        self.output_directory = Some(output_directory.as_ref().to_path_buf());
        self
    }

    pub fn with_registry_prefix(mut self, registry_prefix: impl Into<Str>) -> Self {
        self.registry_prefix = registry_prefix.into();
        self
    }

    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    pub fn with_policy_scope(mut self, policy_scope: PolicyScope) -> Self {
        self.policy_scope = policy_scope;
        self
    }
}
