use crate::config::{Config, Str};

/// The only tag that is replaced by the release version.
pub const LATEST_TAG: &str = ":latest";

/// Literal prefix/suffix substitution on image references.
///
/// No attempt is made to parse the registry, repository or tag grammar. An image is
/// rewritten iff it starts with `registry_prefix` and ends with [`LATEST_TAG`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRule {
    registry_prefix: Str,
    organization: Option<Str>,
    version: Str,
}

impl ImageRule {
    pub fn new(
        registry_prefix: impl Into<Str>,
        organization: Option<Str>,
        version: impl Into<Str>,
    ) -> Self {
        Self {
            registry_prefix: registry_prefix.into(),
            organization,
            version: version.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.registry_prefix.clone(),
            config.organization.clone(),
            config.version.clone(),
        )
    }

    /// Returns the rewritten image, or `None` if `image` is not a release image.
    pub fn rewrite(&self, image: &str) -> Option<String> {
        let rest = image.strip_prefix(self.registry_prefix.as_str())?;
        let repository = rest.strip_suffix(LATEST_TAG)?;
        let prefix = self
            .organization
            .as_deref()
            .unwrap_or(self.registry_prefix.as_str());
        Some(format!("{prefix}{repository}:{}", self.version))
    }
}
