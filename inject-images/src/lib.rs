//! Injects release image tags and pull policies into a tree of YAML manifests.

use std::io::Write;

pub mod config;
pub mod image;
pub mod inject;
pub mod tree;
pub mod visit;
pub mod yaml;

pub use self::config::{Config, PolicyScope, Str};
pub use self::tree::Summary;

/// Rewrites every manifest under `config.directory`, writing progress lines to `out`.
pub fn inject(config: &Config, out: &mut dyn Write) -> anyhow::Result<Summary> {
    tree::Driver::new(config).run(out)
}
