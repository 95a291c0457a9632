use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use inject_images::{
    Config, PolicyScope,
    config::{DEFAULT_REGISTRY_PREFIX, Str},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Replace `:latest` image tags in a directory of YAML manifests with a release version.
#[derive(Parser)]
#[command(name = "inject-images")]
struct Args {
    /// Release version replacing the `:latest` tag.
    version: String,
    /// Value written to `imagePullPolicy`.
    policy: String,
    /// Root directory of the manifests.
    directory: PathBuf,
    /// Replacement for the registry prefix of rewritten images.
    organization: Option<String>,
    /// Write to a mirrored tree here instead of in place; non-YAML files are copied.
    output_directory: Option<PathBuf>,
    /// Only images starting with this prefix are rewritten. Empty matches every image.
    #[arg(long, default_value = DEFAULT_REGISTRY_PREFIX)]
    registry_prefix: String,
    /// Follow symbolic links while walking the directory.
    #[arg(long)]
    follow_symlinks: bool,
    /// Which `image` fields get an `imagePullPolicy`.
    #[arg(long, value_enum, default_value_t = PolicyScope::Always)]
    policy_scope: PolicyScope,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            version: Str::from(args.version),
            policy: Str::from(args.policy),
            directory: args.directory,
            organization: args.organization.map(Str::from),
            output_directory: args.output_directory,
            registry_prefix: Str::from(args.registry_prefix),
            follow_symlinks: args.follow_symlinks,
            policy_scope: args.policy_scope,
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to init tracing: {err}"))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let config = Config::from(Args::parse());
    let stdout = std::io::stdout();
    inject_images::inject(&config, &mut stdout.lock())
        .with_context(|| format!("injecting images into {}", config.directory.display()))?;
    Ok(())
}
