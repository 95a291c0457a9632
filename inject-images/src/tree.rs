use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use walkdir::{DirEntry, WalkDir};

use crate::{config::Config, image::ImageRule, inject::ImageInjector, yaml};

/// Only files with this suffix are parsed and rewritten.
pub const YAML_SUFFIX: &str = ".yaml";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// YAML files rewritten.
    pub processed: usize,
    /// Non-YAML files copied to the output directory.
    pub copied: usize,
    /// Image references rewritten across all files.
    pub images: usize,
}

#[derive(Debug)]
enum Output {
    InPlace,
    Mirror {
        root: PathBuf,
        // Canonical output root if it lies within the input directory.
        excluded: Option<PathBuf>,
    },
}

/// Walks a directory of manifests and rewrites every YAML file in it.
#[derive(Debug)]
pub struct Driver<'a> {
    config: &'a Config,
    rule: ImageRule,
}

impl<'a> Driver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            rule: ImageRule::from_config(config),
        }
    }

    #[tracing::instrument(skip_all, fields(directory = %self.config.directory.display()))]
    pub fn run(&self, out: &mut dyn Write) -> anyhow::Result<Summary> {
        let root = &self.config.directory;
        if !root.is_dir() {
            bail!("input directory does not exist: {}", root.display());
        }
        if self.config.organization.is_some() && self.config.registry_prefix.is_empty() {
            bail!("an organization requires a non-empty registry prefix");
        }

        writeln!(
            out,
            "Inject tag: {} ({}) for files in {}",
            self.config.version,
            self.config.policy,
            root.display()
        )?;

        let output = self.prepare_output()?;
        let excluded = match &output {
            Output::Mirror { excluded, .. } => excluded.as_deref(),
            Output::InPlace => None,
        };

        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_excluded(entry, excluded));

        let mut summary = Summary::default();
        for entry in walker {
            let entry = entry.with_context(|| format!("walking {}", root.display()))?;
            // Symlinks to files count as files even when links are not followed.
            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }

            let source = entry.path();
            let relative = source.strip_prefix(root).with_context(|| {
                format!("{} is not within {}", source.display(), root.display())
            })?;

            match (&output, is_yaml(&entry)) {
                (Output::InPlace, true) => {
                    writeln!(out, "Processing: {}", source.display())?;
                    summary.images += self.process_yaml(source, source)?;
                    summary.processed += 1;
                }
                (Output::Mirror { root: output_root, .. }, true) => {
                    let destination = output_root.join(relative);
                    writeln!(
                        out,
                        "Processing: {} -> {}",
                        source.display(),
                        destination.display()
                    )?;
                    summary.images += self.process_yaml(source, &destination)?;
                    summary.processed += 1;
                }
                (Output::Mirror { root: output_root, .. }, false) => {
                    let destination = output_root.join(relative);
                    writeln!(
                        out,
                        "Copying: {} -> {}",
                        source.display(),
                        destination.display()
                    )?;
                    copy_file(source, &destination)?;
                    summary.copied += 1;
                }
                (Output::InPlace, false) => {
                    tracing::trace!(path = %source.display(), "skipping non-YAML file");
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            copied = summary.copied,
            images = summary.images,
            "injected release images"
        );
        Ok(summary)
    }

    fn prepare_output(&self) -> anyhow::Result<Output> {
        let Some(output_root) = &self.config.output_directory else {
            return Ok(Output::InPlace);
        };

        fs::create_dir_all(output_root)
            .with_context(|| format!("creating output directory {}", output_root.display()))?;

        let input = canonicalize(&self.config.directory)?;
        let output = canonicalize(output_root)?;
        if input == output {
            // Mirroring onto itself is a plain in-place rewrite.
            tracing::debug!("output directory is the input directory, rewriting in place");
            return Ok(Output::InPlace);
        }

        Ok(Output::Mirror {
            root: output_root.clone(),
            excluded: output.starts_with(&input).then_some(output),
        })
    }

    /// Rewrites all documents of `source` into `destination`, returning the number of
    /// rewritten images.
    #[tracing::instrument(skip_all, fields(path = %source.display()))]
    fn process_yaml(&self, source: &Path, destination: &Path) -> anyhow::Result<usize> {
        let input = fs::read_to_string(source)
            .with_context(|| format!("reading {}", source.display()))?;
        let mut documents = yaml::load_all(&input)
            .with_context(|| format!("parsing YAML documents in {}", source.display()))?;

        let mut injector = ImageInjector::from_config(&self.rule, self.config);
        for document in &mut documents {
            injector.inject(document);
        }

        let output = yaml::dump_all(&documents)
            .with_context(|| format!("serializing YAML documents of {}", source.display()))?;
        create_parent_dir(destination)?;
        fs::write(destination, output)
            .with_context(|| format!("writing {}", destination.display()))?;

        tracing::debug!(
            documents = documents.len(),
            images = injector.rewritten(),
            "processed file"
        );
        Ok(injector.rewritten())
    }
}

fn is_yaml(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .as_encoded_bytes()
        .ends_with(YAML_SUFFIX.as_bytes())
}

fn is_excluded(entry: &DirEntry, excluded: Option<&Path>) -> bool {
    let Some(excluded) = excluded else {
        return false;
    };

    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .path()
            .canonicalize()
            .is_ok_and(|path| path == excluded)
}

fn canonicalize(path: &Path) -> anyhow::Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("canonicalizing {}", path.display()))
}

fn create_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

fn copy_file(source: &Path, destination: &Path) -> anyhow::Result<()> {
    create_parent_dir(destination)?;
    fs::copy(source, destination).with_context(|| {
        format!(
            "copying {} to {}",
            source.display(),
            destination.display()
        )
    })?;
    Ok(())
}
