use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use inject_images::{Config, PolicyScope};
use serde::Deserialize;
use walkdir::WalkDir;

datatest_stable::harness! {
    { test = test, root = "tests/inject/testdata", pattern = r".*/case.yaml" },
}

/// Arguments of a test case. `input/` is processed and compared against `expected/`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Case {
    version: String,
    policy: String,
    #[serde(default)]
    organization: Option<String>,
    /// Write to a mirrored output directory instead of rewriting a copy of `input/` in place.
    #[serde(default)]
    mirror: bool,
    #[serde(default)]
    registry_prefix: Option<String>,
    #[serde(default)]
    policy_scope: PolicyScope,
}

fn test(path: &Path) -> datatest_stable::Result<()> {
    let case_dir = path.parent().unwrap();
    let case: Case = serde_yaml::from_str(&fs::read_to_string(path)?)
        .with_context(|| format!("parsing {}", path.display()))?;

    let scratch = tempfile::tempdir()?;
    let (directory, output) = if case.mirror {
        let output = scratch.path().join("output");
        (case_dir.join("input"), output)
    } else {
        let copy = scratch.path().join("input");
        copy_tree(&case_dir.join("input"), &copy)?;
        (copy.clone(), copy)
    };

    let mut config = Config::new(case.version, case.policy, &directory)
        .with_policy_scope(case.policy_scope);
    if let Some(organization) = case.organization {
        config = config.with_organization(organization);
    }
    if let Some(registry_prefix) = case.registry_prefix {
        config = config.with_registry_prefix(registry_prefix);
    }
    if case.mirror {
        config = config.with_output_directory(&output);
    }

    let mut stdout = Vec::new();
    inject_images::inject(&config, &mut stdout)
        .with_context(|| format!("injecting images for {}", case_dir.display()))?;

    compare_trees(&case_dir.join("expected"), &output)
}

fn relative_files(root: &Path) -> anyhow::Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.insert(entry.path().strip_prefix(root)?.to_path_buf());
        }
    }
    Ok(files)
}

fn copy_tree(from: &Path, to: &Path) -> anyhow::Result<()> {
    for relative in relative_files(from)? {
        let destination = to.join(&relative);
        fs::create_dir_all(destination.parent().unwrap())?;
        fs::copy(from.join(&relative), destination)?;
    }
    Ok(())
}

fn compare_trees(expected: &Path, actual: &Path) -> datatest_stable::Result<()> {
    let expected_files = relative_files(expected)?;
    let actual_files = relative_files(actual)?;
    if expected_files != actual_files {
        return Err(format!(
            "file sets differ\nexpected: {expected_files:?}\nactual: {actual_files:?}"
        )
        .into());
    }

    for relative in &expected_files {
        let expected_path = expected.join(relative);
        let actual_path = actual.join(relative);
        let is_yaml = relative
            .to_str()
            .is_some_and(|name| name.ends_with(inject_images::tree::YAML_SUFFIX));

        if is_yaml {
            let expected_text = fs::read_to_string(&expected_path)?;
            let actual_text = fs::read_to_string(&actual_path)?;
            // Formatting may differ, documents must not.
            let expected_documents = inject_images::yaml::load_all(&expected_text)?;
            let actual_documents = inject_images::yaml::load_all(&actual_text)?;
            if expected_documents != actual_documents {
                let formatted = format_chunks(dissimilar::diff(&expected_text, &actual_text));
                eprintln!("Mismatch for {}:\n{}", expected_path.display(), formatted);
                return Err(format!("mismatch for {}", expected_path.display()).into());
            }
        } else if fs::read(&expected_path)? != fs::read(&actual_path)? {
            return Err(format!("{} is not byte-identical", relative.display()).into());
        }
    }

    Ok(())
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{}\x1b[0m", text),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{}\x1b[0m", text),
        };
        buf.push_str(&formatted);
    }
    buf
}
