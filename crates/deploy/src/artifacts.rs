//! Compiled contract artifacts.
//!
//! Creation bytecode is read from Hardhat (`artifacts/**/<Name>.json`, with a
//! `bytecode` string) or Foundry (`out/**/<Name>.json`, with
//! `bytecode.object`) build outputs.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde_json::Value;

/// Creation code of a compiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub contract_name: String,
    pub bytecode: Bytes,
}

impl Artifact {
    /// Parse a Hardhat or Foundry artifact.
    pub fn from_json(contract_name: &str, value: &Value) -> Result<Self> {
        let bytecode = match &value["bytecode"] {
            Value::String(hex) => hex.as_str(),
            Value::Object(object) => object
                .get("object")
                .and_then(Value::as_str)
                .context("Artifact bytecode object has no `object` field")?,
            _ => anyhow::bail!("Artifact for {} has no bytecode", contract_name),
        };

        let bytecode = hex::decode(bytecode.trim_start_matches("0x")).with_context(|| {
            format!(
                "Invalid bytecode for {} (unlinked libraries are not supported)",
                contract_name
            )
        })?;

        if bytecode.is_empty() {
            anyhow::bail!(
                "Artifact for {} has empty bytecode (abstract contract or interface?)",
                contract_name
            );
        }

        Ok(Self {
            contract_name: contract_name.to_string(),
            bytecode: bytecode.into(),
        })
    }

    pub fn load_from_file(contract_name: &str, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Self::from_json(contract_name, &value)
    }
}

/// Looks up artifacts by contract name under a set of build directories.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    roots: Vec<PathBuf>,
}

impl ArtifactStore {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Load the artifact of `contract_name`.
    pub fn load(&self, contract_name: &str) -> Result<Artifact> {
        let file_name = format!("{}.json", contract_name);

        for root in &self.roots {
            if let Some(path) = find_file(root, &file_name)? {
                tracing::debug!(
                    contract = contract_name,
                    path = %path.display(),
                    "Found artifact"
                );
                return Artifact::load_from_file(contract_name, &path);
            }
        }

        anyhow::bail!(
            "No artifact found for {} in {}",
            contract_name,
            self.roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Depth-first search for `file_name` under `dir`. Missing directories yield `None`.
fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut subdirs = Vec::new();

    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().and_then(|n| n.to_str()) == Some(file_name) {
            return Ok(Some(path));
        }
    }

    subdirs.sort();
    for subdir in subdirs {
        if let Some(found) = find_file(&subdir, file_name)? {
            return Ok(Some(found));
        }
    }

    Ok(None)
}
