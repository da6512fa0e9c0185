// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill discovery and loading.
//!
//! Skills live under the skills directory, one subdirectory per skill:
//! `<skills>/<name>/skill.toml` (manifest) and `<skills>/<name>/SKILL.md`
//! (guidance content, optional).

use fm_core::SkillManifest;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("skill '{0}' not found")]
    NotFound(String),
    #[error("skill manifest for '{name}' is invalid: {source}")]
    InvalidManifest {
        name: String,
        source: toml::de::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded skill: manifest plus guidance markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub manifest: SkillManifest,
    pub content: String,
}

/// Load one skill by name.
pub fn load_skill(skills_dir: &Path, name: &str) -> Result<Skill, SkillError> {
    let dir = skills_dir.join(name);
    let manifest_path = dir.join("skill.toml");
    if !manifest_path.exists() {
        return Err(SkillError::NotFound(name.to_string()));
    }
    let manifest_text = std::fs::read_to_string(&manifest_path)?;
    let manifest =
        SkillManifest::parse(&manifest_text).map_err(|source| SkillError::InvalidManifest {
            name: name.to_string(),
            source,
        })?;
    let content_path = dir.join("SKILL.md");
    let content = if content_path.exists() {
        std::fs::read_to_string(&content_path)?
    } else {
        String::new()
    };
    Ok(Skill { manifest, content })
}

/// Names of every skill with a readable manifest, sorted.
pub fn discover_skills(skills_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(skills_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().join("skill.toml").exists())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
