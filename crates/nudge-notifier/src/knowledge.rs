//! Failure-message knowledge base mapping known failures to treatments.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct KnowledgeFile {
    entries: Vec<KnowledgeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct KnowledgeEntry {
    pattern: String,
    treatment: String,
}

#[derive(Debug)]
struct CompiledEntry {
    pattern: Regex,
    treatment: String,
}

/// Ordered failure-pattern lookup; the first matching pattern wins.
#[derive(Debug)]
pub struct KnowledgeBase {
    entries: Vec<CompiledEntry>,
}

impl KnowledgeBase {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: KnowledgeFile =
            serde_json::from_str(raw).context("invalid knowledge base JSON")?;
        let mut entries = Vec::with_capacity(file.entries.len());
        for entry in file.entries {
            let pattern = Regex::new(&entry.pattern).with_context(|| {
                format!("invalid knowledge base pattern {:?}", entry.pattern)
            })?;
            entries.push(CompiledEntry {
                pattern,
                treatment: entry.treatment,
            });
        }
        Ok(Self { entries })
    }

    /// Returns the treatment for the first pattern matching the failure
    /// message.
    pub fn treatment(&self, failure_message: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(failure_message))
            .map(|entry| entry.treatment.as_str())
    }
}
