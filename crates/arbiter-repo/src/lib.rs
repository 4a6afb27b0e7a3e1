//! Repository adapters: load policy and request documents, discover policy files.
//!
//! This crate is allowed to do filesystem IO. Documents are JSON encodings of
//! the `arbiter-domain` model types.

#![forbid(unsafe_code)]

mod discover;
mod parse;

use anyhow::Context;
use arbiter_domain::model::{ContextDocument, IdReference, Policy, PolicyDocument, PolicySet};
use arbiter_domain::{InMemoryPolicyRepository, PolicyRepository};
use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;

pub use discover::discover_policy_files;
pub use parse::{parse_context_document, parse_policy_document, parse_policy_element, policy_problems};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    /// Parse arbitrary text as a policy document.
    ///
    /// **Never panics** on any input.
    pub fn parse_policy(text: &str) -> anyhow::Result<()> {
        let _ = super::parse::parse_policy_document(text)?;
        Ok(())
    }

    /// Parse arbitrary text as a request context document.
    ///
    /// **Never panics** on any input.
    pub fn parse_context(text: &str) -> anyhow::Result<()> {
        let _ = super::parse::parse_context_document(text)?;
        Ok(())
    }
}

pub fn load_policy_document(path: &Utf8Path) -> anyhow::Result<PolicyDocument> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    parse::parse_policy_document(&text).with_context(|| format!("parse {path}"))
}

pub fn load_context_document(path: &Utf8Path) -> anyhow::Result<ContextDocument> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    parse::parse_context_document(&text).with_context(|| format!("parse {path}"))
}

/// Policies and policy sets loaded from the files under a set of search paths,
/// served to the engine for reference resolution.
#[derive(Clone, Debug, Default)]
pub struct FilePolicyRepository {
    inner: InMemoryPolicyRepository,
    sources: Vec<Utf8PathBuf>,
}

impl FilePolicyRepository {
    /// Load every policy file below `search_paths` (relative paths are joined
    /// onto `base`). Files are parsed in parallel; any unreadable or invalid
    /// file fails the whole load.
    pub fn load(base: &Utf8Path, search_paths: &[String]) -> anyhow::Result<Self> {
        let mut sources = Vec::new();
        for search_path in search_paths {
            let dir = base.join(search_path);
            sources.extend(
                discover::discover_policy_files(&dir)
                    .with_context(|| format!("discover policies in {dir}"))?,
            );
        }
        sources.sort();
        sources.dedup();

        let elements = sources
            .par_iter()
            .map(|path| {
                let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
                parse::parse_policy_element(&text).with_context(|| format!("parse {path}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        tracing::debug!(files = sources.len(), "loaded policy repository");

        Ok(Self {
            inner: elements.into_iter().collect(),
            sources,
        })
    }

    /// Files the repository was loaded from, in sorted order.
    pub fn sources(&self) -> &[Utf8PathBuf] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PolicyRepository for FilePolicyRepository {
    fn find_policy(&self, reference: &IdReference) -> Option<&Policy> {
        self.inner.find_policy(reference)
    }

    fn find_policy_set(&self, reference: &IdReference) -> Option<&PolicySet> {
        self.inner.find_policy_set(reference)
    }
}
