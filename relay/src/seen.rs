use anyhow::{Context, Result};
use ecsr::{ItemId, ItemReference};
use log::warn;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Identifiers that already produced a notification, mirrored to a JSON array on disk.
#[derive(Debug)]
pub(crate) struct SeenSet {
    path: PathBuf,
    ids: HashSet<ItemId>,
}

impl SeenSet {
    /// Reads the seen file. A missing or malformed file starts an empty set.
    pub(crate) fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str::<Vec<ItemId>>(&data)
                .map(|ids| ids.into_iter().collect())
                .unwrap_or_else(|e| {
                    warn!("Ignoring malformed seen file {}: {e}", path.display());
                    HashSet::new()
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                warn!("Couldn't read seen file {}: {e}", path.display());
                HashSet::new()
            }
        };

        Self { path, ids }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    pub(crate) fn insert(&mut self, id: ItemId) -> bool {
        self.ids.insert(id)
    }

    pub(crate) fn filter_new(&self, items: &[ItemReference]) -> Vec<ItemReference> {
        items
            .iter()
            .filter(|item| !self.contains(&item.id))
            .cloned()
            .collect()
    }

    /// Rewrites the whole file.
    pub(crate) fn persist(&self) -> Result<()> {
        let data = serde_json::to_string(&self.ids)?;
        std::fs::write(&self.path, data)
            .with_context(|| format!("Failed to write seen file {}", self.path.display()))
    }
}
