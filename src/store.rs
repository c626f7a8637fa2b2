use crate::error::GridError;
use crate::model::{ItemId, Slot};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted page/position assignments, one id list per page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GridLayout {
    #[serde(default)]
    pub pages: Vec<Vec<ItemId>>,
}

impl GridLayout {
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(Vec::is_empty)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&ItemId, Slot)> {
        self.pages.iter().enumerate().flat_map(|(page, ids)| {
            ids.iter()
                .enumerate()
                .map(move |(position, id)| (id, Slot::new(page, position)))
        })
    }

    pub fn slot_of(&self, id: &ItemId) -> Option<Slot> {
        self.slots()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, slot)| slot)
    }
}

pub trait LayoutStore {
    fn get_layout(&self) -> GridLayout;
    fn save_layout(&mut self, layout: &GridLayout) -> Result<(), GridError>;
}

#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    layout: GridLayout,
    saves: usize,
}

impl MemoryLayoutStore {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout, saves: 0 }
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn get_layout(&self) -> GridLayout {
        self.layout.clone()
    }

    fn save_layout(&mut self, layout: &GridLayout) -> Result<(), GridError> {
        self.layout = layout.clone();
        self.saves += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JsonLayoutStore {
    path: PathBuf,
}

impl JsonLayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `layout.json` next to the grid config.
    pub fn in_config_dir() -> Option<Self> {
        crate::config::GridConfig::config_dir().map(|dir| Self::new(dir.join("layout.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayoutStore for JsonLayoutStore {
    fn get_layout(&self) -> GridLayout {
        if !self.path.exists() {
            return GridLayout::default();
        }
        match std::fs::File::open(&self.path) {
            Ok(file) => serde_json::from_reader(file).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse layout {}: {err}, starting empty",
                    self.path.display()
                );
                GridLayout::default()
            }),
            Err(err) => {
                warn!("Failed to open layout {}: {err}", self.path.display());
                GridLayout::default()
            }
        }
    }

    fn save_layout(&mut self, layout: &GridLayout) -> Result<(), GridError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, layout)?;
        Ok(())
    }
}
