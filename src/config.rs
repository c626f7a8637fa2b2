use crate::grid::sort::{SortMode, SortPolicy, TieBreaks};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderConfig {
    /// Fixed column count; `None` lets the solver pick.
    #[serde(default)]
    pub columns: Option<u32>,
    #[serde(default)]
    pub rows: Option<u32>,
    /// Fixed icon size; `None` means adaptive and uses `default_icon_size`.
    #[serde(default)]
    pub icon_size: Option<u32>,
    #[serde(default = "default_folder_icon_size")]
    pub default_icon_size: u32,
    #[serde(default = "default_spacing")]
    pub spacing: u32,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            columns: None,
            rows: None,
            icon_size: None,
            default_icon_size: default_folder_icon_size(),
            spacing: default_spacing(),
        }
    }
}

impl FolderConfig {
    pub fn effective_icon_size(&self) -> u32 {
        self.icon_size.unwrap_or(self.default_icon_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DragConfig {
    #[serde(default = "default_edge_zone_px")]
    pub edge_zone_px: f32,
    #[serde(default = "default_edge_bump_cooldown_ms")]
    pub edge_bump_cooldown_ms: u64,
    #[serde(default = "default_hover_switch_delay_ms")]
    pub hover_switch_delay_ms: u64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            edge_zone_px: default_edge_zone_px(),
            edge_bump_cooldown_ms: default_edge_bump_cooldown_ms(),
            hover_switch_delay_ms: default_hover_switch_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    #[serde(default = "default_grid_cols")]
    pub columns: u32,
    #[serde(default = "default_grid_rows")]
    pub rows: u32,
    #[serde(default)]
    pub allow_incomplete_pages: bool,
    #[serde(default)]
    pub sort_mode: SortMode,
    #[serde(default)]
    pub favorites_first: bool,
    #[serde(default)]
    pub running_first: bool,
    #[serde(default)]
    pub exclude_favorites: bool,
    #[serde(default)]
    pub exclude_running: bool,
    #[serde(default = "default_show_folders")]
    pub show_folders: bool,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub folder: FolderConfig,
    #[serde(default)]
    pub drag: DragConfig,
}

fn default_grid_cols() -> u32 {
    6
}

fn default_grid_rows() -> u32 {
    4
}

fn default_show_folders() -> bool {
    true
}

fn default_folder_icon_size() -> u32 {
    96
}

fn default_spacing() -> u32 {
    12
}

fn default_edge_zone_px() -> f32 {
    20.0
}

fn default_edge_bump_cooldown_ms() -> u64 {
    1000
}

fn default_hover_switch_delay_ms() -> u64 {
    1000
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: default_grid_cols(),
            rows: default_grid_rows(),
            allow_incomplete_pages: false,
            sort_mode: SortMode::Manual,
            favorites_first: false,
            running_first: false,
            exclude_favorites: false,
            exclude_running: false,
            show_folders: default_show_folders(),
            orientation: Orientation::Horizontal,
            folder: FolderConfig::default(),
            drag: DragConfig::default(),
        }
    }
}

impl GridConfig {
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "app_grid", "app_grid")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn load() -> Self {
        match Self::config_dir() {
            Some(dir) => Self::load_from(&dir.join("config.json")),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(file) = std::fs::File::open(path) {
                match serde_json::from_reader(file) {
                    Ok(config) => return config,
                    Err(err) => warn!("Failed to parse config {}: {err}, using default", path.display()),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        if let Some(dir) = Self::config_dir() {
            self.save_to(&dir.join("config.json"));
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            if std::fs::create_dir_all(dir).is_err() {
                warn!("Failed to create config dir {}", dir.display());
                return;
            }
        }
        if let Ok(file) = std::fs::File::create(path) {
            if let Err(err) = serde_json::to_writer_pretty(file, self) {
                warn!("Failed to write config {}: {err}", path.display());
            }
        }
    }

    pub fn items_per_page(&self) -> usize {
        (self.columns.max(1) as usize).saturating_mul(self.rows.max(1) as usize)
    }

    pub fn sort_policy(&self) -> SortPolicy {
        SortPolicy {
            mode: self.sort_mode,
            tie_breaks: TieBreaks {
                favorites_first: self.favorites_first,
                running_first: self.running_first,
            },
        }
    }

    /// Folder icons only make sense when the user places icons by hand.
    pub fn folders_enabled(&self) -> bool {
        self.show_folders && self.sort_mode == SortMode::Manual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn missing_fields_take_defaults() {
        let config: GridConfig =
            serde_json::from_str(r#"{ "columns": 8, "sort_mode": "Alphabetical" }"#)
                .expect("parse config");
        assert_eq!(config.columns, 8);
        assert_eq!(config.rows, 4);
        assert_eq!(config.sort_mode, SortMode::Alphabetical);
        assert_eq!(config.folder.spacing, 12);
        assert_eq!(config.drag.hover_switch_delay_ms, 1000);
        assert!(!config.folders_enabled());
    }

    #[test]
    fn huge_grid_shape_does_not_overflow() {
        let config = GridConfig {
            columns: u32::MAX,
            rows: u32::MAX,
            ..GridConfig::default()
        };
        assert!(config.items_per_page() >= u32::MAX as usize);
    }

    #[test]
    fn unparsable_file_falls_back_to_default() {
        let uniq = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time error")
            .as_nanos();
        let base = std::env::temp_dir().join(format!("app_grid_config_test_{uniq}"));
        std::fs::create_dir_all(&base).expect("create temp dir");
        let path = base.join("config.json");
        std::fs::write(&path, b"{ not json").expect("write config");

        assert_eq!(GridConfig::load_from(&path), GridConfig::default());

        let mut config = GridConfig::default();
        config.columns = 7;
        config.folder.columns = Some(3);
        config.save_to(&path);
        assert_eq!(GridConfig::load_from(&path), config);

        let _ = std::fs::remove_dir_all(&base);
    }
}
