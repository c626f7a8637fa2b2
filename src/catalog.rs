use crate::error::GridError;
use crate::model::{Item, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// An installed application as the app catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub usage_rank: u64,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl AppDescriptor {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_favorite: false,
            is_running: false,
            usage_rank: 0,
            categories: Vec::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&AppDescriptor> for Item {
    fn from(app: &AppDescriptor) -> Self {
        Item::app(app.id.clone(), app.name.clone())
            .with_favorite(app.is_favorite)
            .with_running(app.is_running)
            .with_usage(app.usage_rank)
    }
}

/// A folder definition: explicitly listed apps plus every app in one of its
/// categories, minus the apps it excludes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDescriptor {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub apps: Vec<ItemId>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub excluded_apps: Vec<ItemId>,
}

impl FolderDescriptor {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            apps: Vec::new(),
            categories: Vec::new(),
            excluded_apps: Vec::new(),
        }
    }

    pub fn with_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ItemId>,
    {
        self.apps = apps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }
}

pub trait AppCatalog {
    fn load_items(&self) -> Vec<AppDescriptor>;
    fn remove_favorite(&mut self, id: &ItemId);
}

pub trait FolderCatalog {
    fn list_folders(&self) -> Vec<FolderDescriptor>;
    fn is_folder_empty(&self, id: &ItemId) -> bool;
    fn remove_app(&mut self, folder: &ItemId, app: &ItemId);
    fn add_app(&mut self, folder: &ItemId, app: &ItemId);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMembership {
    pub folder: FolderDescriptor,
    pub members: Vec<ItemId>,
}

/// Resolves which visible apps each folder holds. An app belongs to the first
/// folder that claims it; apps `is_visible` rejects belong to no folder.
pub fn resolve_folders(
    folders: Vec<FolderDescriptor>,
    apps: &[AppDescriptor],
    is_visible: impl Fn(&ItemId) -> bool,
) -> Vec<FolderMembership> {
    let mut claimed: HashSet<ItemId> = HashSet::new();
    folders
        .into_iter()
        .map(|folder| {
            let by_category = apps
                .iter()
                .filter(|app| app.categories.iter().any(|c| folder.categories.contains(c)))
                .map(|app| &app.id);
            let members = folder
                .apps
                .iter()
                .chain(by_category)
                .filter(|id| !folder.excluded_apps.contains(*id) && is_visible(*id))
                .filter(|id| claimed.insert((*id).clone()))
                .cloned()
                .collect();
            FolderMembership { folder, members }
        })
        .collect()
}

/// App and folder catalog held in memory, loadable from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub apps: Vec<AppDescriptor>,
    #[serde(default)]
    pub folders: Vec<FolderDescriptor>,
}

impl CatalogSnapshot {
    pub fn load(path: &Path) -> Result<Self, GridError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn with_app(mut self, app: AppDescriptor) -> Self {
        self.install(app);
        self
    }

    pub fn with_folder(mut self, folder: FolderDescriptor) -> Self {
        self.folders.push(folder);
        self
    }

    /// Adds or replaces an app.
    pub fn install(&mut self, app: AppDescriptor) {
        match self.apps.iter_mut().find(|known| known.id == app.id) {
            Some(known) => *known = app,
            None => self.apps.push(app),
        }
    }

    pub fn uninstall(&mut self, id: &ItemId) -> Option<AppDescriptor> {
        let index = self.apps.iter().position(|app| app.id == *id)?;
        Some(self.apps.remove(index))
    }

    pub fn app_mut(&mut self, id: &ItemId) -> Option<&mut AppDescriptor> {
        self.apps.iter_mut().find(|app| app.id == *id)
    }

    pub fn folder(&self, id: &ItemId) -> Option<&FolderDescriptor> {
        self.folders.iter().find(|folder| folder.id == *id)
    }
}

impl AppCatalog for CatalogSnapshot {
    fn load_items(&self) -> Vec<AppDescriptor> {
        self.apps.clone()
    }

    fn remove_favorite(&mut self, id: &ItemId) {
        if let Some(app) = self.app_mut(id) {
            app.is_favorite = false;
        }
    }
}

impl FolderCatalog for CatalogSnapshot {
    fn list_folders(&self) -> Vec<FolderDescriptor> {
        self.folders.clone()
    }

    fn is_folder_empty(&self, id: &ItemId) -> bool {
        self.folder(id)
            .map_or(true, |folder| folder.apps.is_empty() && folder.categories.is_empty())
    }

    /// Listed apps are dropped from the list; apps matched by category are
    /// excluded so the category does not pull them back in.
    fn remove_app(&mut self, folder: &ItemId, app: &ItemId) {
        let categories: Vec<String> = self
            .apps
            .iter()
            .find(|known| known.id == *app)
            .map(|known| known.categories.clone())
            .unwrap_or_default();
        let Some(folder) = self.folders.iter_mut().find(|known| known.id == *folder) else {
            return;
        };
        folder.apps.retain(|listed| listed != app);
        let matched = categories.iter().any(|c| folder.categories.contains(c));
        if matched && !folder.excluded_apps.contains(app) {
            folder.excluded_apps.push(app.clone());
        }
    }

    /// Lists the app in the folder and lifts any exclusion that kept it out.
    fn add_app(&mut self, folder: &ItemId, app: &ItemId) {
        let Some(folder) = self.folders.iter_mut().find(|known| known.id == *folder) else {
            return;
        };
        folder.excluded_apps.retain(|excluded| excluded != app);
        if !folder.apps.contains(app) {
            folder.apps.push(app.clone());
        }
    }
}
