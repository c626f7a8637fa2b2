pub mod drag;
pub mod folder;
pub mod paginator;
pub mod reconcile;
pub mod sort;
pub mod view;

use crate::catalog::{resolve_folders, AppCatalog, FolderCatalog};
use crate::config::GridConfig;
use crate::error::GridError;
use crate::model::{Item, ItemId, ItemKind};
use crate::store::{GridLayout, LayoutStore};
use drag::{DragGeometry, DragOrigin, DragSource};
use folder::{DisplayArea, FolderLayout, FolderView};
use log::{debug, info, warn};
use reconcile::ReconcileReport;
use sort::SortPolicy;
use std::collections::{BTreeMap, HashMap, HashSet};

pub use drag::DragReorderController;
pub use folder::FolderSizeSolver;
pub use paginator::{GridPaginator, GridState};
pub use reconcile::ReconciliationEngine;
pub use view::GridView;

/// The root app grid: every visible app not claimed by a folder, plus one
/// icon per non-empty folder. Owns the folder views and persists its layout
/// after every structural change.
pub struct AppGridView<C, S> {
    config: GridConfig,
    catalog: C,
    store: S,
    state: GridState,
    folders: BTreeMap<ItemId, FolderView>,
    placeholder: Option<Item>,
    area: DisplayArea,
}

impl<C, S> AppGridView<C, S>
where
    C: AppCatalog + FolderCatalog,
    S: LayoutStore,
{
    pub fn new(config: GridConfig, catalog: C, store: S) -> Self {
        let state = GridState::new(config.items_per_page(), config.allow_incomplete_pages);
        Self {
            config,
            catalog,
            store,
            state,
            folders: BTreeMap::new(),
            placeholder: None,
            area: DisplayArea::default(),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut C {
        &mut self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn folder(&self, id: &ItemId) -> Option<&FolderView> {
        self.folders.get(id)
    }

    pub fn folder_mut(&mut self, id: &ItemId) -> Option<&mut FolderView> {
        self.folders.get_mut(id)
    }

    pub fn folders(&self) -> impl Iterator<Item = &FolderView> {
        self.folders.values()
    }

    pub fn area(&self) -> DisplayArea {
        self.area
    }

    /// Folder layouts depend on the area, so all of them go stale.
    pub fn set_area(&mut self, area: DisplayArea) {
        if self.area == area {
            return;
        }
        self.area = area;
        for folder in self.folders.values_mut() {
            folder.invalidate_layout();
        }
    }

    /// Page geometry for a drag over this grid.
    pub fn drag_geometry(&self, width: f32, height: f32) -> DragGeometry {
        DragGeometry {
            width,
            height,
            columns: self.config.columns.max(1) as usize,
            rows: self.config.rows.max(1) as usize,
            orientation: self.config.orientation,
        }
    }

    /// Solves the popup layout of every folder for the current area.
    pub fn realize_folders(&mut self) {
        let area = self.area;
        for folder in self.folders.values_mut() {
            folder.ensure_layout(area);
        }
    }

    /// The folder `id` as a drop target. Drops into it go through the
    /// catalog and take the app off the grid or folder it came from.
    pub fn folder_target(&mut self, id: &ItemId) -> Option<FolderDropTarget<'_, C, S>> {
        let mut folder = None;
        let mut others = Vec::new();
        for (key, view) in self.folders.iter_mut() {
            if key == id {
                folder = Some(view);
            } else {
                others.push(view);
            }
        }
        Some(FolderDropTarget {
            folder: folder?,
            others,
            root: &mut self.state,
            catalog: &mut self.catalog,
            store: &mut self.store,
            exclude_favorites: self.config.exclude_favorites,
        })
    }

    /// Layout for a folder about to be shown, with its items up to date.
    pub fn open_folder(&mut self, id: &ItemId) -> Option<FolderLayout> {
        let area = self.area;
        let folder = self.folders.get_mut(id)?;
        folder.redisplay();
        Some(folder.ensure_layout(area))
    }

    /// Drops the persisted layout so the next normalization starts fresh.
    pub fn forget_layout(&mut self) {
        info!("resetting app grid layout");
        if let Err(err) = self.store.save_layout(&GridLayout::default()) {
            warn!("Failed to clear grid layout: {err}");
        }
    }

    /// Removes every item and folder view. Returns how many items went.
    pub fn clear(&mut self) -> usize {
        self.folders.clear();
        self.state.clear().len()
    }

    /// Rewrites positions linearly in the persisted order, with items the
    /// layout does not know sorted by name after it, and saves the result.
    /// With nothing persisted this is a plain alphabetical re-flow.
    pub fn normalize_positions(&mut self) {
        let items = sort::order_by_layout(self.state.clear(), &self.store.get_layout());
        self.state = GridPaginator::place(
            items,
            self.config.items_per_page(),
            self.config.allow_incomplete_pages,
        );
        self.save_layout();
    }

    pub fn resize_grid(&mut self, columns: u32, rows: u32) {
        self.config.columns = columns.max(1);
        self.config.rows = rows.max(1);
        self.state.resize(self.config.items_per_page());
        self.save_layout();
    }

    /// Takes new settings and brings the grid in line with them.
    pub fn apply_config(&mut self, config: GridConfig) {
        let reshaped = config.items_per_page() != self.config.items_per_page();
        self.config = config;
        self.state
            .set_allow_incomplete_pages(self.config.allow_incomplete_pages);
        if reshaped {
            self.state.resize(self.config.items_per_page());
        }
        let policy = self.config.sort_policy();
        for folder in self.folders.values_mut() {
            folder.set_policy(policy);
            folder.invalidate_layout();
        }
        self.redisplay();
    }

    fn folder_policy(&self) -> SortPolicy {
        self.config.sort_policy()
    }

    /// Loads apps and folders and works out which grid each app belongs to.
    /// Folder members are tagged with their folder; the matching folder views
    /// get their member lists here.
    fn resolve_items(&mut self) -> Vec<Item> {
        let apps = self.catalog.load_items();
        let placeholder_id = self.placeholder.as_ref().map(|item| item.id.clone());
        let visible: Vec<Item> = apps
            .iter()
            .map(Item::from)
            .filter(|item| !self.is_excluded(item))
            .filter(|item| Some(&item.id) != placeholder_id.as_ref())
            .collect();

        let mut items = Vec::with_capacity(visible.len() + 1);
        let mut member_of: HashMap<ItemId, ItemId> = HashMap::new();

        if self.config.folders_enabled() {
            let visible_ids: HashSet<&ItemId> = visible.iter().map(|item| &item.id).collect();
            let memberships = resolve_folders(self.catalog.list_folders(), &apps, |id| {
                visible_ids.contains(&id)
            });
            let policy = self.folder_policy();
            for membership in memberships {
                let id = membership.folder.id.clone();
                if membership.members.is_empty() || self.catalog.is_folder_empty(&id) {
                    continue;
                }
                let members: Vec<Item> = visible
                    .iter()
                    .filter(|item| membership.members.contains(&item.id))
                    .map(|item| item.clone().in_folder(id.clone()))
                    .collect();
                for member in &members {
                    member_of.insert(member.id.clone(), id.clone());
                }

                let folder = self.folders.entry(id.clone()).or_insert_with(|| {
                    FolderView::new(
                        id.clone(),
                        membership.folder.name.clone(),
                        self.config.folder.clone(),
                        self.config.orientation,
                        policy,
                    )
                });
                folder.set_name(membership.folder.name.clone());
                folder.set_policy(policy);
                folder.set_members(members);
                items.push(Item::folder(id, membership.folder.name));
            }
        }

        for item in visible {
            match member_of.get(&item.id) {
                Some(folder) => {
                    let folder = folder.clone();
                    items.push(item.in_folder(folder));
                }
                None => items.push(item),
            }
        }
        items.extend(self.placeholder.clone());
        items
    }
}

impl<C, S> GridView for AppGridView<C, S>
where
    C: AppCatalog + FolderCatalog,
    S: LayoutStore,
{
    fn sort_policy(&self) -> SortPolicy {
        self.config.sort_policy()
    }

    fn flatten_folders(&self) -> bool {
        !self.config.folders_enabled()
    }

    fn state(&self) -> &GridState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GridState {
        &mut self.state
    }

    fn load_items(&mut self) -> Vec<Item> {
        self.resolve_items()
    }

    fn stored_layout(&self) -> GridLayout {
        self.store.get_layout()
    }

    fn is_excluded(&self, item: &Item) -> bool {
        (self.config.exclude_favorites && item.is_favorite)
            || (self.config.exclude_running && item.is_running)
    }

    fn remove_item(&mut self, id: &ItemId) -> Result<Item, GridError> {
        let item = self.state.remove(id)?;
        if item.kind == ItemKind::Folder {
            self.folders.remove(id);
        }
        Ok(item)
    }

    fn redisplay(&mut self) -> ReconcileReport {
        let report = reconcile::redisplay(self);
        for folder in self.folders.values_mut() {
            folder.redisplay();
        }
        if report.changed_layout() {
            self.save_layout();
        }
        report
    }

    fn set_placeholder(&mut self, placeholder: Option<Item>) {
        self.placeholder = placeholder;
    }

    /// An app dragged out of a folder leaves it; an excluded favorite that is
    /// placed on the grid stops being a favorite so it stays visible.
    fn finish_drop(&mut self, source: &DragSource) {
        let mut catalog_changed = false;
        if let DragOrigin::Folder(folder) = &source.origin {
            info!("moving {} out of folder {folder}", source.item.id);
            self.catalog.remove_app(folder, &source.item.id);
            catalog_changed = true;
        }
        if self.config.exclude_favorites && source.item.is_favorite {
            self.catalog.remove_favorite(&source.item.id);
            catalog_changed = true;
        }
        if catalog_changed {
            self.redisplay();
        }
    }

    fn save_layout(&mut self) {
        if let Err(err) = self.store.save_layout(&self.state.layout()) {
            warn!("Failed to save grid layout: {err}");
        }
    }
}

/// A folder of an [`AppGridView`] borrowed for one drag. Grid operations go
/// to the folder; a committed drop also updates the root grid and catalog.
pub struct FolderDropTarget<'a, C, S> {
    folder: &'a mut FolderView,
    others: Vec<&'a mut FolderView>,
    root: &'a mut GridState,
    catalog: &'a mut C,
    store: &'a mut S,
    exclude_favorites: bool,
}

impl<C, S> FolderDropTarget<'_, C, S> {
    pub fn folder(&self) -> &FolderView {
        &*self.folder
    }

    pub fn drag_geometry(&self, width: f32, height: f32) -> DragGeometry {
        self.folder.drag_geometry(width, height)
    }
}

impl<C, S> GridView for FolderDropTarget<'_, C, S>
where
    C: AppCatalog + FolderCatalog,
    S: LayoutStore,
{
    fn view_id(&self) -> Option<&ItemId> {
        self.folder.view_id()
    }

    fn sort_policy(&self) -> SortPolicy {
        self.folder.sort_policy()
    }

    fn state(&self) -> &GridState {
        self.folder.state()
    }

    fn state_mut(&mut self) -> &mut GridState {
        self.folder.state_mut()
    }

    fn load_items(&mut self) -> Vec<Item> {
        self.folder.load_items()
    }

    fn redisplay(&mut self) -> ReconcileReport {
        self.folder.redisplay()
    }

    fn set_placeholder(&mut self, placeholder: Option<Item>) {
        self.folder.set_placeholder(placeholder);
    }

    fn finish_drop(&mut self, source: &DragSource) {
        let folder_id = self.folder.id().clone();
        let app = &source.item.id;
        self.folder.finish_drop(source);
        match &source.origin {
            DragOrigin::Folder(from) if *from == folder_id => return,
            DragOrigin::Folder(from) => {
                self.catalog.remove_app(from, app);
                if let Some(origin) = self.others.iter_mut().find(|other| other.id() == from) {
                    origin.remove_member(app);
                }
            }
            DragOrigin::Grid => {
                if let Err(err) = self.root.remove(app) {
                    debug!("{app} was not on the grid: {err}");
                }
            }
        }
        info!("adding {app} to folder {folder_id}");
        self.catalog.add_app(&folder_id, app);
        if self.exclude_favorites && source.item.is_favorite {
            self.catalog.remove_favorite(app);
        }
    }

    /// Folder contents live in the catalog; the root layout is what changed.
    fn save_layout(&mut self) {
        if let Err(err) = self.store.save_layout(&self.root.layout()) {
            warn!("Failed to save grid layout: {err}");
        }
    }
}
