use super::drag::{DragGeometry, DragOrigin, DragSource};
use super::paginator::GridState;
use super::reconcile::{self, ReconcileReport};
use super::sort::SortPolicy;
use super::view::GridView;
use crate::config::{FolderConfig, Orientation};
use crate::model::{Item, ItemId};
use log::debug;
use serde::Serialize;

/// Axis length a folder grid uses before its first layout is solved.
const UNSOLVED_AXIS: u32 = 20;

/// Screen space available to folder popups, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayArea {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl DisplayArea {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }
}

impl Default for DisplayArea {
    fn default() -> Self {
        Self::new(1920.0, 1080.0, 1.0)
    }
}

/// Fixed decoration around a folder grid, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FolderChrome {
    /// Added to the icon size to get an item's footprint.
    pub item_padding: f32,
    pub horizontal: f32,
    pub header: f32,
    pub footer: f32,
    pub minimum_width: f32,
    pub minimum_icon_size: f32,
}

impl FolderChrome {
    /// Page indicators sit beside a vertical grid, so less room is reserved
    /// left and right; a fixed column count there also trims the footer.
    pub fn for_orientation(orientation: Orientation, fixed_columns: bool) -> Self {
        let (side, footer) = match orientation {
            Orientation::Horizontal => (160.0, 100.0),
            Orientation::Vertical if fixed_columns => (100.0, 70.0),
            Orientation::Vertical => (100.0, 100.0),
        };
        Self {
            horizontal: 64.0 + side,
            footer,
            ..Self::default()
        }
    }
}

impl Default for FolderChrome {
    fn default() -> Self {
        Self {
            item_padding: 55.0,
            horizontal: 224.0,
            header: 75.0,
            footer: 100.0,
            minimum_width: 540.0,
            minimum_icon_size: 48.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FolderSizeRequest {
    pub item_count: usize,
    pub icon_size: u32,
    pub spacing: u32,
    /// Configured axes; `None` lets the solver choose.
    pub columns: Option<u32>,
    pub rows: Option<u32>,
    pub area: DisplayArea,
    pub chrome: FolderChrome,
}

impl FolderSizeRequest {
    pub fn new(item_count: usize, config: &FolderConfig, area: DisplayArea) -> Self {
        Self {
            item_count,
            icon_size: config.effective_icon_size(),
            spacing: config.spacing,
            columns: config.columns,
            rows: config.rows,
            area,
            chrome: FolderChrome::default(),
        }
    }

    pub fn with_chrome(mut self, chrome: FolderChrome) -> Self {
        self.chrome = chrome;
        self
    }
}

/// Solved popup geometry. Width and height are logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FolderLayout {
    pub columns: u32,
    pub rows: u32,
    pub pixel_width: f32,
    pub pixel_height: f32,
    pub icon_pixel_size: u32,
    /// Item count the layout was solved for.
    pub design_capacity: usize,
}

impl FolderLayout {
    pub fn capacity(&self) -> usize {
        (self.columns.max(1) as usize).saturating_mul(self.rows.max(1) as usize)
    }
}

pub struct FolderSizeSolver;

impl FolderSizeSolver {
    /// Initial shape before the popup is fitted to the screen. Unconfigured
    /// axes aim for a roughly square grid slightly wider than tall.
    pub fn grid_shape(item_count: u32, columns: Option<u32>, rows: Option<u32>) -> (u32, u32) {
        match (columns, rows) {
            (Some(columns), Some(rows)) => (columns.max(1), rows.max(1)),
            (Some(columns), None) => {
                let columns = columns.max(1);
                (columns, item_count.div_ceil(columns).max(1))
            }
            (None, Some(rows)) => {
                let rows = rows.max(1);
                (item_count.div_ceil(rows).max(1), rows)
            }
            (None, None) if item_count == 0 => (1, 1),
            (None, None) => {
                let mut columns = ceil_sqrt(item_count);
                let mut rows = columns;
                if columns * (columns - 1) >= item_count {
                    rows = columns - 1;
                } else if (columns + 1) * (columns - 1) >= item_count {
                    rows = columns - 1;
                    columns += 1;
                }
                (columns, rows.max(1))
            }
        }
    }

    pub fn solve(request: &FolderSizeRequest) -> FolderLayout {
        let chrome = request.chrome;
        let item_count = u32::try_from(request.item_count).unwrap_or(u32::MAX);
        let scale = if request.area.scale_factor.is_finite() && request.area.scale_factor > 0.0 {
            request.area.scale_factor
        } else {
            1.0
        };
        let available_width = request.area.width.max(0.0);
        let available_height = request.area.height.max(0.0);
        let spacing = request.spacing as f32;
        let cell = request.icon_size as f32 + chrome.item_padding + spacing;

        let (mut columns, mut rows) =
            Self::grid_shape(item_count, request.columns, request.rows);
        let mut width = columns as f32 * cell + chrome.horizontal;
        let mut height = rows as f32 * cell + chrome.header + chrome.footer;

        if request.rows.is_none() {
            while height * scale > available_height && rows > 1 {
                height -= cell;
                rows -= 1;
            }
        }
        if request.columns.is_none() {
            while width * scale > available_width && columns > 1 {
                width -= cell;
                columns -= 1;
            }
        }

        let min_item = chrome.minimum_icon_size + chrome.item_padding;
        let fits = |count: u32, available: f32| {
            count as f32 * min_item + count.saturating_sub(1) as f32 * spacing <= available / scale
        };
        let max_fitting = |available: f32| ((available / scale) / (min_item + spacing)).floor().max(1.0) as u32;

        if request.columns.is_none() {
            while item_count > columns * rows && (width + cell) * scale <= available_width {
                width += cell;
                columns += 1;
            }
            if !fits(columns, available_width) {
                columns = max_fitting(available_width);
                width = columns as f32 * cell + chrome.horizontal;
            }
        }
        if request.rows.is_none() {
            while item_count > columns * rows && (height + cell) * scale <= available_height {
                height += cell;
                rows += 1;
            }
            if !fits(rows, available_height) {
                rows = max_fitting(available_height);
                height = rows as f32 * cell + chrome.header + chrome.footer;
            }
        }

        let logical_width = available_width / scale;
        let logical_height = available_height / scale;
        let pixel_width = if logical_width >= chrome.minimum_width {
            width.clamp(chrome.minimum_width, logical_width)
        } else {
            logical_width
        };
        let pixel_height = height.clamp(0.0, logical_height);

        FolderLayout {
            columns,
            rows,
            pixel_width,
            pixel_height,
            icon_pixel_size: request.icon_size,
            design_capacity: request.item_count,
        }
    }
}

fn ceil_sqrt(n: u32) -> u32 {
    let mut root = f64::from(n).sqrt().ceil() as u32;
    while root.saturating_mul(root) < n {
        root += 1;
    }
    while root > 1 && (root - 1) * (root - 1) >= n {
        root -= 1;
    }
    root.max(1)
}

/// Grid inside a folder popup. Members are pushed in by the root grid, which
/// resolves folder membership; the layout is solved lazily and cached until
/// the member count or the display area changes.
#[derive(Debug, Clone)]
pub struct FolderView {
    id: ItemId,
    name: String,
    config: FolderConfig,
    orientation: Orientation,
    policy: SortPolicy,
    state: GridState,
    members: Vec<Item>,
    placeholder: Option<Item>,
    layout: Option<FolderLayout>,
    layout_valid: bool,
    area: Option<DisplayArea>,
}

impl FolderView {
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        config: FolderConfig,
        orientation: Orientation,
        policy: SortPolicy,
    ) -> Self {
        let columns = config.columns.unwrap_or(UNSOLVED_AXIS).max(1);
        let rows = config.rows.unwrap_or(UNSOLVED_AXIS).max(1);
        Self {
            id,
            name: name.into(),
            config,
            orientation,
            policy,
            state: GridState::new((columns as usize).saturating_mul(rows as usize), false),
            members: Vec::new(),
            placeholder: None,
            layout: None,
            layout_valid: false,
            area: None,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn members(&self) -> &[Item] {
        &self.members
    }

    pub fn set_members(&mut self, members: Vec<Item>) {
        self.members = members;
    }

    /// Drops `id` from the members and the grid, as when it is dragged into
    /// another folder. Returns whether it was shown here.
    pub fn remove_member(&mut self, id: &ItemId) -> bool {
        self.members.retain(|member| member.id != *id);
        match self.state.remove(id) {
            Ok(_) => {
                self.invalidate_layout();
                true
            }
            Err(err) => {
                debug!("folder {}: {err}", self.id);
                false
            }
        }
    }

    /// Page geometry for a drag inside the popup, from the solved layout.
    pub fn drag_geometry(&self, width: f32, height: f32) -> DragGeometry {
        let (columns, rows) = self
            .layout
            .map_or((1, 1), |layout| (layout.columns, layout.rows));
        DragGeometry {
            width,
            height,
            columns: columns.max(1) as usize,
            rows: rows.max(1) as usize,
            orientation: self.orientation,
        }
    }

    pub fn set_policy(&mut self, policy: SortPolicy) {
        self.policy = policy;
    }

    pub fn layout(&self) -> Option<&FolderLayout> {
        self.layout.as_ref()
    }

    pub fn is_layout_valid(&self) -> bool {
        self.layout_valid && self.layout.is_some()
    }

    /// Marks the cached layout stale without dropping it.
    pub fn invalidate_layout(&mut self) {
        self.layout_valid = false;
    }

    /// Returns the popup layout for `area`, solving it again when the cached
    /// one is stale, was solved for another item count, or for another area.
    pub fn ensure_layout(&mut self, area: DisplayArea) -> FolderLayout {
        let count = self.state.len();
        if let Some(layout) = self.layout {
            if self.layout_valid && layout.design_capacity == count && self.area == Some(area) {
                return layout;
            }
        }

        let chrome = FolderChrome::for_orientation(self.orientation, self.config.columns.is_some());
        let request = FolderSizeRequest::new(count, &self.config, area).with_chrome(chrome);
        let layout = FolderSizeSolver::solve(&request);
        debug!(
            "folder {}: {}x{} grid, {}x{} px for {count} items",
            self.id, layout.columns, layout.rows, layout.pixel_width, layout.pixel_height
        );

        if layout.capacity() != self.state.items_per_page() {
            self.state.resize(layout.capacity());
        }
        self.layout = Some(layout);
        self.layout_valid = true;
        self.area = Some(area);
        layout
    }
}

impl GridView for FolderView {
    fn view_id(&self) -> Option<&ItemId> {
        Some(&self.id)
    }

    fn sort_policy(&self) -> SortPolicy {
        self.policy
    }

    fn state(&self) -> &GridState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GridState {
        &mut self.state
    }

    fn load_items(&mut self) -> Vec<Item> {
        let mut items = self.members.clone();
        items.extend(self.placeholder.clone());
        items
    }

    fn redisplay(&mut self) -> ReconcileReport {
        let before = self.state.len();
        let report = reconcile::redisplay(self);
        if self.state.len() != before {
            self.invalidate_layout();
        }
        report
    }

    fn set_placeholder(&mut self, placeholder: Option<Item>) {
        self.placeholder = placeholder;
    }

    /// An app dropped in from elsewhere becomes a member, so redisplays keep
    /// it until the catalog reports the new membership itself.
    fn finish_drop(&mut self, source: &DragSource) {
        if source.origin == DragOrigin::Folder(self.id.clone()) {
            return;
        }
        let Some(item) = self.state.item(&source.item.id).cloned() else {
            return;
        };
        self.members.retain(|member| member.id != item.id);
        self.members.push(item);
        self.invalidate_layout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(item_count: usize, area: DisplayArea) -> FolderSizeRequest {
        FolderSizeRequest::new(item_count, &FolderConfig::default(), area)
    }

    fn roomy() -> DisplayArea {
        DisplayArea::new(4000.0, 4000.0, 1.0)
    }

    #[test]
    fn adaptive_shape_prefers_wide_grids() {
        assert_eq!(FolderSizeSolver::grid_shape(9, None, None), (3, 3));
        assert_eq!(FolderSizeSolver::grid_shape(10, None, None), (4, 3));
        assert_eq!(FolderSizeSolver::grid_shape(5, None, None), (3, 2));
        assert_eq!(FolderSizeSolver::grid_shape(2, None, None), (2, 1));
        assert_eq!(FolderSizeSolver::grid_shape(7, Some(2), None), (2, 4));
    }

    #[test]
    fn roomy_area_keeps_initial_shape() {
        let nine = FolderSizeSolver::solve(&request(9, roomy()));
        assert_eq!((nine.columns, nine.rows), (3, 3));
        let ten = FolderSizeSolver::solve(&request(10, roomy()));
        assert_eq!((ten.columns, ten.rows), (4, 3));
        assert_eq!(ten.icon_pixel_size, 96);
        assert_eq!(ten.design_capacity, 10);
    }

    #[test]
    fn capacity_of_huge_layout_does_not_overflow() {
        let layout = FolderLayout {
            columns: u32::MAX,
            rows: u32::MAX,
            pixel_width: 0.0,
            pixel_height: 0.0,
            icon_pixel_size: 96,
            design_capacity: 0,
        };
        assert!(layout.capacity() >= u32::MAX as usize);
    }

    #[test]
    fn solving_twice_gives_the_same_layout() {
        let request = request(23, DisplayArea::new(1280.0, 800.0, 1.25));
        assert_eq!(FolderSizeSolver::solve(&request), FolderSizeSolver::solve(&request));
    }

    #[test]
    fn small_area_shrinks_to_fit() {
        let area = DisplayArea::new(700.0, 700.0, 1.0);
        let layout = FolderSizeSolver::solve(&request(16, area));
        assert_eq!((layout.columns, layout.rows), (2, 3));
        assert!(layout.pixel_width <= area.width);
        assert!(layout.pixel_height <= area.height);
        assert!(layout.pixel_width >= FolderChrome::default().minimum_width);
    }

    #[test]
    fn short_area_widens_after_losing_rows() {
        let layout = FolderSizeSolver::solve(&request(9, DisplayArea::new(2000.0, 450.0, 1.0)));
        assert_eq!((layout.columns, layout.rows), (9, 1));
    }

    #[test]
    fn empty_folder_gets_minimum_layout() {
        let layout = FolderSizeSolver::solve(&request(0, roomy()));
        assert_eq!((layout.columns, layout.rows), (1, 1));
        assert_eq!(layout.pixel_width, FolderChrome::default().minimum_width);
    }

    #[test]
    fn configured_axes_are_kept() {
        let config = FolderConfig {
            columns: Some(5),
            rows: Some(2),
            ..FolderConfig::default()
        };
        let layout = FolderSizeSolver::solve(&FolderSizeRequest::new(30, &config, roomy()));
        assert_eq!((layout.columns, layout.rows), (5, 2));
    }

    #[test]
    fn view_caches_layout_until_members_change() {
        let mut view = FolderView::new(
            "tools".into(),
            "Tools",
            FolderConfig::default(),
            Orientation::Horizontal,
            SortPolicy::manual(),
        );
        view.set_members(
            (0..4)
                .map(|i| Item::app(format!("app{i}"), format!("App {i}")).in_folder("tools"))
                .collect(),
        );
        view.redisplay();
        let first = view.ensure_layout(roomy());
        assert_eq!((first.columns, first.rows), (2, 2));
        assert_eq!(view.state().items_per_page(), 4);
        assert!(view.is_layout_valid());

        view.set_members(view.members()[..3].to_vec());
        view.redisplay();
        assert!(!view.is_layout_valid());
        let second = view.ensure_layout(roomy());
        assert_eq!(second.design_capacity, 3);
        assert_eq!(view.state().len(), 3);
    }
}
