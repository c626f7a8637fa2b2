use crate::config::GridConfig;
use crate::grid::folder::DisplayArea;

/// Notifications the grid reacts to. Data changes from the catalogs all lead
/// to a redisplay; the rest reshape the grid or reset it.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    AppsChanged,
    AppStateChanged,
    FavoritesChanged,
    FoldersChanged,
    LayoutReset,
    AreaChanged(DisplayArea),
    GridResized { columns: u32, rows: u32 },
    ConfigChanged(Box<GridConfig>),
}

impl GridEvent {
    pub fn is_data_change(&self) -> bool {
        matches!(
            self,
            GridEvent::AppsChanged
                | GridEvent::AppStateChanged
                | GridEvent::FavoritesChanged
                | GridEvent::FoldersChanged
        )
    }
}
