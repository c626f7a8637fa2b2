use super::drag::DragSource;
use super::paginator::GridState;
use super::reconcile::{self, ReconcileReport};
use super::sort::SortPolicy;
use crate::error::GridError;
use crate::model::{Item, ItemId, Slot, SlotPosition};
use crate::store::GridLayout;

/// What the layout engine needs from a grid of icons. The root app grid and
/// every folder popup implement it; reconciliation and drag handling only
/// ever talk to a grid through this trait.
pub trait GridView {
    /// Id of the folder this grid shows, `None` for the root grid.
    fn view_id(&self) -> Option<&ItemId> {
        None
    }

    fn sort_policy(&self) -> SortPolicy;

    /// When set, the root grid shows every app and no folder icons.
    fn flatten_folders(&self) -> bool {
        false
    }

    fn state(&self) -> &GridState;

    fn state_mut(&mut self) -> &mut GridState;

    /// Pulls the current item set. Called at the start of every redisplay.
    fn load_items(&mut self) -> Vec<Item>;

    /// Persisted placement used to position items a manual grid has not seen.
    fn stored_layout(&self) -> GridLayout {
        GridLayout::default()
    }

    /// Whether policy hides `item` from this grid even though it is installed.
    fn is_excluded(&self, _item: &Item) -> bool {
        false
    }

    fn add_item(
        &mut self,
        item: Item,
        page: usize,
        position: SlotPosition,
    ) -> Result<Slot, GridError> {
        self.state_mut().insert(item, page, position)
    }

    fn remove_item(&mut self, id: &ItemId) -> Result<Item, GridError> {
        self.state_mut().remove(id)
    }

    fn move_item(
        &mut self,
        id: &ItemId,
        page: usize,
        position: SlotPosition,
    ) -> Result<Slot, GridError> {
        self.state_mut().move_item(id, page, position)
    }

    fn redisplay(&mut self) -> ReconcileReport
    where
        Self: Sized,
    {
        reconcile::redisplay(self)
    }

    /// Registers the drag placeholder so redisplays during a drag keep it.
    fn set_placeholder(&mut self, _placeholder: Option<Item>) {}

    /// Side effects of a committed drop beyond the move itself.
    fn finish_drop(&mut self, _source: &DragSource) {}

    fn save_layout(&mut self) {}
}
