use crate::model::ItemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    /// The targeted item is no longer present in the grid.
    #[error("item {0} is no longer in the grid")]
    StaleReference(ItemId),
    /// Inserting would place a second copy of an item into the grid.
    #[error("item {0} is already in the grid")]
    DuplicateItem(ItemId),
    #[error("grid does not accept a drop of {0}")]
    InvalidDrop(ItemId),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
