pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod model;
pub mod runtime;
pub mod store;

pub use catalog::{AppCatalog, CatalogSnapshot, FolderCatalog};
pub use config::GridConfig;
pub use error::GridError;
pub use events::GridEvent;
pub use grid::{AppGridView, GridView};
pub use model::{Item, ItemId, ItemKind, Slot, SlotPosition};
pub use runtime::GridRuntime;
pub use store::{GridLayout, JsonLayoutStore, LayoutStore, MemoryLayoutStore};
