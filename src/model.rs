use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    App,
    Folder,
    /// Stand-in for a dragged app that does not live in the receiving grid yet.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub display_name: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_running: bool,
    /// Higher rank means more frequently used.
    #[serde(default)]
    pub usage_rank: u64,
    #[serde(default)]
    pub folder_id: Option<ItemId>,
}

impl Item {
    pub fn app(id: impl Into<ItemId>, display_name: impl Into<String>) -> Self {
        Self::new(id.into(), ItemKind::App, display_name.into())
    }

    pub fn folder(id: impl Into<ItemId>, display_name: impl Into<String>) -> Self {
        Self::new(id.into(), ItemKind::Folder, display_name.into())
    }

    fn new(id: ItemId, kind: ItemKind, display_name: String) -> Self {
        let display_name = Some(display_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| id.as_str().to_string());
        Self {
            id,
            kind,
            display_name,
            is_favorite: false,
            is_running: false,
            usage_rank: 0,
            folder_id: None,
        }
    }

    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn with_running(mut self, is_running: bool) -> Self {
        self.is_running = is_running;
        self
    }

    pub fn with_usage(mut self, usage_rank: u64) -> Self {
        self.usage_rank = usage_rank;
        self
    }

    pub fn in_folder(mut self, folder_id: impl Into<ItemId>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    /// Copy of this item standing in for it while it is dragged into a grid
    /// that does not hold it.
    pub fn to_placeholder(&self) -> Self {
        Self {
            kind: ItemKind::Placeholder,
            folder_id: None,
            ..self.clone()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == ItemKind::Placeholder
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub page: usize,
    pub position: usize,
}

impl Slot {
    pub fn new(page: usize, position: usize) -> Self {
        Self { page, position }
    }

    pub fn linear_index(self, items_per_page: usize) -> usize {
        self.page * items_per_page.max(1) + self.position
    }

    pub fn from_linear_index(index: usize, items_per_page: usize) -> Self {
        let items_per_page = items_per_page.max(1);
        Self {
            page: index / items_per_page,
            position: index % items_per_page,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotPosition {
    Index(usize),
    /// Append after the last item of the page.
    End,
}

impl From<usize> for SlotPosition {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_display_name_falls_back_to_id() {
        let item = Item::app("org.gnome.Terminal.desktop", "  ");
        assert_eq!(item.display_name, "org.gnome.Terminal.desktop");
    }

    #[test]
    fn placeholder_keeps_identity_but_leaves_folder() {
        let item = Item::app("calc", "Calculator").in_folder("utilities");
        let placeholder = item.to_placeholder();
        assert_eq!(placeholder.id, item.id);
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.folder_id, None);
    }

    #[test]
    fn slot_linear_index_round_trips() {
        let slot = Slot::from_linear_index(23, 10);
        assert_eq!(slot, Slot::new(2, 3));
        assert_eq!(slot.linear_index(10), 23);
    }
}
