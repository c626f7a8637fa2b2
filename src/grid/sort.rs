use crate::model::{Item, ItemId, Slot};
use crate::store::GridLayout;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortMode {
    /// Positions come from the user, never from sort keys.
    #[default]
    Manual,
    Alphabetical,
    Usage,
}

impl SortMode {
    pub fn is_automatic(self) -> bool {
        !matches!(self, SortMode::Manual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TieBreaks {
    pub favorites_first: bool,
    pub running_first: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortPolicy {
    pub mode: SortMode,
    pub tie_breaks: TieBreaks,
}

impl SortPolicy {
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn new(mode: SortMode) -> Self {
        Self {
            mode,
            tie_breaks: TieBreaks::default(),
        }
    }

    pub fn with_tie_breaks(mut self, tie_breaks: TieBreaks) -> Self {
        self.tie_breaks = tie_breaks;
        self
    }

    pub fn order(&self, items: Vec<Item>) -> Vec<Item> {
        order(items, self.mode, self.tie_breaks)
    }
}

/// Orders `items` for display. Every pass is a stable sort, so each later pass
/// only reorders what the earlier ones left tied.
pub fn order(mut items: Vec<Item>, mode: SortMode, tie_breaks: TieBreaks) -> Vec<Item> {
    match mode {
        SortMode::Manual => return items,
        SortMode::Alphabetical => items.sort_by(compare_names),
        SortMode::Usage => {
            items.sort_by(compare_names);
            items.sort_by(compare_usage);
        }
    }

    if tie_breaks.favorites_first {
        items.sort_by_key(|item| !item.is_favorite);
    }
    if tie_breaks.running_first {
        items.sort_by_key(|item| !item.is_running);
    }
    items
}

pub fn compare_names(a: &Item, b: &Item) -> Ordering {
    fold_name(&a.display_name)
        .cmp(&fold_name(&b.display_name))
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// More used first.
pub fn compare_usage(a: &Item, b: &Item) -> Ordering {
    b.usage_rank.cmp(&a.usage_rank)
}

fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Orders items by a persisted layout: items with a stored slot first in
/// linear order, then everything the layout does not know, alphabetically.
pub fn order_by_layout(items: Vec<Item>, layout: &GridLayout) -> Vec<Item> {
    let slots: HashMap<&ItemId, Slot> = layout.slots().collect();
    let (mut known, mut unknown): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| slots.contains_key(&item.id));
    known.sort_by_key(|item| slots.get(&item.id).copied());
    unknown.sort_by(compare_names);
    known.extend(unknown);
    known
}
