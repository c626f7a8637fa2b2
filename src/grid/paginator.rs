use crate::error::GridError;
use crate::model::{Item, ItemId, Slot, SlotPosition};
use crate::store::GridLayout;
use log::debug;
use std::collections::HashSet;

/// Paged icon layout. The flattened pages are the grid's ordered items.
///
/// Invariants held after every public call: ids are unique, no page is empty,
/// no page holds more than `items_per_page` items, and with incomplete pages
/// disallowed every page but the last is full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    pages: Vec<Vec<Item>>,
    items_per_page: usize,
    allow_incomplete_pages: bool,
    current_page: usize,
}

impl GridState {
    pub fn new(items_per_page: usize, allow_incomplete_pages: bool) -> Self {
        Self {
            pages: Vec::new(),
            items_per_page: items_per_page.max(1),
            allow_incomplete_pages,
            current_page: 0,
        }
    }

    /// Builds a state from explicit pages, as restored from storage or set up
    /// by hand. Duplicates are dropped and capacity is enforced.
    pub fn from_pages(
        pages: Vec<Vec<Item>>,
        items_per_page: usize,
        allow_incomplete_pages: bool,
    ) -> Self {
        let mut seen = HashSet::new();
        let pages = pages
            .into_iter()
            .map(|page| {
                page.into_iter()
                    .filter(|item| seen.insert(item.id.clone()))
                    .collect()
            })
            .collect();
        let mut state = Self {
            pages,
            ..Self::new(items_per_page, allow_incomplete_pages)
        };
        state.settle();
        state
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn allow_incomplete_pages(&self) -> bool {
        self.allow_incomplete_pages
    }

    pub fn set_allow_incomplete_pages(&mut self, allow: bool) {
        self.allow_incomplete_pages = allow;
        self.settle();
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn n_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Vec<Item>] {
        &self.pages
    }

    pub fn page_len(&self, page: usize) -> usize {
        self.pages.get(page).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn ordered_items(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flatten()
    }

    pub fn ordered_ids(&self) -> Vec<ItemId> {
        self.ordered_items().map(|item| item.id.clone()).collect()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.locate(id).is_some()
    }

    pub fn slot_of(&self, id: &ItemId) -> Option<Slot> {
        self.locate(id)
            .map(|(page, position)| Slot::new(page, position))
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.locate(id)
            .map(|(page, position)| &self.pages[page][position])
    }

    /// Clamps to an existing page and returns the page actually shown.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.current_page = page.min(self.pages.len().saturating_sub(1));
        self.current_page
    }

    pub fn insert(
        &mut self,
        item: Item,
        page: usize,
        position: SlotPosition,
    ) -> Result<Slot, GridError> {
        if self.contains(&item.id) {
            return Err(GridError::DuplicateItem(item.id));
        }
        let id = item.id.clone();
        self.insert_unsettled(item, page, position);
        self.settle();
        self.slot_of(&id).ok_or(GridError::StaleReference(id))
    }

    pub fn remove(&mut self, id: &ItemId) -> Result<Item, GridError> {
        let (page, position) = self
            .locate(id)
            .ok_or_else(|| GridError::StaleReference(id.clone()))?;
        let item = self.pages[page].remove(position);
        self.settle();
        Ok(item)
    }

    /// Moves an item to `(page, position)`. A page past the last one opens a
    /// new trailing page; positions past the end of a page are clamped.
    /// Items at and after the target shift forward, rolling onto the next
    /// page when the target page overflows.
    pub fn move_item(
        &mut self,
        id: &ItemId,
        page: usize,
        position: SlotPosition,
    ) -> Result<Slot, GridError> {
        let (from_page, from_position) = self
            .locate(id)
            .ok_or_else(|| GridError::StaleReference(id.clone()))?;
        let item = self.pages[from_page].remove(from_position);
        self.insert_unsettled(item, page, position);
        self.settle();
        self.slot_of(id)
            .ok_or_else(|| GridError::StaleReference(id.clone()))
    }

    /// Where `move_item` would put the item, without touching this state.
    pub fn preview_move(
        &self,
        id: &ItemId,
        page: usize,
        position: SlotPosition,
    ) -> Result<Slot, GridError> {
        let mut preview = self.clone();
        preview.move_item(id, page, position)
    }

    /// Swaps the item stored under `id` for `item` without moving it.
    pub fn replace(&mut self, id: &ItemId, item: Item) -> Result<Item, GridError> {
        if item.id != *id && self.contains(&item.id) {
            return Err(GridError::DuplicateItem(item.id));
        }
        let (page, position) = self
            .locate(id)
            .ok_or_else(|| GridError::StaleReference(id.clone()))?;
        Ok(std::mem::replace(&mut self.pages[page][position], item))
    }

    /// Pulls items forward so that every page but the last is full.
    pub fn fill_vacancies(&mut self) {
        let items: Vec<Item> = self.pages.drain(..).flatten().collect();
        self.pages = paginate(items, self.items_per_page);
        self.clamp_current_page();
    }

    /// Re-flows the ordered items onto pages of the new capacity.
    pub fn resize(&mut self, items_per_page: usize) {
        self.items_per_page = items_per_page.max(1);
        self.fill_vacancies();
    }

    pub fn clear(&mut self) -> Vec<Item> {
        self.current_page = 0;
        self.pages.drain(..).flatten().collect()
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout {
            pages: self
                .pages
                .iter()
                .map(|page| page.iter().map(|item| item.id.clone()).collect())
                .collect(),
        }
    }

    fn locate(&self, id: &ItemId) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(page, items)| {
            items
                .iter()
                .position(|item| item.id == *id)
                .map(|position| (page, position))
        })
    }

    fn insert_unsettled(&mut self, item: Item, page: usize, position: SlotPosition) {
        let page = page.min(self.pages.len());
        if page == self.pages.len() {
            self.pages.push(Vec::new());
        }
        let items = &mut self.pages[page];
        let index = match position {
            SlotPosition::End => items.len(),
            SlotPosition::Index(index) => index.min(items.len()).min(self.items_per_page - 1),
        };
        items.insert(index, item);
    }

    fn settle(&mut self) {
        let mut page = 0;
        while page < self.pages.len() {
            if self.pages[page].len() > self.items_per_page {
                let overflow = self.pages[page].split_off(self.items_per_page);
                if page + 1 == self.pages.len() {
                    self.pages.push(Vec::new());
                }
                self.pages[page + 1].splice(0..0, overflow);
            }
            page += 1;
        }

        if self.allow_incomplete_pages {
            self.pages.retain(|items| !items.is_empty());
            self.clamp_current_page();
        } else {
            self.fill_vacancies();
        }
    }

    fn clamp_current_page(&mut self) {
        self.current_page = self.current_page.min(self.pages.len().saturating_sub(1));
    }
}

fn paginate(items: Vec<Item>, items_per_page: usize) -> Vec<Vec<Item>> {
    let mut pages = Vec::with_capacity(items.len().div_ceil(items_per_page));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        pages.push(items.by_ref().take(items_per_page).collect());
    }
    pages
}

pub struct GridPaginator;

impl GridPaginator {
    /// Linear placement: item `i` lands on page `i / items_per_page` at
    /// position `i % items_per_page`.
    pub fn place(items: Vec<Item>, items_per_page: usize, allow_incomplete: bool) -> GridState {
        let mut seen = HashSet::with_capacity(items.len());
        let items: Vec<Item> = items
            .into_iter()
            .filter(|item| {
                let fresh = seen.insert(item.id.clone());
                if !fresh {
                    debug!("dropping duplicate grid item {}", item.id);
                }
                fresh
            })
            .collect();
        let mut state = GridState::new(items_per_page, allow_incomplete);
        state.pages = paginate(items, state.items_per_page);
        state
    }

    pub fn assign(items: &[Item], items_per_page: usize) -> Vec<(ItemId, Slot)> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                (
                    item.id.clone(),
                    Slot::from_linear_index(index, items_per_page),
                )
            })
            .collect()
    }
}
