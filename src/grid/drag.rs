use super::view::GridView;
use crate::config::{DragConfig, Orientation};
use crate::error::GridError;
use crate::model::{Item, ItemId, ItemKind, Slot, SlotPosition};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Drop targets that are not a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    PrevPageIndicator,
    NextPageIndicator,
    Grid,
}

/// Pointer position relative to the page area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMotion {
    pub x: f32,
    pub y: f32,
    pub target: Option<DragTarget>,
}

impl DragMotion {
    pub fn over_grid(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            target: Some(DragTarget::Grid),
        }
    }

    pub fn over(target: DragTarget, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            target: Some(target),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOrigin {
    Grid,
    Folder(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSource {
    pub item: Item,
    pub origin: DragOrigin,
}

impl DragSource {
    pub fn from_grid(item: Item) -> Self {
        Self {
            item,
            origin: DragOrigin::Grid,
        }
    }

    pub fn from_folder(item: Item, folder: ItemId) -> Self {
        Self {
            item,
            origin: DragOrigin::Folder(folder),
        }
    }
}

/// Size and shape of one page of the receiving grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGeometry {
    pub width: f32,
    pub height: f32,
    pub columns: usize,
    pub rows: usize,
    pub orientation: Orientation,
}

impl DragGeometry {
    /// Cell under the pointer as a position on the current page.
    pub fn cell_at(&self, x: f32, y: f32) -> usize {
        let columns = self.columns.max(1);
        let rows = self.rows.max(1);
        let column = axis_cell(x, self.width, columns);
        let row = axis_cell(y, self.height, rows);
        row * columns + column
    }

    fn edge_direction(&self, x: f32, y: f32, zone: f32) -> Option<PageDirection> {
        if zone <= 0.0 {
            return None;
        }
        let (coord, extent) = match self.orientation {
            Orientation::Horizontal => (x, self.width),
            Orientation::Vertical => (y, self.height),
        };
        if coord <= zone {
            Some(PageDirection::Previous)
        } else if coord >= extent - zone {
            Some(PageDirection::Next)
        } else {
            None
        }
    }
}

fn axis_cell(coord: f32, extent: f32, cells: usize) -> usize {
    if !coord.is_finite() || extent <= 0.0 || coord <= 0.0 {
        return 0;
    }
    let cell = ((coord / extent) * cells as f32).floor() as usize;
    cell.min(cells - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
    Resolving,
    Committing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageDirection {
    Previous,
    Next,
}

/// What a drag event changed, for the caller to render or persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEffect {
    PageSwitched { from: usize, to: usize },
    /// Slot the item would land in if dropped now.
    PendingMove(Option<Slot>),
    Committed { id: ItemId, slot: Slot },
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Copy)]
struct HoverTimer {
    direction: PageDirection,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct DragSession {
    source: DragSource,
    placeholder: Option<Item>,
    pending_move: Option<Slot>,
    /// Page and cell the pending move was previewed with; a drop replays it.
    pending_target: Option<(usize, usize)>,
    hover: Option<HoverTimer>,
    last_bump: Option<Instant>,
    pointer: Option<(f32, f32)>,
    start_page: usize,
    geometry: DragGeometry,
    phase: DragPhase,
}

impl DragSession {
    pub fn source(&self) -> &DragSource {
        &self.source
    }

    pub fn placeholder(&self) -> Option<&Item> {
        self.placeholder.as_ref()
    }

    pub fn pending_move(&self) -> Option<Slot> {
        self.pending_move
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    fn dragged_id(&self) -> &ItemId {
        &self.source.item.id
    }
}

/// Whether `destination` takes `item` when dropped. Automatic grids never
/// accept, a folder does not take itself, and folders only live in the root.
pub fn can_accept<V: GridView + ?Sized>(item: &Item, destination: &V) -> bool {
    if destination.sort_policy().mode.is_automatic() {
        return false;
    }
    if destination.view_id() == Some(&item.id) {
        return false;
    }
    match item.kind {
        ItemKind::App | ItemKind::Placeholder => true,
        ItemKind::Folder => destination.view_id().is_none(),
    }
}

/// `can_accept` as a result, for callers that propagate errors.
pub fn check_drop<V: GridView + ?Sized>(item: &Item, destination: &V) -> Result<(), GridError> {
    if can_accept(item, destination) {
        Ok(())
    } else {
        Err(GridError::InvalidDrop(item.id.clone()))
    }
}

/// Drives one drag at a time across a grid's pages. Every call takes the
/// current time so timers stay deterministic under test.
pub struct DragReorderController {
    config: DragConfig,
    session: Option<DragSession>,
}

impl DragReorderController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.session.as_ref().map_or(DragPhase::Idle, DragSession::phase)
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn begin<V: GridView + ?Sized>(
        &mut self,
        view: &mut V,
        source: DragSource,
        geometry: DragGeometry,
        _now: Instant,
    ) -> Vec<DragEffect> {
        let mut effects = Vec::new();
        if self.session.is_some() {
            warn!("drag started while another was active, cancelling the old one");
            effects.extend(self.cancel(view));
        }

        let id = source.item.id.clone();
        let mut placeholder = None;
        if !view.state().contains(&id) {
            let mut stand_in = source.item.to_placeholder();
            stand_in.folder_id = view.view_id().cloned();
            view.set_placeholder(Some(stand_in.clone()));
            let last = view.state().n_pages().saturating_sub(1);
            match view.add_item(stand_in.clone(), last, SlotPosition::End) {
                Ok(slot) => {
                    debug!("placeholder for {id} at {slot}");
                    placeholder = Some(stand_in);
                }
                Err(err) => {
                    warn!("cannot place drag placeholder for {id}: {err}");
                    view.set_placeholder(None);
                }
            }
        }

        info!("drag started: {id}");
        self.session = Some(DragSession {
            source,
            placeholder,
            pending_move: None,
            pending_target: None,
            hover: None,
            last_bump: None,
            pointer: None,
            start_page: view.state().current_page(),
            geometry,
            phase: DragPhase::Dragging,
        });
        effects
    }

    /// Pointer moved. An edge bump wins over the page indicator hover for the
    /// same event; the hover timer only runs while nothing was bumped.
    pub fn motion<V: GridView + ?Sized>(
        &mut self,
        view: &mut V,
        motion: DragMotion,
        now: Instant,
    ) -> Vec<DragEffect> {
        let config = &self.config;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != DragPhase::Dragging {
            return Vec::new();
        }

        let mut effects = Vec::new();
        let mut switched = false;
        let cooldown = Duration::from_millis(config.edge_bump_cooldown_ms);

        if let Some(direction) = session
            .geometry
            .edge_direction(motion.x, motion.y, config.edge_zone_px)
        {
            let cooled = session
                .last_bump
                .map_or(true, |at| now.saturating_duration_since(at) >= cooldown);
            if cooled {
                if let Some(effect) = switch_page(view, direction) {
                    session.last_bump = Some(now);
                    session.hover = None;
                    effects.push(effect);
                    switched = true;
                }
            }
        }

        if !switched {
            let direction = match motion.target {
                Some(DragTarget::PrevPageIndicator) => Some(PageDirection::Previous),
                Some(DragTarget::NextPageIndicator) => Some(PageDirection::Next),
                _ => None,
            };
            match direction {
                Some(direction) => {
                    let delay = Duration::from_millis(config.hover_switch_delay_ms);
                    match session.hover {
                        Some(timer) if timer.direction == direction => {
                            if now >= timer.deadline {
                                switched |= fire_hover(view, session, &mut effects, now, delay);
                            }
                        }
                        _ => {
                            session.hover = Some(HoverTimer {
                                direction,
                                deadline: now + delay,
                            });
                        }
                    }
                }
                None => session.hover = None,
            }
        }

        let over_grid = matches!(motion.target, Some(DragTarget::Grid));
        if over_grid {
            session.pointer = Some((motion.x, motion.y));
        }
        if over_grid || switched {
            effects.extend(update_pending(view, session));
        }
        effects
    }

    /// Advances the hover timer without pointer movement.
    pub fn tick<V: GridView + ?Sized>(&mut self, view: &mut V, now: Instant) -> Vec<DragEffect> {
        let delay = Duration::from_millis(self.config.hover_switch_delay_ms);
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != DragPhase::Dragging {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if session.hover.is_some_and(|timer| now >= timer.deadline)
            && fire_hover(view, session, &mut effects, now, delay)
        {
            effects.extend(update_pending(view, session));
        }
        effects
    }

    /// Resolves the drop. Dropping on a page indicator targets the end of the
    /// neighbouring page, or the first slot of a new trailing page; anything
    /// else commits the pending move, if there is one.
    pub fn drop<V: GridView + ?Sized>(
        &mut self,
        view: &mut V,
        target: Option<DragTarget>,
        _now: Instant,
    ) -> Vec<DragEffect> {
        let Some(mut session) = self.session.take() else {
            return Vec::new();
        };
        session.phase = DragPhase::Resolving;
        let id = session.dragged_id().clone();

        if let Err(err) = check_drop(&session.source.item, view) {
            info!("{err}");
            restore(view, &session);
            return vec![DragEffect::Rejected];
        }

        let indicator_page = match target {
            Some(DragTarget::PrevPageIndicator) => {
                Some(view.state().current_page().saturating_sub(1))
            }
            Some(DragTarget::NextPageIndicator) => {
                Some((view.state().current_page() + 1).min(view.state().n_pages()))
            }
            _ => None,
        };
        let destination = match indicator_page {
            Some(page) if page < view.state().n_pages() => Some((page, SlotPosition::End)),
            Some(page) => Some((page, SlotPosition::Index(0))),
            None => session
                .pending_target
                .map(|(page, cell)| (page, SlotPosition::Index(cell))),
        };

        if !view.state().contains(&id) {
            warn!("drop of {id} aborted: item left the grid during the drag");
            restore(view, &session);
            return vec![DragEffect::Cancelled];
        }

        session.phase = DragPhase::Committing;
        let mut effects = Vec::new();
        if let Some((page, position)) = destination {
            if let Err(err) = view.move_item(&id, page, position) {
                warn!("drop of {id} failed: {err}");
                restore(view, &session);
                return vec![DragEffect::Cancelled];
            }
        }
        if let Some(page) = indicator_page {
            let from = view.state().current_page();
            let to = view.state_mut().go_to_page(page);
            if from != to {
                effects.push(DragEffect::PageSwitched { from, to });
            }
        }

        if session.placeholder.is_some() {
            let mut item = session.source.item.clone();
            item.folder_id = view.view_id().cloned();
            if item.kind == ItemKind::Placeholder {
                item.kind = ItemKind::App;
            }
            view.set_placeholder(None);
            if let Err(err) = view.state_mut().replace(&id, item) {
                warn!("cannot promote placeholder for {id}: {err}");
            }
        }

        let slot = view.state().slot_of(&id);
        view.finish_drop(&session.source);
        view.save_layout();
        if let Some(slot) = slot {
            info!("drop of {id} committed at {slot}");
            effects.push(DragEffect::Committed { id, slot });
        }
        effects
    }

    /// Abandons the drag, removing any placeholder and returning to the page
    /// the drag started on.
    pub fn cancel<V: GridView + ?Sized>(&mut self, view: &mut V) -> Vec<DragEffect> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        info!("drag of {} cancelled", session.dragged_id());
        restore(view, &session);
        vec![DragEffect::Cancelled]
    }
}

fn switch_page<V: GridView + ?Sized>(view: &mut V, direction: PageDirection) -> Option<DragEffect> {
    let state = view.state_mut();
    let from = state.current_page();
    let to = match direction {
        PageDirection::Previous => from.checked_sub(1)?,
        PageDirection::Next => Some(from + 1).filter(|next| *next < state.n_pages())?,
    };
    state.go_to_page(to);
    Some(DragEffect::PageSwitched { from, to })
}

/// Switches page for an expired hover timer and re-arms it.
fn fire_hover<V: GridView + ?Sized>(
    view: &mut V,
    session: &mut DragSession,
    effects: &mut Vec<DragEffect>,
    now: Instant,
    delay: Duration,
) -> bool {
    let Some(timer) = session.hover.as_mut() else {
        return false;
    };
    timer.deadline = now + delay;
    match switch_page(view, timer.direction) {
        Some(effect) => {
            effects.push(effect);
            true
        }
        None => false,
    }
}

fn update_pending<V: GridView + ?Sized>(view: &V, session: &mut DragSession) -> Option<DragEffect> {
    let (x, y) = session.pointer?;
    let state = view.state();
    let position = session.geometry.cell_at(x, y);
    let page = state.current_page();
    let pending = match state.preview_move(session.dragged_id(), page, SlotPosition::Index(position)) {
        Ok(slot) => Some(slot),
        Err(err) => {
            debug!("no pending move: {err}");
            None
        }
    };
    session.pending_target = pending.map(|_| (page, position));
    if pending == session.pending_move {
        return None;
    }
    session.pending_move = pending;
    Some(DragEffect::PendingMove(pending))
}

fn restore<V: GridView + ?Sized>(view: &mut V, session: &DragSession) {
    if let Some(placeholder) = &session.placeholder {
        view.set_placeholder(None);
        let still_placeholder = view
            .state()
            .item(&placeholder.id)
            .is_some_and(Item::is_placeholder);
        if still_placeholder {
            if let Err(err) = view.remove_item(&placeholder.id) {
                debug!("placeholder already gone: {err}");
            }
        }
    }
    view.state_mut().go_to_page(session.start_page);
}
