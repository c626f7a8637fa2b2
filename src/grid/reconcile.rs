use super::paginator::{GridPaginator, GridState};
use super::sort::SortPolicy;
use super::view::GridView;
use crate::model::{Item, ItemId, ItemKind, Slot, SlotPosition};
use crate::store::GridLayout;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Which of the loaded items a grid is responsible for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileScope {
    /// Folder shown by the grid, `None` for the root.
    pub view_id: Option<ItemId>,
    /// Root grid shows every app and no folder icons.
    pub flatten_folders: bool,
}

impl ReconcileScope {
    fn admits(&self, item: &Item) -> bool {
        if self.flatten_folders {
            item.kind != ItemKind::Folder
        } else {
            item.folder_id == self.view_id
        }
    }
}

/// Minimal set of operations turning a grid's current state into the state
/// the fresh item set calls for. Adds and moves carry final slots, measured
/// against the grid with the removals already done.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    pub to_remove: Vec<ItemId>,
    pub to_add: Vec<(Item, Slot)>,
    pub to_move: Vec<(ItemId, Slot)>,
    /// Items that stay put but whose data changed.
    pub to_refresh: Vec<Item>,
    pub target: GridState,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_remove.is_empty()
            && self.to_add.is_empty()
            && self.to_move.is_empty()
            && self.to_refresh.is_empty()
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ReconcileReport {
    /// Handed back so the caller can dispose of them.
    pub removed: Vec<Item>,
    pub added: Vec<ItemId>,
    pub moved: Vec<ItemId>,
    pub refreshed: usize,
    /// Operations that failed against the live grid and were left out.
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn changed_layout(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty() || !self.moved.is_empty()
    }
}

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Keeps the items `scope` admits, first occurrence of each id only.
    pub fn scope_items(fresh: Vec<Item>, scope: &ReconcileScope) -> Vec<Item> {
        let mut seen = HashSet::with_capacity(fresh.len());
        fresh
            .into_iter()
            .filter(|item| {
                if !scope.admits(item) {
                    return false;
                }
                let first = seen.insert(item.id.clone());
                if !first {
                    debug!("ignoring repeated item {}", item.id);
                }
                first
            })
            .collect()
    }

    /// Computes what has to change for `previous` to show `fresh`.
    ///
    /// Automatic modes lay the sorted items out linearly. Manual mode keeps
    /// every surviving item where the user put it and places newcomers at
    /// their persisted slot when `stored` has one, at the end otherwise.
    pub fn plan(
        previous: &GridState,
        fresh: Vec<Item>,
        policy: &SortPolicy,
        scope: &ReconcileScope,
        stored: &GridLayout,
    ) -> ReconcilePlan {
        let fresh = Self::scope_items(fresh, scope);
        let fresh_ids: HashSet<&ItemId> = fresh.iter().map(|item| &item.id).collect();

        let to_remove: Vec<ItemId> = previous
            .ordered_items()
            .filter(|item| !fresh_ids.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();

        let mut baseline = previous.clone();
        for id in &to_remove {
            if let Err(err) = baseline.remove(id) {
                debug!("reconcile: {id} already gone from baseline: {err}");
            }
        }

        let to_refresh: Vec<Item> = fresh
            .iter()
            .filter(|item| baseline.item(&item.id).is_some_and(|old| old != *item))
            .cloned()
            .collect();

        let target = if policy.mode.is_automatic() {
            GridPaginator::place(
                policy.order(fresh),
                previous.items_per_page(),
                previous.allow_incomplete_pages(),
            )
        } else {
            manual_target(&baseline, fresh, stored)
        };

        let mut to_add = Vec::new();
        let mut to_move = Vec::new();
        for (page, items) in target.pages().iter().enumerate() {
            for (position, item) in items.iter().enumerate() {
                let slot = Slot::new(page, position);
                match baseline.slot_of(&item.id) {
                    None => to_add.push((item.clone(), slot)),
                    Some(current) if current != slot => to_move.push((item.id.clone(), slot)),
                    Some(_) => {}
                }
            }
        }

        ReconcilePlan {
            to_remove,
            to_add,
            to_move,
            to_refresh,
            target,
        }
    }

    /// Executes `plan` against the live grid: removals, refreshes, then adds
    /// and moves in ascending slot order. A failing step is logged and
    /// skipped; the rest of the plan still runs.
    pub fn apply<V: GridView + ?Sized>(view: &mut V, plan: ReconcilePlan) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for id in plan.to_remove {
            match view.remove_item(&id) {
                Ok(item) => report.removed.push(item),
                Err(err) => {
                    warn!("reconcile: skipping removal of {id}: {err}");
                    report.skipped += 1;
                }
            }
        }

        for item in plan.to_refresh {
            let id = item.id.clone();
            match view.state_mut().replace(&id, item) {
                Ok(_) => report.refreshed += 1,
                Err(err) => {
                    warn!("reconcile: skipping refresh of {id}: {err}");
                    report.skipped += 1;
                }
            }
        }

        let mut additions: HashMap<ItemId, Item> = plan
            .to_add
            .into_iter()
            .map(|(item, _)| (item.id.clone(), item))
            .collect();

        // Walking the target in slot order keeps every slot already visited
        // fixed, so items displaced in passing are corrected as they come up.
        for (page, items) in plan.target.pages().iter().enumerate() {
            for (position, wanted) in items.iter().enumerate() {
                let slot = Slot::new(page, position);
                let id = wanted.id.clone();
                if let Some(item) = additions.remove(&id) {
                    match view.add_item(item, page, SlotPosition::Index(position)) {
                        Ok(_) => report.added.push(id),
                        Err(err) => {
                            warn!("reconcile: skipping add of {id} at {slot}: {err}");
                            report.skipped += 1;
                        }
                    }
                } else if view.state().slot_of(&id) != Some(slot) {
                    match view.move_item(&id, page, SlotPosition::Index(position)) {
                        Ok(_) => report.moved.push(id),
                        Err(err) => {
                            warn!("reconcile: skipping move of {id} to {slot}: {err}");
                            report.skipped += 1;
                        }
                    }
                }
            }
        }

        if !view.state().allow_incomplete_pages() {
            view.state_mut().fill_vacancies();
        }
        report
    }
}

/// Manual placement: survivors keep their place, newcomers with a stored slot
/// go there in slot order, the rest are appended alphabetically.
fn manual_target(baseline: &GridState, fresh: Vec<Item>, stored: &GridLayout) -> GridState {
    let mut target = baseline.clone();
    let mut hinted = Vec::new();
    let mut unhinted = Vec::new();

    for item in fresh {
        if target.contains(&item.id) {
            let id = item.id.clone();
            if let Err(err) = target.replace(&id, item) {
                debug!("reconcile: cannot refresh {id} in place: {err}");
            }
        } else {
            match stored.slot_of(&item.id) {
                Some(slot) => hinted.push((slot, item)),
                None => unhinted.push(item),
            }
        }
    }

    hinted.sort_by_key(|(slot, _)| *slot);
    for (slot, item) in hinted {
        let id = item.id.clone();
        if let Err(err) = target.insert(item, slot.page, SlotPosition::Index(slot.position)) {
            debug!("cannot restore {id} at {slot}: {err}");
        }
    }

    unhinted.sort_by(super::sort::compare_names);
    for item in unhinted {
        let last = target.n_pages().saturating_sub(1);
        let id = item.id.clone();
        if let Err(err) = target.insert(item, last, SlotPosition::End) {
            debug!("cannot append {id}: {err}");
        }
    }
    target
}

/// Loads a grid's items, plans against its current state and applies.
pub fn redisplay<V: GridView + ?Sized>(view: &mut V) -> ReconcileReport {
    let fresh = view.load_items();
    let policy = view.sort_policy();
    let scope = ReconcileScope {
        view_id: view.view_id().cloned(),
        flatten_folders: view.flatten_folders(),
    };
    let stored = if policy.mode.is_automatic() {
        GridLayout::default()
    } else {
        view.stored_layout()
    };
    let plan = ReconciliationEngine::plan(view.state(), fresh, &policy, &scope, &stored);
    if plan.is_noop() {
        return ReconcileReport::default();
    }
    debug!(
        "reconcile: {} removed, {} added, {} moved, {} refreshed",
        plan.to_remove.len(),
        plan.to_add.len(),
        plan.to_move.len(),
        plan.to_refresh.len()
    );
    ReconciliationEngine::apply(view, plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::sort::SortMode;
    use crate::grid::view::testing::TestView;
    use pretty_assertions::assert_eq;

    fn app(id: &str) -> Item {
        Item::app(id, id)
    }

    fn apps(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| app(id)).collect()
    }

    fn ids(state: &GridState) -> Vec<String> {
        state
            .ordered_items()
            .map(|item| item.id.as_str().to_string())
            .collect()
    }

    #[test]
    fn data_change_removes_stale_and_appends_new() {
        for mode in [SortMode::Manual, SortMode::Alphabetical] {
            let policy = SortPolicy::new(mode);
            let previous = GridPaginator::place(apps(&["A", "B", "C"]), 24, false);
            let plan = ReconciliationEngine::plan(
                &previous,
                apps(&["B", "C", "D"]),
                &policy,
                &ReconcileScope::default(),
                &GridLayout::default(),
            );
            assert_eq!(plan.to_remove, vec![ItemId::from("A")]);
            assert_eq!(plan.to_add, vec![(app("D"), Slot::new(0, 2))]);
            assert!(plan.to_move.is_empty(), "{mode:?} should not move survivors");

            let mut view = TestView::new(24, false, policy).with_items(apps(&["A", "B", "C"]));
            view.source = apps(&["B", "C", "D"]);
            let report = view.redisplay();
            assert_eq!(ids(&view.state), vec!["B", "C", "D"]);
            assert_eq!(report.removed, vec![app("A")]);
            assert_eq!(report.added, vec![ItemId::from("D")]);
        }
    }

    #[test]
    fn manual_mode_keeps_user_placement() {
        let mut view =
            TestView::new(2, false, SortPolicy::manual()).with_items(apps(&["A", "B", "C"]));
        view.state
            .move_item(&"C".into(), 0, SlotPosition::Index(0))
            .expect("move C");
        view.source = apps(&["A", "B", "C", "Z", "E"]);

        view.redisplay();
        assert_eq!(ids(&view.state), vec!["C", "A", "B", "E", "Z"]);
    }

    #[test]
    fn automatic_mode_reorders_to_sorted_layout() {
        let mut view = TestView::new(2, true, SortPolicy::new(SortMode::Alphabetical))
            .with_items(apps(&["D", "B", "A", "C"]));
        view.source.push(app("AA"));

        let report = view.redisplay();
        assert_eq!(ids(&view.state), vec!["A", "AA", "B", "C", "D"]);
        assert_eq!(
            view.state.pages().iter().map(Vec::len).collect::<Vec<_>>(),
            vec![2, 2, 1]
        );
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn applying_plan_reproduces_target() {
        let previous = GridPaginator::place(apps(&["E", "A", "D", "B", "C", "F", "G"]), 3, true);
        let plan = ReconciliationEngine::plan(
            &previous,
            apps(&["G", "B", "H", "C", "A", "E"]),
            &SortPolicy::new(SortMode::Alphabetical),
            &ReconcileScope::default(),
            &GridLayout::default(),
        );
        let target = plan.target.clone();

        let mut view = TestView::new(3, true, SortPolicy::new(SortMode::Alphabetical));
        view.state = previous;
        ReconciliationEngine::apply(&mut view, plan);
        assert_eq!(view.state.pages(), target.pages());
    }

    #[test]
    fn stored_layout_restores_manual_positions() {
        let mut view = TestView::new(3, false, SortPolicy::manual());
        view.source = apps(&["A", "B", "C", "D"]);
        view.layout = GridLayout {
            pages: vec![vec!["C".into(), "A".into(), "D".into()], vec!["B".into()]],
        };

        view.redisplay();
        assert_eq!(view.state.layout(), view.layout);
    }

    #[test]
    fn folder_members_stay_out_of_root() {
        let mut view = TestView::new(6, false, SortPolicy::manual());
        view.source = vec![app("A"), app("B").in_folder("tools"), Item::folder("tools", "Tools")];
        view.redisplay();
        assert_eq!(ids(&view.state), vec!["A", "tools"]);

        let mut folder = TestView::new(6, false, SortPolicy::manual());
        folder.id = Some("tools".into());
        folder.source = view.source.clone();
        folder.redisplay();
        assert_eq!(ids(&folder.state), vec!["B"]);
    }

    #[test]
    fn flattened_root_drops_folder_icons() {
        let scope = ReconcileScope {
            view_id: None,
            flatten_folders: true,
        };
        let fresh = vec![app("A"), app("B").in_folder("tools"), Item::folder("tools", "Tools")];
        let kept = ReconciliationEngine::scope_items(fresh, &scope);
        assert_eq!(
            kept.iter().map(|item| item.id.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[test]
    fn failing_step_is_skipped_and_rest_applies() {
        let mut view = TestView::new(4, false, SortPolicy::manual()).with_items(apps(&["A"]));
        view.source = apps(&["A", "B", "C"]);
        view.fail_on = Some("B".into());

        let report = view.redisplay();
        assert_eq!(report.skipped, 1);
        assert_eq!(ids(&view.state), vec!["A", "C"]);
    }

    #[test]
    fn changed_item_data_is_refreshed_in_place() {
        let mut view =
            TestView::new(4, false, SortPolicy::manual()).with_items(apps(&["A", "B"]));
        view.source[1] = app("B").with_running(true);

        let report = view.redisplay();
        assert_eq!(report.refreshed, 1);
        assert!(!report.changed_layout());
        assert_eq!(view.state.slot_of(&"B".into()), Some(Slot::new(0, 1)));
        assert!(view.state.item(&"B".into()).is_some_and(|item| item.is_running));
    }

    #[test]
    fn unchanged_data_is_a_noop() {
        let mut view =
            TestView::new(4, false, SortPolicy::manual()).with_items(apps(&["A", "B"]));
        assert_eq!(view.redisplay(), ReconcileReport::default());
    }
}
