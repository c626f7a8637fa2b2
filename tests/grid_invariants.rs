//! Property checks for paging, reconciliation and folder sizing.
//!
//! Random operation streams run against `GridState` and the reconciliation
//! engine; after every step the paging invariants must hold.

use app_grid::config::FolderConfig;
use app_grid::grid::folder::{DisplayArea, FolderSizeRequest, FolderSizeSolver};
use app_grid::grid::reconcile::{ReconcileScope, ReconciliationEngine};
use app_grid::grid::sort::{SortMode, SortPolicy};
use app_grid::grid::{GridPaginator, GridState, GridView};
use app_grid::{GridLayout, Item, SlotPosition};
use proptest::prelude::*;
use std::collections::HashSet;

const POOL: usize = 30;

fn app(index: usize) -> Item {
    Item::app(format!("app{index:02}"), format!("App {:02}", (index * 7) % POOL))
}

fn pick(mask: &[bool]) -> Vec<Item> {
    mask.iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(index, _)| app(index))
        .collect()
}

fn assert_paging(state: &GridState) {
    let mut seen = HashSet::new();
    for item in state.ordered_items() {
        assert!(seen.insert(item.id.clone()), "duplicate {}", item.id);
    }
    let pages = state.pages();
    for (index, page) in pages.iter().enumerate() {
        assert!(!page.is_empty(), "page {index} is empty");
        assert!(page.len() <= state.items_per_page(), "page {index} overflows");
        if !state.allow_incomplete_pages() && index + 1 < pages.len() {
            assert_eq!(page.len(), state.items_per_page(), "page {index} has a gap");
        }
    }
    assert!(state.is_empty() || state.current_page() < state.n_pages());
}

struct Plain {
    policy: SortPolicy,
    state: GridState,
    source: Vec<Item>,
}

impl GridView for Plain {
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
        self.source.clone()
    }
}

#[derive(Debug, Clone)]
enum Op {
    Insert { item: usize, page: usize, position: Option<usize> },
    Remove { item: usize },
    Move { item: usize, page: usize, position: Option<usize> },
    Page { page: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..POOL, 0usize..6, proptest::option::of(0usize..12))
            .prop_map(|(item, page, position)| Op::Insert { item, page, position }),
        (0..POOL).prop_map(|item| Op::Remove { item }),
        (0..POOL, 0usize..6, proptest::option::of(0usize..12))
            .prop_map(|(item, page, position)| Op::Move { item, page, position }),
        (0usize..8).prop_map(|page| Op::Page { page }),
    ]
}

fn position(position: Option<usize>) -> SlotPosition {
    position.map_or(SlotPosition::End, SlotPosition::Index)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_operations_keep_pages_valid(
        items_per_page in 1usize..8,
        allow_incomplete in any::<bool>(),
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut state = GridState::new(items_per_page, allow_incomplete);
        for op in ops {
            let before = state.clone();
            let result = match op {
                Op::Insert { item, page, position: at } => {
                    state.insert(app(item), page, position(at)).map(|_| ())
                }
                Op::Remove { item } => state.remove(&app(item).id).map(|_| ()),
                Op::Move { item, page, position: at } => {
                    let id = app(item).id;
                    let preview = state.preview_move(&id, page, position(at));
                    let moved = state.move_item(&id, page, position(at));
                    prop_assert_eq!(preview.ok(), moved.as_ref().ok().copied());
                    moved.map(|_| ())
                }
                Op::Page { page } => {
                    state.go_to_page(page);
                    Ok(())
                }
            };
            if result.is_err() {
                prop_assert_eq!(&state, &before);
            }
            assert_paging(&state);
        }
    }

    #[test]
    fn linear_placement_matches_assigned_slots(
        mask in prop::collection::vec(any::<bool>(), POOL),
        items_per_page in 1usize..10,
    ) {
        let items = pick(&mask);
        let state = GridPaginator::place(items.clone(), items_per_page, false);
        assert_paging(&state);
        for (id, slot) in GridPaginator::assign(&items, items_per_page) {
            prop_assert_eq!(state.slot_of(&id), Some(slot));
        }
    }

    #[test]
    fn reconciliation_reaches_planned_target(
        before in prop::collection::vec(any::<bool>(), POOL),
        after in prop::collection::vec(any::<bool>(), POOL),
        items_per_page in 1usize..7,
        allow_incomplete in any::<bool>(),
        automatic in any::<bool>(),
    ) {
        let policy = if automatic {
            SortPolicy::new(SortMode::Alphabetical)
        } else {
            SortPolicy::manual()
        };
        let previous = GridPaginator::place(pick(&before), items_per_page, allow_incomplete);
        let fresh = pick(&after);
        let plan = ReconciliationEngine::plan(
            &previous,
            fresh.clone(),
            &policy,
            &ReconcileScope::default(),
            &GridLayout::default(),
        );
        let target = plan.target.clone();

        let mut view = Plain { policy, state: previous, source: fresh.clone() };
        let report = ReconciliationEngine::apply(&mut view, plan);
        prop_assert_eq!(report.skipped, 0);
        prop_assert_eq!(view.state.pages(), target.pages());
        assert_paging(&view.state);

        let expected: HashSet<_> = fresh.iter().map(|item| item.id.clone()).collect();
        let shown: HashSet<_> = view.state.ordered_ids().into_iter().collect();
        prop_assert_eq!(shown, expected);

        let again = view.redisplay();
        prop_assert!(!again.changed_layout());
    }

    #[test]
    fn folder_solver_is_stable_and_fits(
        item_count in 0usize..80,
        width in 200.0f32..4000.0,
        height in 200.0f32..3000.0,
        scale in prop::sample::select(vec![1.0f32, 1.25, 1.5, 2.0]),
    ) {
        let area = DisplayArea::new(width, height, scale);
        let request = FolderSizeRequest::new(item_count, &FolderConfig::default(), area);
        let layout = FolderSizeSolver::solve(&request);

        prop_assert_eq!(layout, FolderSizeSolver::solve(&request));
        prop_assert!(layout.columns >= 1 && layout.rows >= 1);
        prop_assert!(layout.pixel_width <= width / scale + 0.01);
        prop_assert!(layout.pixel_height <= height / scale + 0.01);
        prop_assert_eq!(layout.design_capacity, item_count);
    }
}
