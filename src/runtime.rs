use crate::catalog::{AppCatalog, FolderCatalog};
use crate::config::GridConfig;
use crate::events::GridEvent;
use crate::grid::folder::DisplayArea;
use crate::grid::{AppGridView, GridView};
use crate::store::LayoutStore;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info};
use std::collections::VecDeque;

/// One unit of deferred grid work. A turn of the runtime runs exactly one.
#[derive(Debug, Clone, PartialEq)]
pub enum GridTask {
    ForgetLayout,
    ClearItems,
    Redisplay,
    NormalizePositions,
    RealizeFolders,
    SetArea(DisplayArea),
    ResizeGrid { columns: u32, rows: u32 },
    ApplyConfig(Box<GridConfig>),
}

impl GridTask {
    /// Tasks that carry new settings survive a reset.
    fn carries_settings(&self) -> bool {
        matches!(
            self,
            GridTask::SetArea(_) | GridTask::ResizeGrid { .. } | GridTask::ApplyConfig(_)
        )
    }
}

/// Queues grid work from events and runs it one task per turn, so a reset
/// spreads its steps over idle turns instead of blocking the host loop.
pub struct GridRuntime {
    rx: Receiver<GridEvent>,
    queue: VecDeque<GridTask>,
    disconnected: bool,
}

impl GridRuntime {
    pub fn new(rx: Receiver<GridEvent>) -> Self {
        Self {
            rx,
            queue: VecDeque::new(),
            disconnected: false,
        }
    }

    pub fn channel() -> (Sender<GridEvent>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }

    pub fn pending(&self) -> impl Iterator<Item = &GridTask> {
        self.queue.iter()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drains waiting events into tasks. Returns how many events arrived.
    pub fn pump(&mut self) -> usize {
        let mut received = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    received += 1;
                    self.schedule(event);
                }
                Err(err) => {
                    if !matches!(err, TryRecvError::Empty) && !self.disconnected {
                        error!("grid event receiver error: {}", err);
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        received
    }

    pub fn schedule(&mut self, event: GridEvent) {
        debug!("grid event: {event:?}");
        match event {
            event if event.is_data_change() => self.push_once(GridTask::Redisplay),
            GridEvent::LayoutReset => self.schedule_reset(),
            GridEvent::AreaChanged(area) => {
                self.queue.push_back(GridTask::SetArea(area));
                self.push_once(GridTask::RealizeFolders);
            }
            GridEvent::GridResized { columns, rows } => {
                self.queue.push_back(GridTask::ResizeGrid { columns, rows });
            }
            GridEvent::ConfigChanged(config) => {
                self.queue.push_back(GridTask::ApplyConfig(config));
            }
            _ => {}
        }
    }

    /// Queues the reset pipeline, replacing any reset or redisplay still
    /// waiting to run.
    pub fn schedule_reset(&mut self) {
        let dropped = self.cancel_pending();
        if dropped > 0 {
            debug!("reset superseded {dropped} pending tasks");
        }
        self.queue.extend([
            GridTask::ForgetLayout,
            GridTask::ClearItems,
            GridTask::Redisplay,
            GridTask::NormalizePositions,
            GridTask::Redisplay,
            GridTask::RealizeFolders,
        ]);
    }

    /// Drops queued work, keeping tasks that carry settings. Returns how many
    /// tasks were dropped.
    pub fn cancel_pending(&mut self) -> usize {
        let before = self.queue.len();
        self.queue.retain(GridTask::carries_settings);
        before - self.queue.len()
    }

    pub fn run_turn<C, S>(&mut self, view: &mut AppGridView<C, S>) -> Option<GridTask>
    where
        C: AppCatalog + FolderCatalog,
        S: LayoutStore,
    {
        let task = self.queue.pop_front()?;
        match &task {
            GridTask::ForgetLayout => view.forget_layout(),
            GridTask::ClearItems => {
                let removed = view.clear();
                debug!("cleared {removed} grid items");
            }
            GridTask::Redisplay => {
                view.redisplay();
            }
            GridTask::NormalizePositions => view.normalize_positions(),
            GridTask::RealizeFolders => view.realize_folders(),
            GridTask::SetArea(area) => view.set_area(*area),
            GridTask::ResizeGrid { columns, rows } => view.resize_grid(*columns, *rows),
            GridTask::ApplyConfig(config) => view.apply_config(config.as_ref().clone()),
        }
        Some(task)
    }

    /// Runs turns until no work is left, picking up events that arrive in
    /// between. Returns how many tasks ran.
    pub fn run_until_idle<C, S>(&mut self, view: &mut AppGridView<C, S>) -> usize
    where
        C: AppCatalog + FolderCatalog,
        S: LayoutStore,
    {
        let mut ran = 0;
        loop {
            self.pump();
            if self.run_turn(view).is_none() {
                break;
            }
            ran += 1;
        }
        if ran > 0 {
            info!("grid settled after {ran} tasks");
        }
        ran
    }

    fn push_once(&mut self, task: GridTask) {
        if !self.queue.contains(&task) {
            self.queue.push_back(task);
        }
    }
}
