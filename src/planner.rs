//! Host-side planner state tying the layout engine, the change tracker and the
//! drag and selection machinery to one plan.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::changes::{
    commit_all, AssignmentPort, BatchReport, CommitPolicy, ChangeId, PendingChange, PendingChanges,
    ProposeOutcome,
};
use crate::config::PlannerConfig;
use crate::drag::{DragSession, DropTarget};
use crate::error::{DragError, PlannerError, Result};
use crate::io::{self, ChainMap, ChainStore, LiftMap, PersistedChains};
use crate::layout::{
    assign_layers, bracket_bounds, bracket_position, chain_windows, compute_gaps, layers_by_resource,
    pack_unassigned, BracketBounds, BracketPosition, ChainWindow, GapInfo, LanePacking, LayerMap,
};
use crate::model::timeline::GridLine;
use crate::model::{ChainId, DayWindow, Plan, ResourceId, Task, TaskId, TimelineViewport};
use crate::selection::{self, Selection};

/// Everything the planning view needs, owned in one place.
pub struct Planner {
    plan: Plan,
    config: PlannerConfig,
    pub viewport: TimelineViewport,
    pending: PendingChanges,
    drag: DragSession,
    selection: Selection,
    chains: ChainMap,
    lifts: LiftMap,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self::with_plan(Plan::default(), config)
    }

    pub fn with_plan(plan: Plan, config: PlannerConfig) -> Self {
        let chains = ChainMap::from_tasks(&plan.tasks);
        let mut planner = Self {
            viewport: config.viewport(config.window),
            plan,
            config,
            pending: PendingChanges::new(),
            drag: DragSession::new(),
            selection: Selection::new(),
            chains,
            lifts: LiftMap::new(),
        };
        planner.recalculate_viewport();
        planner
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn pending(&self) -> &PendingChanges {
        &self.pending
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn chains(&self) -> &ChainMap {
        &self.chains
    }

    pub fn lifts(&self) -> &LiftMap {
        &self.lifts
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.plan.task(id)
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load vehicles and tasks from the authoritative source.
    pub async fn load(&mut self, port: &dyn AssignmentPort) -> Result<()> {
        let resources = port.fetch_resources().await?;
        let tasks = port.fetch_tasks().await?;
        info!(resources = resources.len(), tasks = tasks.len(), "plan loaded");
        self.plan.resources = resources;
        self.install_tasks(tasks);
        Ok(())
    }

    /// Reload the task list. The list is replaced wholesale.
    pub async fn refresh(&mut self, port: &dyn AssignmentPort) -> Result<()> {
        let tasks = port.fetch_tasks().await?;
        info!(tasks = tasks.len(), "tasks refreshed");
        self.install_tasks(tasks);
        Ok(())
    }

    fn install_tasks(&mut self, mut tasks: Vec<Task>) {
        let regrouped = self.chains.apply(&mut tasks);
        if regrouped > 0 {
            debug!(regrouped, "persisted chains re-applied");
        }
        self.chains.record(&tasks);
        self.pending.retain_live(&tasks);
        self.plan.replace_tasks(tasks);

        if let Some(task) = self.drag.dragged() {
            if self.plan.task(&task.id).is_none() {
                warn!(task = %task.id, "dragged task vanished on reload");
            }
        }
        self.recalculate_viewport();
    }

    // ── Layout ───────────────────────────────────────────────────────

    /// Configured window stretched to fit the latest task.
    pub fn effective_window(&self) -> DayWindow {
        self.config
            .window
            .extended_to_fit(&self.plan.tasks, self.config.day_end_buffer)
    }

    fn recalculate_viewport(&mut self) {
        self.viewport.window = self.effective_window();
    }

    pub fn grid_lines(&self) -> Vec<GridLine> {
        self.viewport.window.grid_lines(self.config.grid_step)
    }

    /// Resource ids in display order.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        self.plan.resource_ids()
    }

    pub fn layers(&self) -> BTreeMap<ResourceId, LayerMap> {
        layers_by_resource(&self.plan)
    }

    pub fn layers_for(&self, resource: &ResourceId) -> LayerMap {
        assign_layers(self.plan.tasks_on(resource))
    }

    pub fn row_height(&self, resource: &ResourceId) -> f32 {
        self.config
            .geometry
            .row_height(self.layers_for(resource).row_layers())
    }

    pub fn unassigned_lanes(&self) -> LanePacking {
        pack_unassigned(&self.plan.tasks)
    }

    pub fn tray_height(&self) -> f32 {
        self.unassigned_lanes().tray_height(&self.config.geometry)
    }

    pub fn chain_windows(&self) -> BTreeMap<ResourceId, Vec<ChainWindow>> {
        chain_windows(&self.plan, &self.config.timing, &self.viewport.window)
    }

    /// Vertical extent of `chain`'s bracket on `resource`.
    pub fn bracket_bounds(&self, chain: &ChainId, resource: &ResourceId) -> BracketBounds {
        let members = self.plan.chain_members(chain, resource);
        let layers = self.layers_for(resource);
        bracket_bounds(members.iter().map(|t| &t.id), &layers, &self.config.geometry)
    }

    /// Where `task` sits in its chain; `None` for unknown tasks.
    pub fn bracket_position(&self, task: &TaskId) -> Option<BracketPosition> {
        let task = self.plan.task(task)?;
        let (Some(chain), Some(resource)) = (&task.chain_id, &task.resource_id) else {
            return Some(BracketPosition::Single);
        };
        if !chain.is_groupable() {
            return Some(BracketPosition::Single);
        }
        let members = self.plan.chain_members(chain, resource);
        Some(bracket_position(&task.id, &members))
    }

    /// True when `resource`'s tasks run outside its shift.
    pub fn is_overtime(&self, resource: &ResourceId) -> bool {
        self.plan
            .resource(resource)
            .is_some_and(|r| r.is_overtime(self.plan.tasks_on(resource)))
    }

    // ── Drag ─────────────────────────────────────────────────────────

    pub fn drag_start(&mut self, task: &TaskId) -> Result<()> {
        let task = self
            .plan
            .task(task)
            .ok_or_else(|| DragError::UnknownTask(task.clone()))?;
        self.drag.start(task)?;
        Ok(())
    }

    /// Update the hover target and recompute gap feedback for it.
    ///
    /// No gaps are reported once the dragged task has left the plan.
    pub fn drag_over(&mut self, target: Option<DropTarget>) -> Result<Option<&GapInfo>> {
        let dragged = self.drag.dragged().ok_or(DragError::NoSession)?;
        let live = self.plan.task(&dragged.id).is_some();
        let gaps = match &target {
            Some(DropTarget::Resource(rid)) if live => Some(compute_gaps(
                rid,
                self.plan.tasks_on(rid),
                dragged,
                &self.viewport.window,
            )),
            _ => None,
        };
        self.drag.update(target, gaps)?;
        Ok(self.drag.gaps())
    }

    /// Drop the dragged task. A drop outside any target, or of a task that
    /// left the plan during the drag, changes nothing.
    pub fn drag_end(&mut self, target: Option<DropTarget>) -> Result<Option<ProposeOutcome>> {
        let Some((task_id, target)) = self.drag.end(target)? else {
            return Ok(None);
        };
        if self.plan.task(&task_id).is_none() {
            debug!(task = %task_id, "drop of a vanished task ignored");
            self.drag.finish();
            return Ok(None);
        }
        let outcome = self
            .pending
            .propose(&mut self.plan.tasks, &task_id, target.into_resource());
        self.drag.finish();
        let outcome = outcome?;
        if !matches!(outcome, ProposeOutcome::NoOp) {
            self.plan.touch();
        }
        Ok(Some(outcome))
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    // ── Pending changes ──────────────────────────────────────────────

    pub fn revert_change(&mut self, id: ChangeId) -> Option<PendingChange> {
        self.pending.revert(&mut self.plan.tasks, id)
    }

    pub fn cancel_changes(&mut self) -> Vec<PendingChange> {
        self.pending.cancel_all(&mut self.plan.tasks)
    }

    /// Push every pending change to `port`, then reload on full success.
    ///
    /// On failure the tracker keeps what `policy` leaves behind and the local
    /// task list is not reloaded. A reload failing after a successful commit
    /// is reported as [`PlannerError::RefreshAfterCommit`], carrying the
    /// report.
    pub async fn commit_changes(
        &mut self,
        port: &dyn AssignmentPort,
        policy: CommitPolicy,
    ) -> Result<BatchReport> {
        if self.pending.is_empty() {
            debug!("nothing to commit");
            return Ok(BatchReport {
                policy,
                outcomes: Vec::new(),
            });
        }
        let report = commit_all(&mut self.pending, port, policy).await?;
        match port.fetch_tasks().await {
            Ok(tasks) => {
                info!(tasks = tasks.len(), "tasks refreshed after commit");
                self.install_tasks(tasks);
                Ok(report)
            }
            Err(source) => {
                warn!(error = %source, "commit applied but reload failed");
                Err(PlannerError::RefreshAfterCommit { report, source })
            }
        }
    }

    // ── Selection and chains ─────────────────────────────────────────

    pub fn toggle_selection(&mut self, task: &TaskId) -> Result<bool> {
        Ok(self.selection.toggle(&self.plan.tasks, task)?)
    }

    pub fn toggle_chain_selection(&mut self, chain: &ChainId) {
        self.selection.toggle_chain(chain);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Group the selected tasks. The chain takes the vehicle's lift number
    /// unless it already has one.
    pub fn create_chain(&mut self) -> Result<ChainId> {
        let (chain, resource) = self.selection.create_chain(&mut self.plan.tasks)?;
        self.chains.record(self.plan.tasks.iter().filter(|t| t.in_chain(&chain)));

        if let Some(lift) = self.plan.resource(&resource).and_then(|r| r.lift_number()) {
            self.lifts.assign_if_absent(&chain, lift);
        }
        self.plan.touch();
        Ok(chain)
    }

    /// Break `chain`. Returns how many tasks were released.
    pub fn break_chain(&mut self, chain: &ChainId) -> usize {
        let members: Vec<TaskId> = self
            .plan
            .tasks
            .iter()
            .filter(|t| t.in_chain(chain))
            .map(|t| t.id.clone())
            .collect();
        let released = selection::break_chain(&mut self.plan.tasks, chain);
        if released > 0 {
            for id in &members {
                self.chains.release(id);
            }
            self.lifts.remove(chain);
            self.plan.touch();
        }
        if self.selection.selected_chain() == Some(chain) {
            self.selection.toggle_chain(chain);
        }
        released
    }

    /// Break the chain picked in the selection, if any.
    pub fn break_selected_chain(&mut self) -> Option<usize> {
        let chain = self.selection.selected_chain()?.clone();
        Some(self.break_chain(&chain))
    }

    pub fn lift_for(&self, chain: &ChainId) -> Option<&str> {
        self.lifts.get(chain)
    }

    pub fn set_lift(&mut self, chain: &ChainId, lift: impl Into<String>) -> Result<()> {
        if !self.plan.tasks.iter().any(|t| t.in_chain(chain)) {
            return Err(PlannerError::UnknownChain(chain.clone()));
        }
        self.lifts.set(chain.clone(), lift);
        Ok(())
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Write the current plan snapshot to `path`.
    pub fn save_plan(&mut self, path: &Path) -> Result<()> {
        self.plan.touch();
        io::save_plan(&self.plan, path)
    }

    /// Replace the plan with a snapshot from `path`. Pending changes, the
    /// drag session and the selection are discarded.
    pub fn open_plan(&mut self, path: &Path) -> Result<()> {
        let plan = io::load_plan(path)?;
        self.pending.clear();
        self.drag.cancel();
        self.selection.clear();
        self.plan.resources = plan.resources;
        self.plan.name = plan.name;
        self.plan.date = plan.date;
        self.plan.created = plan.created;
        self.install_tasks(plan.tasks);
        info!(path = %path.display(), "plan opened");
        Ok(())
    }

    /// Persist chain membership and lift numbers for the tasks in the plan.
    /// Entries for tasks no longer in the plan are pruned first.
    pub fn save_chains(&mut self, store: &dyn ChainStore) -> Result<()> {
        let pruned = self.chains.retain_tasks(&self.plan.tasks);
        let orphaned = self.lifts.retain_chains(&self.chains);
        if pruned + orphaned > 0 {
            debug!(pruned, orphaned, "stale chain entries pruned");
        }
        store.save(&PersistedChains {
            chains: self.chains.clone(),
            lifts: self.lifts.clone(),
        })
    }

    /// Load persisted chains and apply them to the current tasks.
    pub fn load_chains(&mut self, store: &dyn ChainStore) -> Result<()> {
        let data = store.load()?;
        self.chains = data.chains;
        self.lifts = data.lifts;
        let regrouped = self.chains.apply(&mut self.plan.tasks);
        self.chains.record(&self.plan.tasks);
        info!(
            chains = self.chains.len(),
            lifts = self.lifts.len(),
            regrouped,
            "chains loaded"
        );
        Ok(())
    }
}
