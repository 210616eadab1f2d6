//! The search engine: run lifecycle, the shared relaxation loop and the
//! public search variants.

use std::fmt;
use std::sync::Arc;

use cellpath_core::{Dims, MoveMask, Point, TerrainModel};

use crate::binding::TerrainBinding;
use crate::config::PatherConfig;
use crate::error::{ConfigError, RunStateError, Unsolved};
use crate::heuristic::{Heuristic, Octile, ToDisc, Zero};
use crate::open::OpenSet;
use crate::path::{Path, PriorityPath, reconstruct};
use crate::pool::{NodePool, NodeState};

/// Lifecycle of one search run.
///
/// Every public search goes `Idle → Seeded → Relaxing → Solved | NoSolution
/// → Idle` within a single call. An engine found outside `Idle` when a run
/// starts was left behind by a run that unwound midway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Seeded,
    Relaxing,
    Solved,
    NoSolution,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Seeded => "seeded",
            Self::Relaxing => "relaxing",
            Self::Solved => "solved",
            Self::NoSolution => "no-solution",
        })
    }
}

/// Counters describing the most recent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Epoch stamped on the nodes of that run (0 if it failed before seeding).
    pub epoch: u32,
    /// Nodes popped from the open set.
    pub expanded: u32,
    /// Nodes pushed onto the open set, the start included.
    pub pushed: u32,
    /// Largest open set size seen.
    pub peak_open: u32,
}

/// Decides whether a popped node ends the run.
trait GoalTest {
    fn reached(&self, pool: &NodePool, idx: usize) -> bool;
}

/// Nodes flagged with `is_goal` before the run.
struct Marked;

impl GoalTest for Marked {
    #[inline]
    fn reached(&self, pool: &NodePool, idx: usize) -> bool {
        pool.get(idx).is_goal
    }
}

/// Any cell within a Euclidean radius of a center cell.
struct WithinRadius {
    dims: Dims,
    center: Point,
    radius_sq: i64,
}

impl GoalTest for WithinRadius {
    #[inline]
    fn reached(&self, _pool: &NodePool, idx: usize) -> bool {
        self.dims.point(idx).distance_sq(self.center) <= self.radius_sq
    }
}

/// Grid shortest-path engine.
///
/// A `Pather` owns a node pool sized once at construction and an open set,
/// both reused by every search, so steady-state searches do not allocate
/// beyond the returned path. Terrain is installed with
/// [`set_terrain`](Self::set_terrain) and shared read-only through an
/// [`Arc`]; several engines (one per thread or movement class) can search
/// the same snapshot concurrently.
///
/// Cells are linear indices (`y * width + x`). Start and goal cells on the
/// grid border are moved one cell inward before a search, and the search
/// never enters border cells.
pub struct Pather {
    config: PatherConfig,
    pool: NodePool,
    open: OpenSet,
    binding: Option<TerrainBinding>,
    state: RunState,
    goals: Vec<usize>,
    stats: RunStats,
}

impl Pather {
    /// Create an engine from a validated configuration. No terrain is
    /// installed yet.
    pub fn new(config: PatherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pool: NodePool::new(config.capacity, config.epoch_limit),
            open: OpenSet::with_capacity(config.capacity),
            config,
            binding: None,
            state: RunState::Idle,
            goals: Vec::new(),
            stats: RunStats::default(),
        })
    }

    /// Shorthand for a `width × height` grid with a pool of `capacity`
    /// nodes and default limits.
    pub fn configure(width: usize, height: usize, capacity: usize) -> Result<Self, ConfigError> {
        Self::new(PatherConfig::new(width, height).with_capacity(capacity))
    }

    /// Install a terrain snapshot and the movement class searches run for.
    ///
    /// The terrain may have a different shape than the configured grid as
    /// long as it fits the node pool; offsets are re-derived from its width.
    pub fn set_terrain(
        &mut self,
        terrain: Arc<TerrainModel>,
        movement: MoveMask,
    ) -> Result<(), ConfigError> {
        self.ensure_idle()?;
        let binding = TerrainBinding::new(terrain, movement, self.pool.capacity())?;
        let dims = binding.dims();
        self.config.width = dims.width;
        self.config.height = dims.height;
        log::debug!(
            "terrain installed: {}x{}, movement {:#x}, capacity {}",
            dims.width,
            dims.height,
            movement.bits(),
            self.pool.capacity()
        );
        self.binding = Some(binding);
        Ok(())
    }

    /// Switch the movement class without reinstalling the terrain.
    pub fn set_movement(&mut self, movement: MoveMask) -> Result<(), ConfigError> {
        self.ensure_idle()?;
        let binding = self.binding.as_mut().ok_or(ConfigError::NoTerrain)?;
        binding.set_movement(movement);
        Ok(())
    }

    /// Invalidate every node immediately instead of lazily.
    ///
    /// Also returns an engine abandoned mid-run to `Idle`.
    pub fn reset(&mut self) {
        log::debug!("node pool reset at epoch {}", self.pool.epoch());
        self.pool.reset();
        self.open.clear();
        self.goals.clear();
        self.state = RunState::Idle;
    }

    pub fn config(&self) -> &PatherConfig {
        &self.config
    }

    /// Dimensions of the installed terrain (or of the configuration before
    /// any terrain is installed).
    pub fn dims(&self) -> Dims {
        match &self.binding {
            Some(b) => b.dims(),
            None => self.config.dims(),
        }
    }

    /// Number of nodes in the pool.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Epoch of the most recent run.
    pub fn epoch(&self) -> u32 {
        self.pool.epoch()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn terrain(&self) -> Option<&Arc<TerrainModel>> {
        self.binding.as_ref().map(|b| b.terrain())
    }

    pub fn movement(&self) -> Option<MoveMask> {
        self.binding.as_ref().map(|b| b.movement())
    }

    /// Counters of the most recent run.
    pub fn last_run(&self) -> RunStats {
        self.stats
    }

    // -----------------------------------------------------------------------
    // Public searches
    // -----------------------------------------------------------------------

    /// Cheapest path from `start` to `end` (A* with the octile heuristic).
    ///
    /// Fails fast with [`Unsolved::NoSolution`] when `end` cannot be entered.
    /// A start cell that cannot be entered is searched from anyway.
    ///
    /// # Panics
    ///
    /// If no terrain is installed, or if the engine was left mid-run.
    pub fn find_path(&mut self, start: usize, end: usize) -> Result<Path, Unsolved> {
        self.enter();
        let result = self.solve(start, end);
        self.finish(result)
    }

    /// Cheapest path from `start` to whichever of `goals` is cheapest to
    /// reach (Dijkstra).
    ///
    /// `cutoff == 0.0` searches without restriction; a positive `cutoff`
    /// refuses to enter any cell whose cost exceeds it.
    ///
    /// `start` equal to the first goal gives [`Unsolved::SameNode`]. Equal to
    /// any later goal, it is reached at once: the path is `[start, start]`
    /// at cost 0.
    ///
    /// # Panics
    ///
    /// If `cutoff` is negative or NaN, if no terrain is installed, or if the
    /// engine was left mid-run.
    pub fn find_path_to_any(
        &mut self,
        start: usize,
        goals: &[usize],
        cutoff: f32,
    ) -> Result<Path, Unsolved> {
        assert!(cutoff >= 0.0, "cutoff must be non-negative, got {cutoff}");
        self.enter();
        let result = self.solve_any(start, goals, cutoff);
        self.finish(result)
    }

    /// Path to the highest-priority reachable goal, `goals` being ordered
    /// from highest to lowest priority.
    ///
    /// One Dijkstra run is made, stopping at the first goal. Afterwards the
    /// first goal in priority order that the run reached is chosen, even if
    /// a lower-priority goal is cheaper.
    ///
    /// `start` equal to the first goal gives [`Unsolved::SameNode`]. Equal to
    /// a later goal, it is chosen (as `[start, start]` at cost 0) only when
    /// every higher-ranked goal is unreachable.
    ///
    /// # Panics
    ///
    /// If no terrain is installed, or if the engine was left mid-run.
    pub fn find_path_to_priority(
        &mut self,
        start: usize,
        goals: &[usize],
    ) -> Result<PriorityPath, Unsolved> {
        self.enter();
        let result = self.solve_priority(start, goals);
        self.finish(result)
    }

    /// Cheapest path from `start` to any cell within Euclidean distance
    /// `radius` of `center`. `radius == 0` yields [`Unsolved::NoSolution`].
    ///
    /// # Panics
    ///
    /// If no terrain is installed, or if the engine was left mid-run.
    pub fn find_path_to_radius(
        &mut self,
        start: usize,
        center: usize,
        radius: u32,
    ) -> Result<Path, Unsolved> {
        self.enter();
        let result = self.solve_radius(start, center, radius);
        self.finish(result)
    }

    /// Whether `end` can be reached from `start` (trivially so when equal).
    pub fn path_exists(&mut self, start: usize, end: usize) -> bool {
        matches!(self.find_path(start, end), Ok(_) | Err(Unsolved::SameNode))
    }

    /// Whether any of `goals` can be reached from `start`.
    pub fn path_exists_to_any(&mut self, start: usize, goals: &[usize]) -> bool {
        matches!(
            self.find_path_to_any(start, goals, 0.0),
            Ok(_) | Err(Unsolved::SameNode)
        )
    }

    // -----------------------------------------------------------------------
    // Run lifecycle
    // -----------------------------------------------------------------------

    /// Claim the engine for a run. Fails when it is not `Idle`.
    pub(crate) fn begin_run(&mut self) -> Result<(), RunStateError> {
        if self.state != RunState::Idle {
            return Err(RunStateError::Busy(self.state));
        }
        self.state = RunState::Seeded;
        self.stats = RunStats::default();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), ConfigError> {
        match self.state {
            RunState::Idle => Ok(()),
            state => Err(ConfigError::Busy(state)),
        }
    }

    fn enter(&mut self) {
        if self.binding.is_none() {
            panic!("{}", ConfigError::NoTerrain);
        }
        if let Err(e) = self.begin_run() {
            panic!("{e}");
        }
    }

    fn finish<T>(&mut self, result: Result<T, Unsolved>) -> Result<T, Unsolved> {
        for g in self.goals.drain(..) {
            self.pool.nodes[g].is_goal = false;
        }
        self.state = match result {
            Ok(_) => RunState::Solved,
            Err(_) => RunState::NoSolution,
        };
        log::trace!(
            "run {} {}: expanded {}, pushed {}, peak open {}",
            self.stats.epoch,
            self.state,
            self.stats.expanded,
            self.stats.pushed,
            self.stats.peak_open
        );
        self.state = RunState::Idle;
        result
    }

    /// Reject trivial requests and move both cells off the border.
    fn prepare(&self, start: usize, end: usize) -> Result<(usize, usize), Unsolved> {
        if start == end {
            return Err(Unsolved::SameNode);
        }
        let dims = self.dims();
        let start = dims.clamp_index(start);
        let end = dims.clamp_index(end);
        if start == end {
            return Err(Unsolved::SameNode);
        }
        if !self.enterable(start) {
            log::debug!(
                "start {} is blocked for movement {:#x}, searching anyway",
                dims.point(start),
                self.movement().map_or(0, |m| m.bits())
            );
        }
        Ok((start, end))
    }

    #[inline]
    fn enterable(&self, idx: usize) -> bool {
        self.binding.as_ref().is_some_and(|b| b.enterable(idx))
    }

    /// Open a new epoch and put `start` on an empty open set.
    fn seed<H: Heuristic>(&mut self, start: usize, heuristic: &H) {
        if self.pool.advance() {
            log::debug!("epoch limit {} reached, node pool reset", self.config.epoch_limit);
        }
        self.open.clear();
        let node = self.pool.touch(start);
        node.g = 0.0;
        node.f = heuristic.estimate(start);
        self.open.push(&mut self.pool.nodes, start);
        self.stats.epoch = self.pool.epoch();
        self.stats.pushed = 1;
        self.stats.peak_open = 1;
    }

    fn mark_goal(&mut self, idx: usize) {
        self.pool.nodes[idx].is_goal = true;
        self.goals.push(idx);
    }

    /// The relaxation loop shared by every variant.
    ///
    /// Pops the cheapest open node until `goal` accepts one, expanding its
    /// eight neighbours in between. Border cells, cells the movement class
    /// cannot enter and, with a `cutoff`, cells costing more than it are
    /// never entered. Returns the accepted node.
    fn relax<H: Heuristic, G: GoalTest>(
        &mut self,
        heuristic: &H,
        goal: &G,
        cutoff: Option<f32>,
    ) -> Result<usize, Unsolved> {
        self.state = RunState::Relaxing;
        let budget = self.config.expansion_budget;
        let Self {
            pool,
            open,
            binding,
            stats,
            ..
        } = self;
        let Some(binding) = binding.as_ref() else {
            return Err(Unsolved::NoSolution);
        };
        let dims = binding.dims();
        let (w, h) = (dims.width as i32, dims.height as i32);

        while let Some(ci) = open.pop_min(&mut pool.nodes) {
            stats.expanded += 1;
            if goal.reached(pool, ci) {
                return Ok(ci);
            }
            if let Some(limit) = budget {
                if stats.expanded >= limit {
                    log::warn!("search gave up after {} expansions", stats.expanded);
                    return Err(Unsolved::BudgetExhausted);
                }
            }

            let g = pool.nodes[ci].g;
            let cp = dims.point(ci);
            for step in binding.offsets().iter() {
                let (nx, ny) = (cp.x + step.dx, cp.y + step.dy);
                if nx <= 0 || ny <= 0 || nx >= w - 1 || ny >= h - 1 {
                    continue;
                }
                let ni = (ci as isize + step.delta) as usize;
                if !binding.enterable(ni) {
                    continue;
                }
                let cell_cost = binding.cost(ni);
                if let Some(limit) = cutoff {
                    if cell_cost > limit {
                        continue;
                    }
                }

                let new_g = g + cell_cost * step.weight;
                let node = pool.touch(ni);
                if new_g >= node.g {
                    continue;
                }
                node.parent = ci as u32;
                node.g = new_g;
                node.f = new_g + heuristic.estimate(ni);
                if node.state() == NodeState::Open {
                    open.decrease_key(&mut pool.nodes, ni);
                } else {
                    node.closed = false;
                    open.push(&mut pool.nodes, ni);
                    stats.pushed += 1;
                }
            }
            stats.peak_open = stats.peak_open.max(open.len() as u32);
            pool.nodes[ci].closed = true;
        }
        debug_assert!(open.is_empty());
        Err(Unsolved::NoSolution)
    }

    // -----------------------------------------------------------------------
    // Variants
    // -----------------------------------------------------------------------

    fn solve(&mut self, start: usize, end: usize) -> Result<Path, Unsolved> {
        let (start, end) = self.prepare(start, end)?;
        if !self.enterable(end) {
            log::debug!("end {} is blocked, no search", self.dims().point(end));
            return Err(Unsolved::NoSolution);
        }
        let heuristic = Octile::new(self.dims(), end);
        self.seed(start, &heuristic);
        self.mark_goal(end);
        let found = self.relax(&heuristic, &Marked, None)?;
        Ok(reconstruct(&self.pool.nodes, found, start, end))
    }

    fn solve_any(&mut self, start: usize, goals: &[usize], cutoff: f32) -> Result<Path, Unsolved> {
        let Some(&first) = goals.first() else {
            return Err(Unsolved::NoSolution);
        };
        let (start, _) = self.prepare(start, first)?;
        let dims = self.dims();
        self.seed(start, &Zero);
        for &g in goals {
            self.mark_goal(dims.clamp_index(g));
        }
        let cutoff = (cutoff > 0.0).then_some(cutoff);
        let found = self.relax(&Zero, &Marked, cutoff)?;
        Ok(reconstruct(&self.pool.nodes, found, start, found))
    }

    fn solve_priority(&mut self, start: usize, goals: &[usize]) -> Result<PriorityPath, Unsolved> {
        let Some(&first) = goals.first() else {
            return Err(Unsolved::NoSolution);
        };
        let (start, first) = self.prepare(start, first)?;
        self.seed(start, &Zero);
        self.mark_goal(first);
        match self.relax(&Zero, &Marked, None) {
            Ok(_) | Err(Unsolved::NoSolution) => {}
            Err(e) => return Err(e),
        }

        let dims = self.dims();
        for (rank, &g) in goals.iter().enumerate() {
            let g = dims.clamp_index(g);
            if self.pool.is_current(g) {
                let path = reconstruct(&self.pool.nodes, g, start, g);
                return Ok(PriorityPath { path, rank });
            }
        }
        Err(Unsolved::NoSolution)
    }

    fn solve_radius(&mut self, start: usize, center: usize, radius: u32) -> Result<Path, Unsolved> {
        if radius == 0 {
            return Err(Unsolved::NoSolution);
        }
        let (start, center) = self.prepare(start, center)?;
        let dims = self.dims();
        let heuristic = ToDisc::new(dims, center, radius);
        let goal = WithinRadius {
            dims,
            center: dims.point(center),
            radius_sq: i64::from(radius) * i64::from(radius),
        };
        self.seed(start, &heuristic);
        let found = self.relax(&heuristic, &goal, None)?;
        Ok(reconstruct(&self.pool.nodes, found, start, found))
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::SQRT_2;

    use rand::rngs::SmallRng;
    use rand::{Rng, RngExt, SeedableRng};

    use super::*;
    use crate::heuristic::DIAGONAL_WEIGHT;

    const GROUND: MoveMask = MoveMask::class(0);
    const HOVER: MoveMask = MoveMask::class(1);
    const EPS: f32 = 1e-3;

    fn open_terrain(w: usize, h: usize) -> TerrainModel {
        let mut t = TerrainModel::new(w, h);
        t.block_border();
        t
    }

    fn pather_for(t: TerrainModel) -> Pather {
        pather_with(PatherConfig::new(t.width(), t.height()), t)
    }

    fn pather_with(config: PatherConfig, t: TerrainModel) -> Pather {
        let mut pr = Pather::new(config).unwrap();
        pr.set_terrain(Arc::new(t), GROUND).unwrap();
        pr
    }

    fn at(pr: &Pather, x: i32, y: i32) -> usize {
        pr.dims().index(Point::new(x, y)).unwrap()
    }

    /// Recompute a path's cost from the terrain, step by step.
    fn walk_cost(t: &TerrainModel, path: &Path) -> f32 {
        let dims = t.dims();
        let mut total = 0.0;
        for pair in path.cells().windows(2) {
            let (a, b) = (dims.point(pair[0]), dims.point(pair[1]));
            assert!((a.x - b.x).abs() <= 1 && (a.y - b.y).abs() <= 1, "{a} -> {b} is not a step");
            let weight = if a.x != b.x && a.y != b.y { DIAGONAL_WEIGHT } else { 1.0 };
            total += t.cost(pair[1]) * weight;
        }
        total
    }

    fn random_terrain(rng: &mut impl Rng, w: usize, h: usize) -> TerrainModel {
        let mut t = TerrainModel::new(w, h);
        for p in t.dims().interior() {
            if rng.random_range(0..5) == 0 {
                t.set_mask(p, MoveMask::NONE);
            }
            t.set_cost(p, 1.0 + rng.random_range(0..4) as f32);
        }
        t.block_border();
        t
    }

    fn random_interior(rng: &mut impl Rng, dims: Dims) -> usize {
        let x = rng.random_range(1..dims.width as i32 - 1);
        let y = rng.random_range(1..dims.height as i32 - 1);
        dims.index(Point::new(x, y)).unwrap()
    }

    // -----------------------------------------------------------------------
    // Basic scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn open_grid_diagonal() {
        let mut pr = pather_for(open_terrain(10, 10));
        let path = pr.find_path(at(&pr, 1, 1), at(&pr, 8, 8)).unwrap();
        assert!((path.cost() - 7.0 * SQRT_2).abs() < EPS);
        assert_eq!(path.len(), 8);
        let expected: Vec<Point> = (1..=8).map(|i| Point::new(i, i)).collect();
        assert_eq!(path.points(pr.dims()), expected);
        assert_eq!(pr.state(), RunState::Idle);
    }

    #[test]
    fn wall_with_gap() {
        let mut t = open_terrain(10, 10);
        for y in 2..9 {
            t.set_mask(Point::new(5, y), MoveMask::NONE);
        }
        let mut pr = pather_for(t.clone());
        let path = pr.find_path(at(&pr, 1, 8), at(&pr, 8, 8)).unwrap();
        let pts = path.points(pr.dims());
        assert!(pts.contains(&Point::new(5, 1)));
        assert!(pts.iter().filter(|p| p.x == 5).all(|p| p.y == 1));
        assert!((path.cost() - (7.0 + 7.0 * SQRT_2)).abs() < EPS);
        assert!((walk_cost(&t, &path) - path.cost()).abs() < EPS);
    }

    #[test]
    fn adjacent_cells_give_two_waypoints() {
        let mut pr = pather_for(open_terrain(6, 6));
        let (a, b) = (at(&pr, 2, 2), at(&pr, 3, 3));
        let path = pr.find_path(a, b).unwrap();
        assert_eq!(path.cells(), &[a, b]);
        assert!((path.cost() - SQRT_2).abs() < EPS);
    }

    #[test]
    fn same_node_for_every_cell() {
        let mut pr = pather_for(open_terrain(6, 6));
        for i in 0..pr.dims().len() {
            assert_eq!(pr.find_path(i, i), Err(Unsolved::SameNode));
        }
        // Equal once moved off the border.
        assert_eq!(pr.find_path(at(&pr, 0, 0), at(&pr, 1, 1)), Err(Unsolved::SameNode));
        assert!(pr.path_exists(3, 3));
    }

    #[test]
    fn border_endpoints_are_moved_inward() {
        let mut pr = pather_for(open_terrain(10, 10));
        let path = pr.find_path(at(&pr, 0, 0), at(&pr, 9, 9)).unwrap();
        assert_eq!(path.start(), at(&pr, 1, 1));
        assert_eq!(path.goal(), at(&pr, 8, 8));
        let dims = pr.dims();
        assert!(path.cells().iter().all(|&c| !dims.is_border(c)));
    }

    #[test]
    fn border_is_never_entered_even_if_open() {
        // Border cells are passable here, but a detour along them must not
        // be taken.
        let mut t = TerrainModel::new(7, 5);
        for y in 1..4 {
            t.set_mask(Point::new(3, y), MoveMask::NONE);
        }
        let mut pr = pather_for(t);
        assert_eq!(pr.find_path(at(&pr, 1, 2), at(&pr, 5, 2)), Err(Unsolved::NoSolution));
    }

    #[test]
    fn enclosed_end_is_unreachable() {
        let mut t = open_terrain(10, 10);
        for p in Point::new(6, 6).neighbors_8() {
            t.set_mask(p, MoveMask::NONE);
        }
        let mut pr = pather_for(t);
        assert_eq!(pr.find_path(at(&pr, 1, 1), at(&pr, 6, 6)), Err(Unsolved::NoSolution));
        assert!(pr.last_run().expanded > 0);
        assert!(!pr.path_exists(at(&pr, 1, 1), at(&pr, 6, 6)));
    }

    #[test]
    fn blocked_end_fails_fast() {
        let mut t = open_terrain(10, 10);
        t.set_mask(Point::new(6, 6), MoveMask::NONE);
        let mut pr = pather_for(t);
        let epoch = pr.epoch();
        assert_eq!(pr.find_path(at(&pr, 1, 1), at(&pr, 6, 6)), Err(Unsolved::NoSolution));
        assert_eq!(pr.last_run().expanded, 0);
        assert_eq!(pr.epoch(), epoch);
    }

    #[test]
    fn blocked_start_still_searches() {
        let mut t = open_terrain(10, 10);
        t.set_mask(Point::new(2, 2), MoveMask::NONE);
        let mut pr = pather_for(t);
        let path = pr.find_path(at(&pr, 2, 2), at(&pr, 5, 2)).unwrap();
        assert_eq!(path.start(), at(&pr, 2, 2));
        assert!((path.cost() - 3.0).abs() < EPS);
    }

    #[test]
    fn movement_classes() {
        let mut t = open_terrain(10, 10);
        for y in 1..9 {
            t.set_mask(Point::new(5, y), HOVER);
        }
        let mut pr = pather_for(t);
        let (a, b) = (at(&pr, 1, 4), at(&pr, 8, 4));
        assert_eq!(pr.find_path(a, b), Err(Unsolved::NoSolution));
        pr.set_movement(HOVER).unwrap();
        assert_eq!(pr.movement(), Some(HOVER));
        let path = pr.find_path(a, b).unwrap();
        assert!((path.cost() - 7.0).abs() < EPS);
        pr.set_movement(GROUND | HOVER).unwrap();
        assert_eq!(pr.find_path(a, b), Err(Unsolved::NoSolution));
    }

    #[test]
    fn costs_steer_the_route() {
        let mut t = open_terrain(9, 5);
        // A cheap lane along row 3 and an expensive row 2.
        for x in 1..8 {
            t.set_cost(Point::new(x, 2), 10.0);
        }
        let mut pr = pather_for(t.clone());
        let path = pr.find_path(at(&pr, 1, 2), at(&pr, 7, 2)).unwrap();
        let pts = path.points(pr.dims());
        assert!(pts[1..pts.len() - 1].iter().all(|p| p.y != 2));
        assert!((walk_cost(&t, &path) - path.cost()).abs() < EPS);
        assert!(path.cost() < 6.0 * 10.0);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[test]
    fn repeated_searches_are_identical() {
        let mut rng = SmallRng::seed_from_u64(0x5eed_0001);
        let t = random_terrain(&mut rng, 30, 30);
        let mut pr = pather_for(t.clone());
        let mut other = pather_for(t);
        let dims = pr.dims();
        for _ in 0..20 {
            let (a, b) = (random_interior(&mut rng, dims), random_interior(&mut rng, dims));
            let first = pr.find_path(a, b);
            assert_eq!(pr.find_path(a, b), first);
            assert_eq!(other.find_path(a, b), first);
        }
    }

    #[test]
    fn astar_agrees_with_dijkstra() {
        let mut rng = SmallRng::seed_from_u64(0x5eed_0002);
        let t = random_terrain(&mut rng, 24, 24);
        let mut pr = pather_for(t.clone());
        let dims = pr.dims();
        for _ in 0..40 {
            let (a, b) = (random_interior(&mut rng, dims), random_interior(&mut rng, dims));
            let directed = pr.find_path(a, b);
            let undirected = pr.find_path_to_any(a, &[b], 0.0);
            match (directed, undirected) {
                (Ok(d), Ok(u)) => {
                    assert!((d.cost() - u.cost()).abs() < EPS, "{} vs {}", d.cost(), u.cost());
                    assert!((walk_cost(&t, &d) - d.cost()).abs() < EPS);
                    assert!((walk_cost(&t, &u) - u.cost()).abs() < EPS);
                }
                (d, u) => assert_eq!(d.err(), u.err()),
            }
        }
    }

    #[test]
    fn any_of_set_is_cheapest_member() {
        let mut rng = SmallRng::seed_from_u64(0x5eed_0003);
        let t = random_terrain(&mut rng, 20, 20);
        let mut pr = pather_for(t);
        let dims = pr.dims();
        for _ in 0..15 {
            let start = random_interior(&mut rng, dims);
            let goals: Vec<usize> = (0..4)
                .map(|_| random_interior(&mut rng, dims))
                .filter(|&g| g != start)
                .collect();
            if goals.is_empty() {
                continue;
            }
            let best = goals
                .iter()
                .filter_map(|&g| pr.find_path(start, g).ok())
                .map(|p| p.cost())
                .fold(f32::INFINITY, f32::min);
            match pr.find_path_to_any(start, &goals, 0.0) {
                Ok(p) => {
                    assert!((p.cost() - best).abs() < EPS);
                    assert!(goals.contains(&p.goal()));
                }
                Err(e) => {
                    assert_eq!(e, Unsolved::NoSolution);
                    assert!(best.is_infinite());
                }
            }
        }
    }

    #[test]
    fn cost_grows_along_path() {
        let mut rng = SmallRng::seed_from_u64(0x5eed_0004);
        let t = random_terrain(&mut rng, 16, 16);
        let mut pr = pather_for(t.clone());
        let dims = pr.dims();
        for _ in 0..10 {
            let (a, b) = (random_interior(&mut rng, dims), random_interior(&mut rng, dims));
            let Ok(path) = pr.find_path(a, b) else {
                continue;
            };
            let dims = t.dims();
            let mut prefix = 0.0;
            for pair in path.cells().windows(2) {
                let (a, b) = (dims.point(pair[0]), dims.point(pair[1]));
                let weight = if a.x != b.x && a.y != b.y { DIAGONAL_WEIGHT } else { 1.0 };
                let next = prefix + t.cost(pair[1]) * weight;
                assert!(next > prefix);
                prefix = next;
            }
            assert!((prefix - path.cost()).abs() < EPS);
        }
    }

    // -----------------------------------------------------------------------
    // Variants
    // -----------------------------------------------------------------------

    #[test]
    fn any_picks_nearest_goal() {
        let mut pr = pather_for(open_terrain(10, 10));
        let goals = [at(&pr, 8, 8), at(&pr, 3, 1), at(&pr, 1, 6)];
        let path = pr.find_path_to_any(at(&pr, 1, 1), &goals, 0.0).unwrap();
        assert_eq!(path.goal(), at(&pr, 3, 1));
        assert!((path.cost() - 2.0).abs() < EPS);
        assert!(pr.path_exists_to_any(at(&pr, 1, 1), &goals));
    }

    #[test]
    fn start_inside_goal_set() {
        let mut t = open_terrain(10, 10);
        for p in [Point::new(7, 7), Point::new(7, 8), Point::new(8, 7)] {
            t.set_mask(p, MoveMask::NONE);
        }
        let mut pr = pather_for(t);
        let (s, far, sealed) = (at(&pr, 1, 1), at(&pr, 6, 1), at(&pr, 8, 8));

        assert_eq!(pr.find_path_to_any(s, &[s, far], 0.0), Err(Unsolved::SameNode));
        let path = pr.find_path_to_any(s, &[far, s], 0.0).unwrap();
        assert_eq!(path.cells(), &[s, s]);
        assert_eq!(path.cost(), 0.0);

        assert_eq!(pr.find_path_to_priority(s, &[s, far]), Err(Unsolved::SameNode));
        let found = pr.find_path_to_priority(s, &[far, s]).unwrap();
        assert_eq!((found.rank, found.path.goal()), (0, far));
        assert!((found.path.cost() - 5.0).abs() < EPS);
        let found = pr.find_path_to_priority(s, &[sealed, s]).unwrap();
        assert_eq!(found.rank, 1);
        assert_eq!(found.path.cells(), &[s, s]);
        assert_eq!(found.path.cost(), 0.0);
    }

    #[test]
    fn any_with_empty_goals_fails_fast() {
        let mut pr = pather_for(open_terrain(6, 6));
        assert_eq!(pr.find_path_to_any(7, &[], 0.0), Err(Unsolved::NoSolution));
        assert_eq!(pr.find_path_to_priority(7, &[]), Err(Unsolved::NoSolution));
        assert!(!pr.path_exists_to_any(7, &[]));
    }

    #[test]
    fn any_goal_flags_do_not_leak_between_runs() {
        let mut pr = pather_for(open_terrain(10, 10));
        let near = at(&pr, 2, 1);
        pr.find_path_to_any(at(&pr, 1, 1), &[at(&pr, 8, 8), near], 0.0).unwrap();
        // `near` was a goal last time; now it is just a cell on the way.
        let path = pr.find_path(at(&pr, 1, 1), at(&pr, 5, 1)).unwrap();
        assert_eq!(path.goal(), at(&pr, 5, 1));
        assert!((path.cost() - 4.0).abs() < EPS);
    }

    fn toll_wall() -> TerrainModel {
        let mut t = open_terrain(10, 10);
        for y in 1..9 {
            t.set_cost(Point::new(5, y), 5.0);
        }
        t.set_cost(Point::new(5, 8), 1.0);
        t
    }

    #[test]
    fn cutoff_avoids_expensive_cells() {
        let t = toll_wall();
        let mut pr = pather_for(t.clone());
        let (a, b) = (at(&pr, 1, 1), at(&pr, 8, 1));

        let free = pr.find_path_to_any(a, &[b], 0.0).unwrap();
        assert!((free.cost() - 11.0).abs() < EPS);

        let capped = pr.find_path_to_any(a, &[b], 2.0).unwrap();
        assert!(capped.points(pr.dims()).contains(&Point::new(5, 8)));
        assert!(capped.cells().iter().all(|&c| t.cost(c) <= 2.0));
        assert!((capped.cost() - (7.0 + 7.0 * SQRT_2)).abs() < EPS);

        // Cells costing exactly the cutoff are allowed.
        let at_limit = pr.find_path_to_any(a, &[b], 5.0).unwrap();
        assert!((at_limit.cost() - 11.0).abs() < EPS);
    }

    #[test]
    fn cutoff_can_make_goal_unreachable() {
        let mut t = toll_wall();
        t.set_cost(Point::new(5, 8), 5.0);
        let mut pr = pather_for(t);
        let (a, b) = (at(&pr, 1, 1), at(&pr, 8, 1));
        assert_eq!(pr.find_path_to_any(a, &[b], 4.0), Err(Unsolved::NoSolution));
    }

    #[test]
    #[should_panic(expected = "cutoff must be non-negative")]
    fn negative_cutoff_panics() {
        let mut pr = pather_for(open_terrain(6, 6));
        let _ = pr.find_path_to_any(7, &[8], -1.0);
    }

    #[test]
    fn priority_prefers_rank_over_cost() {
        let mut pr = pather_for(open_terrain(10, 10));
        let (high, low) = (at(&pr, 8, 8), at(&pr, 2, 2));
        let found = pr.find_path_to_priority(at(&pr, 1, 1), &[high, low]).unwrap();
        assert_eq!(found.rank, 0);
        assert_eq!(found.path.goal(), high);
        assert!((found.path.cost() - 7.0 * SQRT_2).abs() < EPS);

        // The any-variant takes the cheap one instead.
        let any = pr.find_path_to_any(at(&pr, 1, 1), &[high, low], 0.0).unwrap();
        assert_eq!(any.goal(), low);
    }

    #[test]
    fn priority_falls_back_to_reachable_goal() {
        let mut t = open_terrain(10, 10);
        for p in [Point::new(7, 7), Point::new(7, 8), Point::new(8, 7)] {
            t.set_mask(p, MoveMask::NONE);
        }
        let mut pr = pather_for(t);
        let (sealed, mid, near) = (at(&pr, 8, 8), at(&pr, 6, 2), at(&pr, 2, 2));
        let found = pr.find_path_to_priority(at(&pr, 1, 1), &[sealed, mid, near]).unwrap();
        assert_eq!(found.rank, 1);
        assert_eq!(found.path.goal(), mid);
        assert!((found.path.cost() - (4.0 + SQRT_2)).abs() < EPS);

        assert_eq!(
            pr.find_path_to_priority(at(&pr, 1, 1), &[sealed]),
            Err(Unsolved::NoSolution)
        );
    }

    #[test]
    fn radius_stops_at_disc_edge() {
        let mut pr = pather_for(open_terrain(10, 10));
        let path = pr.find_path_to_radius(at(&pr, 1, 1), at(&pr, 8, 8), 3).unwrap();
        assert_eq!(path.goal(), at(&pr, 6, 6));
        assert!((path.cost() - 5.0 * SQRT_2).abs() < EPS);
        assert_eq!(
            pr.find_path_to_radius(at(&pr, 1, 1), at(&pr, 8, 8), 0),
            Err(Unsolved::NoSolution)
        );
    }

    #[test]
    fn radius_reaches_disc_around_blocked_center() {
        let mut t = open_terrain(12, 12);
        t.set_mask(Point::new(8, 5), MoveMask::NONE);
        let mut pr = pather_for(t);
        let path = pr.find_path_to_radius(at(&pr, 1, 5), at(&pr, 8, 5), 2).unwrap();
        assert_eq!(path.goal(), at(&pr, 6, 5));
        assert!((path.cost() - 5.0).abs() < EPS);
    }

    // -----------------------------------------------------------------------
    // Epochs, capacity and lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn epoch_limit_triggers_resets() {
        let config = PatherConfig::new(10, 10).with_epoch_limit(2);
        let mut pr = pather_with(config, open_terrain(10, 10));
        let mut epochs = Vec::new();
        for _ in 0..6 {
            let path = pr.find_path(at(&pr, 1, 1), at(&pr, 8, 8)).unwrap();
            assert!((path.cost() - 7.0 * SQRT_2).abs() < EPS);
            epochs.push(pr.last_run().epoch);
        }
        assert_eq!(epochs, vec![1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn explicit_reset_restarts_epochs() {
        let mut pr = pather_for(open_terrain(10, 10));
        pr.find_path(at(&pr, 1, 1), at(&pr, 8, 8)).unwrap();
        pr.find_path(at(&pr, 1, 1), at(&pr, 8, 1)).unwrap();
        assert_eq!(pr.epoch(), 2);
        pr.reset();
        assert_eq!(pr.epoch(), 0);
        let path = pr.find_path(at(&pr, 1, 8), at(&pr, 8, 8)).unwrap();
        assert_eq!(pr.epoch(), 1);
        assert!((path.cost() - 7.0).abs() < EPS);
    }

    #[test]
    fn terrain_edit_is_seen_by_next_search() {
        let t = open_terrain(10, 10);
        let mut pr = pather_for(t.clone());
        let (a, b) = (at(&pr, 1, 4), at(&pr, 8, 4));
        assert!((pr.find_path(a, b).unwrap().cost() - 7.0).abs() < EPS);

        let mut walled = t;
        for y in 1..9 {
            walled.set_mask(Point::new(4, y), MoveMask::NONE);
        }
        pr.set_terrain(Arc::new(walled), GROUND).unwrap();
        assert_eq!(pr.find_path(a, b), Err(Unsolved::NoSolution));
    }

    #[test]
    fn capacity_is_checked_up_front() {
        assert_eq!(
            Pather::configure(10, 10, 50).err(),
            Some(ConfigError::CapacityExceeded {
                cells: 100,
                capacity: 50
            })
        );
        let mut pr = Pather::configure(10, 10, 100).unwrap();
        assert_eq!(pr.capacity(), 100);
        assert_eq!(
            pr.set_terrain(Arc::new(open_terrain(11, 10)), GROUND),
            Err(ConfigError::CapacityExceeded {
                cells: 110,
                capacity: 100
            })
        );
        assert_eq!(
            pr.set_terrain(Arc::new(open_terrain(2, 40)), GROUND),
            Err(ConfigError::GridTooSmall {
                width: 2,
                height: 40
            })
        );
        assert!(pr.terrain().is_none());
    }

    #[test]
    fn smaller_terrain_reuses_pool() {
        let mut pr = Pather::configure(20, 20, 400).unwrap();
        pr.set_terrain(Arc::new(open_terrain(20, 20)), GROUND).unwrap();
        pr.find_path(21, 378).unwrap();

        pr.set_terrain(Arc::new(open_terrain(8, 12)), GROUND).unwrap();
        assert_eq!(pr.dims(), Dims::new(8, 12));
        assert_eq!(pr.capacity(), 400);
        let path = pr.find_path(at(&pr, 1, 1), at(&pr, 6, 10)).unwrap();
        assert!((path.cost() - (4.0 + 5.0 * SQRT_2)).abs() < EPS);
        assert_eq!(path.points(pr.dims()).last(), Some(&Point::new(6, 10)));
    }

    #[test]
    fn set_movement_needs_terrain() {
        let mut pr = Pather::configure(5, 5, 25).unwrap();
        assert_eq!(pr.set_movement(GROUND), Err(ConfigError::NoTerrain));
        assert_eq!(pr.movement(), None);
    }

    #[test]
    fn expansion_budget() {
        let tight = PatherConfig::new(10, 10).with_expansion_budget(3);
        let mut pr = pather_with(tight, open_terrain(10, 10));
        assert_eq!(
            pr.find_path(at(&pr, 1, 1), at(&pr, 8, 8)),
            Err(Unsolved::BudgetExhausted)
        );
        assert_eq!(pr.last_run().expanded, 3);
        assert_eq!(pr.state(), RunState::Idle);

        let roomy = PatherConfig::new(10, 10).with_expansion_budget(1000);
        let mut pr = pather_with(roomy, open_terrain(10, 10));
        assert!(pr.find_path(at(&pr, 1, 1), at(&pr, 8, 8)).is_ok());
    }

    #[test]
    fn stats_describe_last_run() {
        let mut pr = pather_for(open_terrain(10, 10));
        pr.find_path_to_any(at(&pr, 1, 1), &[at(&pr, 8, 8)], 0.0).unwrap();
        let dijkstra = pr.last_run();
        pr.find_path(at(&pr, 1, 1), at(&pr, 8, 8)).unwrap();
        let astar = pr.last_run();
        assert!(astar.expanded < dijkstra.expanded);
        assert!(astar.pushed >= astar.expanded);
        assert!(astar.peak_open >= 1);
        assert_eq!(astar.epoch, pr.epoch());
    }

    #[test]
    fn busy_engine_is_reported() {
        let mut pr = pather_for(open_terrain(6, 6));
        pr.state = RunState::Relaxing;
        assert_eq!(pr.begin_run(), Err(RunStateError::Busy(RunState::Relaxing)));
        assert_eq!(
            pr.set_terrain(Arc::new(open_terrain(6, 6)), GROUND),
            Err(ConfigError::Busy(RunState::Relaxing))
        );
        pr.reset();
        assert_eq!(pr.state(), RunState::Idle);
        assert!(pr.find_path(7, 28).is_ok());
    }

    #[test]
    #[should_panic(expected = "search run already in progress")]
    fn search_on_busy_engine_panics() {
        let mut pr = pather_for(open_terrain(6, 6));
        pr.state = RunState::Seeded;
        let _ = pr.find_path(7, 28);
    }

    #[test]
    #[should_panic(expected = "no terrain installed")]
    fn search_without_terrain_panics() {
        let mut pr = Pather::configure(6, 6, 36).unwrap();
        let _ = pr.find_path(7, 28);
    }

    #[test]
    fn engines_share_terrain_across_threads() {
        let mut rng = SmallRng::seed_from_u64(0x5eed_0005);
        let terrain = Arc::new(random_terrain(&mut rng, 32, 32));
        let mut reference = Pather::configure(32, 32, 1024).unwrap();
        reference.set_terrain(terrain.clone(), GROUND).unwrap();
        let expected = reference.find_path(33, 1022 - 33);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let terrain = terrain.clone();
                std::thread::spawn(move || {
                    let mut pr = Pather::configure(32, 32, 1024).unwrap();
                    pr.set_terrain(terrain, GROUND).unwrap();
                    pr.find_path(33, 1022 - 33)
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    }
}
