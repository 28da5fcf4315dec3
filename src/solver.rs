//! Search driver
//!
//! One call to [`Solver::solve`] builds a fresh circuit for one horizon,
//! hands its CNF to the oracle and decodes the model. The deepening variants
//! repeat that for N = 1, 2, ... and keep the first horizon that works.
//! Nothing survives between calls: every horizon gets its own arena, factory
//! and oracle.

use crate::bool::{BooleanFactory, GateArena, Options as BoolOptions};
use crate::cnf::CNFTranslator;
use crate::domain::{PieceId, Player, Setup, Square};
use crate::engine::{RustSatAdapter, SATSolver, Verdict};
use crate::error::{DobutsuError, Result};
use crate::problem::{CheckmateSolver, Formulation, Problem, ReachabilitySolver, TsumeSolver};
use crate::rules::{RuleEncoder, Rules};
use crate::solution::{Line, Solution};
use crate::state::StateVars;
use rayon::prelude::*;
use rustsat_batsat::BasicSolver;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Solver options
#[derive(Debug, Clone)]
pub struct Options {
    /// Boolean circuit options
    pub bool_options: BoolOptions,
    /// Deadline for a whole deepening run in milliseconds (None = no limit)
    ///
    /// Checked between horizons; horizons not started before the deadline
    /// are reported as inconclusive.
    pub timeout_ms: Option<u64>,
    /// Rule toggles
    pub rules: Rules,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bool_options: BoolOptions::default(),
            timeout_ms: None,
            rules: Rules::default(),
        }
    }
}

/// Capability of a per-variant solver: answer its own question
pub trait ProblemSolver {
    /// Encodes, solves and decodes the problem with the given oracle
    fn solve_with(&self, driver: &Solver, oracle: &mut dyn SATSolver) -> Result<Outcome>;
}

/// Why no solution came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// The oracle proved there is no line of this length
    Unsatisfiable {
        /// Horizon tried
        horizon: usize,
    },
    /// The oracle gave up
    Unknown {
        /// Horizon tried
        horizon: usize,
    },
    /// Every horizon up to the bound failed
    BoundExhausted {
        /// Largest horizon tried
        max_depth: usize,
    },
}

/// Result of a solve call
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A solution was found
    Found {
        /// The solution
        solution: Solution,
        /// Solving statistics
        stats: Statistics,
    },
    /// No solution
    NotFound {
        /// Why
        reason: NotFound,
        /// Solving statistics
        stats: Statistics,
    },
}

impl Outcome {
    /// Returns true if a solution was found
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found { .. })
    }

    /// The solution, if any
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Found { solution, .. } => Some(solution),
            Outcome::NotFound { .. } => None,
        }
    }

    /// Consumes the outcome, keeping the solution
    pub fn into_solution(self) -> Option<Solution> {
        match self {
            Outcome::Found { solution, .. } => Some(solution),
            Outcome::NotFound { .. } => None,
        }
    }

    /// The reason, if nothing was found
    pub fn not_found(&self) -> Option<NotFound> {
        match self {
            Outcome::Found { .. } => None,
            Outcome::NotFound { reason, .. } => Some(*reason),
        }
    }

    /// Returns the statistics
    pub fn statistics(&self) -> &Statistics {
        match self {
            Outcome::Found { stats, .. } | Outcome::NotFound { stats, .. } => stats,
        }
    }

    fn verdict(&self) -> Verdict {
        match self {
            Outcome::Found { .. } => Verdict::Sat,
            Outcome::NotFound { reason: NotFound::Unsatisfiable { .. }, .. } => Verdict::Unsat,
            Outcome::NotFound { .. } => Verdict::Unknown,
        }
    }
}

/// One horizon of a deepening run
#[derive(Debug, Clone)]
pub struct DepthReport {
    /// Horizon
    pub horizon: usize,
    /// Oracle verdict (Unknown also for horizons cut by the deadline)
    pub verdict: Verdict,
    /// Statistics of that call
    pub stats: Statistics,
}

/// Result of an iterative deepening run
#[derive(Debug, Clone)]
pub struct Deepening {
    /// The shortest solution, or `BoundExhausted`
    pub outcome: Outcome,
    /// Horizons below the answer whose verdict was Unknown
    pub inconclusive: Vec<usize>,
    /// One report per horizon tried, in increasing order
    pub reports: Vec<DepthReport>,
}

impl Deepening {
    /// The found horizon is provably the shortest
    pub fn is_minimal(&self) -> bool {
        self.outcome.is_found() && self.inconclusive.is_empty()
    }

    /// Horizon of the solution
    pub fn depth(&self) -> Option<usize> {
        self.reports.iter().find(|r| r.verdict == Verdict::Sat).map(|r| r.horizon)
    }
}

/// Statistics collected during solving
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    translation_time: Duration,
    solving_time: Duration,
    num_variables: u32,
    num_clauses: u32,
}

impl Statistics {
    /// Returns translation time in milliseconds
    pub fn translation_time(&self) -> u64 {
        self.translation_time.as_millis() as u64
    }

    /// Returns solving time in milliseconds
    pub fn solving_time(&self) -> u64 {
        self.solving_time.as_millis() as u64
    }

    /// Returns total time in milliseconds
    pub fn total_time(&self) -> u64 {
        self.translation_time() + self.solving_time()
    }

    /// Returns number of variables
    pub fn num_variables(&self) -> u32 {
        self.num_variables
    }

    /// Returns number of clauses
    pub fn num_clauses(&self) -> u32 {
        self.num_clauses
    }

    fn accumulate(&mut self, other: &Statistics) {
        self.translation_time += other.translation_time;
        self.solving_time += other.solving_time;
        self.num_variables += other.num_variables;
        self.num_clauses += other.num_clauses;
    }
}

/// Main solver (uses batsat by default)
pub struct Solver {
    options: Options,
}

impl Solver {
    /// Creates a new solver with the given options
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// The options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Solves a problem at its own horizon with batsat
    pub fn solve(&self, problem: &Problem) -> Result<Outcome> {
        let mut oracle = RustSatAdapter::new(BasicSolver::default());
        self.solve_with(problem, &mut oracle)
    }

    /// Solves a problem with a caller-supplied oracle
    pub fn solve_with(&self, problem: &Problem, oracle: &mut dyn SATSolver) -> Result<Outcome> {
        match problem {
            Problem::Checkmate { setup, winner, max_moves } => {
                CheckmateSolver { setup, winner: *winner, max_moves: *max_moves }.solve_with(self, oracle)
            }
            Problem::Reachability { setup, piece, target, max_moves } => ReachabilitySolver {
                setup,
                piece: *piece,
                target: *target,
                max_moves: *max_moves,
            }
            .solve_with(self, oracle),
            Problem::Tsume { setup, goal, max_moves } => {
                TsumeSolver { setup, goal, max_moves: *max_moves }.solve_with(self, oracle)
            }
        }
    }

    /// Finds the shortest horizon in 1..=max_depth at which the problem
    /// has a solution
    ///
    /// The problem's own horizon is ignored.
    pub fn solve_shortest(&self, problem: &Problem, max_depth: usize) -> Result<Deepening> {
        self.solve_shortest_with(problem, max_depth, || RustSatAdapter::new(BasicSolver::default()))
    }

    /// [`Solver::solve_shortest`] with a fresh caller-supplied oracle per
    /// horizon
    pub fn solve_shortest_with<S: SATSolver>(
        &self,
        problem: &Problem,
        max_depth: usize,
        mut new_oracle: impl FnMut() -> S,
    ) -> Result<Deepening> {
        if max_depth < 1 {
            return Err(DobutsuError::InvalidHorizon(max_depth));
        }
        let deadline = self.deadline();
        let mut reports = Vec::new();
        let mut inconclusive = Vec::new();

        for depth in 1..=max_depth {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(depth, "deadline passed, horizon not tried");
                inconclusive.push(depth);
                reports.push(DepthReport { horizon: depth, verdict: Verdict::Unknown, stats: Statistics::default() });
                continue;
            }

            let outcome = self.solve_with(&problem.with_horizon(depth), &mut new_oracle())?;
            let verdict = outcome.verdict();
            reports.push(DepthReport { horizon: depth, verdict, stats: outcome.statistics().clone() });
            match verdict {
                Verdict::Sat => {
                    info!(depth, inconclusive = inconclusive.len(), "shortest solution found");
                    return Ok(Deepening { outcome, inconclusive, reports });
                }
                Verdict::Unsat => debug!(depth, "no solution at this horizon"),
                Verdict::Unknown => {
                    warn!(depth, "oracle returned unknown");
                    inconclusive.push(depth);
                }
            }
        }

        Ok(exhausted(max_depth, inconclusive, reports))
    }

    /// [`Solver::solve_shortest`] with horizons solved in parallel on the
    /// rayon pool
    ///
    /// Horizons above the best one found so far are skipped.
    pub fn solve_shortest_concurrent(&self, problem: &Problem, max_depth: usize) -> Result<Deepening> {
        if max_depth < 1 {
            return Err(DobutsuError::InvalidHorizon(max_depth));
        }
        let deadline = self.deadline();
        let best = AtomicUsize::new(usize::MAX);

        let results: Vec<Result<Option<(usize, Option<Outcome>)>>> = (1..=max_depth)
            .into_par_iter()
            .map(|depth| {
                if depth > best.load(Ordering::Acquire) {
                    return Ok(None);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Ok(Some((depth, None)));
                }
                let outcome = self.solve(&problem.with_horizon(depth))?;
                if outcome.is_found() {
                    best.fetch_min(depth, Ordering::AcqRel);
                }
                Ok(Some((depth, Some(outcome))))
            })
            .collect();

        let mut tried = Vec::new();
        for result in results {
            if let Some(entry) = result? {
                tried.push(entry);
            }
        }
        tried.sort_by_key(|(depth, _)| *depth);

        let mut reports = Vec::new();
        let mut inconclusive = Vec::new();
        for (depth, outcome) in tried {
            let Some(outcome) = outcome else {
                warn!(depth, "deadline passed, horizon not tried");
                inconclusive.push(depth);
                reports.push(DepthReport { horizon: depth, verdict: Verdict::Unknown, stats: Statistics::default() });
                continue;
            };
            let verdict = outcome.verdict();
            reports.push(DepthReport { horizon: depth, verdict, stats: outcome.statistics().clone() });
            match verdict {
                Verdict::Sat => {
                    info!(depth, inconclusive = inconclusive.len(), "shortest solution found");
                    return Ok(Deepening { outcome, inconclusive, reports });
                }
                Verdict::Unsat => {}
                Verdict::Unknown => {
                    warn!(depth, "oracle returned unknown");
                    inconclusive.push(depth);
                }
            }
        }

        Ok(exhausted(max_depth, inconclusive, reports))
    }

    /// Encodes, solves and decodes one formulation
    pub(crate) fn run<F: Formulation + ?Sized>(&self, formulation: &F, oracle: &mut dyn SATSolver) -> Result<Outcome> {
        let horizon = formulation.horizon();
        let setup = formulation.setup();
        if let Some(winner) = setup.decided() {
            return Err(DobutsuError::InvalidSetup(format!("{winner} has already won at the start")));
        }

        // Step 1: rules and goal as one circuit, then CNF
        let translation_start = Instant::now();
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, self.options.bool_options.clone());
        let (vars, shape) = StateVars::declare(&factory, horizon, setup)?;
        let encoder = RuleEncoder::new(&factory, &vars, setup, self.options.rules.clone());
        let goal = formulation.goal(&encoder)?;
        let rules = encoder.constraints_with(|t| formulation.play_continues(&encoder, t));
        let root = factory.and_multi(vec![shape, rules, goal]);
        let cnf = CNFTranslator::new(factory.num_labels()).translate(root);
        let translation_time = translation_start.elapsed();
        debug!(
            horizon,
            variables = cnf.num_variables,
            clauses = cnf.num_clauses(),
            gates = factory.num_cached_gates(),
            arena_bytes = arena.allocated_bytes(),
            "translated problem"
        );

        // Step 2: oracle
        let solving_start = Instant::now();
        let verdict = if cnf.is_trivially_unsat() {
            debug!(horizon, "goal folded to false, oracle skipped");
            Verdict::Unsat
        } else {
            oracle.add_variables(cnf.num_variables);
            let rejected = cnf.clauses.iter().filter(|clause| !oracle.add_clause(clause)).count();
            if rejected > 0 {
                warn!(horizon, rejected, "backend rejected clauses");
                Verdict::Unknown
            } else {
                oracle.solve()
            }
        };
        let solving_time = solving_start.elapsed();

        let stats = Statistics {
            translation_time,
            solving_time,
            num_variables: cnf.num_variables,
            num_clauses: cnf.num_clauses() as u32,
        };
        debug!(horizon, ?verdict, solving_ms = stats.solving_time(), "oracle returned");

        // Step 3: decode
        match verdict {
            Verdict::Sat => {
                let oracle: &dyn SATSolver = oracle;
                let value_of = |label: i32| label > 0 && oracle.value_of(label as u32);
                let line = Line::decode(&vars, setup, &value_of)?;
                let solution = formulation.solution(line)?;
                Ok(Outcome::Found { solution, stats })
            }
            Verdict::Unsat => Ok(Outcome::NotFound { reason: NotFound::Unsatisfiable { horizon }, stats }),
            Verdict::Unknown => Ok(Outcome::NotFound { reason: NotFound::Unknown { horizon }, stats }),
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.options.timeout_ms.map(|ms| Instant::now() + Duration::from_millis(ms))
    }
}

fn exhausted(max_depth: usize, inconclusive: Vec<usize>, reports: Vec<DepthReport>) -> Deepening {
    info!(max_depth, inconclusive = inconclusive.len(), "no solution within bound");
    let mut stats = Statistics::default();
    for report in &reports {
        stats.accumulate(&report.stats);
    }
    Deepening {
        outcome: Outcome::NotFound { reason: NotFound::BoundExhausted { max_depth }, stats },
        inconclusive,
        reports,
    }
}

/// Checkmate for `winner` in exactly `max_moves` plies
pub fn find_checkmate(setup: &Setup, winner: Player, max_moves: usize) -> Result<Outcome> {
    Solver::new(Options::default()).solve(&Problem::checkmate(setup.clone(), winner, max_moves))
}

/// Shortest checkmate for `winner` within `max_depth` plies
pub fn find_shortest_mate(setup: &Setup, winner: Player, max_depth: usize) -> Result<Deepening> {
    let problem = Problem::checkmate(setup.clone(), winner, max_depth);
    Solver::new(Options::default()).solve_shortest(&problem, max_depth)
}

/// A line bringing `piece` to `target` within `max_moves` plies, if any
pub fn can_reach(setup: &Setup, piece: PieceId, target: Square, max_moves: usize) -> Result<Outcome> {
    let problem = Problem::reachability(setup.clone(), piece, target, max_moves);
    Solver::new(Options::default()).solve(&problem)
}

/// Shortest line bringing `piece` to `target` within `max_depth` plies
pub fn find_shortest_path(setup: &Setup, piece: PieceId, target: Square, max_depth: usize) -> Result<Deepening> {
    let problem = Problem::reachability(setup.clone(), piece, target, max_depth);
    Solver::new(Options::default()).solve_shortest(&problem, max_depth)
}
