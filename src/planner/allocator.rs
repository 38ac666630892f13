//! Greedy term allocator with single-step backtracking.
//!
//! # Algorithm
//!
//! 1. Apply locks in request order. Invalid locks are rejected, not fatal.
//! 2. Level the remaining courses by prerequisites; optionally re-sort each
//!    level with a [`CoursePriority`].
//! 3. For each course in that order, scan the horizon for the first term
//!    where (a) every prerequisite is approved or placed strictly earlier,
//!    (b) the term's hours stay within the cap, and (c) some schedule
//!    option is free. Commit there.
//! 4. When a course exhausts the horizon, lift one earlier placement, place
//!    the course, then move the lifted course to a different slot that keeps
//!    its own prerequisites and its placed dependents valid. Undo both when
//!    that fails. Each (course, blocker) pair is tried once, and a moved
//!    course never returns to a slot it was moved off.
//! 5. Retry every non-structural unplaced course once against the final
//!    board, in the same order, and record the final reasons.
//! 6. If a lock ends with a prerequisite that is neither approved nor placed
//!    earlier, reject that lock and plan again. Pending prerequisites of a
//!    lock are only searched in terms before it.
//!
//! # Complexity
//! Greedy pass: O(n · T · k · a) for n courses, T terms, k options and a
//! assignments per term. Backtracking adds at most n² lift attempts, each
//! costing two greedy placements.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::assembler;
use super::events::{EventLog, NoopObserver, PlanEvent, PlanObserver};
use super::PlanRequest;
use crate::conflict;
use crate::graph::{build_levels, DependencyGraph};
use crate::models::{
    Assignment, Catalog, Course, CourseId, Horizon, Lock, LockRejection, Plan, RejectedLock,
    TermId, TermSchedule, TimeOfDay, UnplacedReason,
};
use crate::priority::{CoursePriority, PriorityContext};

/// Places courses into horizon terms.
///
/// # Example
///
/// ```
/// use u_curriculum::models::{Catalog, Course, Horizon, Preferences, ScheduleOption, TermId};
/// use u_curriculum::planner::{PlanRequest, TermAllocator};
///
/// let monday = ScheduleOption::parse(&["Lunes"], "14:00-18:00").unwrap();
/// let catalog = Catalog::new(vec![
///     Course::new(1, "Algebra").with_hours(64).with_option(monday.clone()),
///     Course::new(2, "Calculus").with_hours(64).with_option(monday).with_correlative(1),
/// ])
/// .unwrap();
///
/// let request = PlanRequest::new(catalog, Horizon::years(2, 2), Preferences::default());
/// let plan = TermAllocator::new().plan(&request);
///
/// assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
/// assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
/// assert!(plan.is_complete());
/// ```
#[derive(Debug, Clone)]
pub struct TermAllocator {
    priority: Option<CoursePriority>,
    suggested_term_first: bool,
    backtracking: bool,
}

impl TermAllocator {
    /// Creates an allocator: catalog order, horizon scan, backtracking on.
    pub fn new() -> Self {
        Self {
            priority: None,
            suggested_term_first: false,
            backtracking: true,
        }
    }

    /// Sets a priority engine for ordering courses within a level.
    pub fn with_priority(mut self, priority: CoursePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Tries each course's suggested term before scanning the horizon.
    pub fn with_suggested_term_first(mut self, enabled: bool) -> Self {
        self.suggested_term_first = enabled;
        self
    }

    /// Enables or disables backtracking.
    pub fn with_backtracking(mut self, enabled: bool) -> Self {
        self.backtracking = enabled;
        self
    }

    /// Plans a request without reporting events.
    pub fn plan(&self, request: &PlanRequest) -> Plan {
        self.plan_with_observer(request, &mut NoopObserver)
    }

    /// Plans a request, reporting every decision to `observer`.
    ///
    /// A lock whose prerequisite ends up neither approved nor placed in an
    /// earlier term is rejected with [`LockRejection::PrerequisiteOrder`] and
    /// the request is planned again without it. Events are delivered once
    /// the final run is known, and only for that run.
    pub fn plan_with_observer(&self, request: &PlanRequest, observer: &mut dyn PlanObserver) -> Plan {
        let mut withheld: BTreeMap<usize, LockRejection> = BTreeMap::new();
        loop {
            let mut log = EventLog::new();
            let run = self.run(request, &withheld, &mut log);
            if let Some((index, with)) = run.board.broken_lock() {
                tracing::debug!(
                    lock = index,
                    prerequisite = with,
                    "lock prerequisite unplaced, replanning"
                );
                withheld.insert(index, LockRejection::PrerequisiteOrder { with });
                continue;
            }
            for event in &log.events {
                observer.on_event(event);
            }
            return assembler::assemble(
                &request.catalog,
                run.board.terms,
                &run.reasons,
                &request.approved,
                run.rejected_locks,
            );
        }
    }

    fn run<'a>(
        &self,
        request: &'a PlanRequest,
        withheld: &BTreeMap<usize, LockRejection>,
        observer: &mut dyn PlanObserver,
    ) -> Run<'a> {
        let catalog = &request.catalog;
        let mut board = Board::new(request, self.suggested_term_first);
        let rejected_locks = board.apply_locks(&request.locks, withheld, observer);

        let resolved: HashSet<CourseId> = request
            .approved
            .iter()
            .copied()
            .chain(board.term_of.keys().copied())
            .collect();
        let graph = DependencyGraph::build(catalog.courses(), &resolved);
        let leveling = build_levels(&graph);

        let mut reasons: HashMap<CourseId, UnplacedReason> = HashMap::new();
        for (id, reason) in &leveling.excluded {
            observer.on_event(&PlanEvent::Excluded {
                course: *id,
                reason: reason.clone(),
            });
            reasons.insert(*id, reason.clone());
        }

        let order = self.attempt_order(&leveling.levels, &graph, catalog, observer);

        for &id in &order {
            let Some(course) = catalog.get(id) else {
                continue;
            };
            if board.is_placed(id) {
                continue;
            }
            let limit = board.dependents_limit(id);
            match board.find_slot(course, limit, &|_, _| false, observer) {
                Ok(slot) => board.commit(course, slot, observer),
                Err(UnplacedReason::HorizonExhausted) if self.backtracking => {
                    board.backtrack(course, observer);
                }
                Err(_) => {}
            }
        }

        // Final sweep: placements above may have unlocked later courses.
        // Scans here are quiet; the main pass reported the per-term rejections.
        for &id in &order {
            let Some(course) = catalog.get(id) else {
                continue;
            };
            if board.is_placed(id) {
                continue;
            }
            let limit = board.dependents_limit(id);
            match board.find_slot(course, limit, &|_, _| false, &mut NoopObserver) {
                Ok(slot) => board.commit(course, slot, observer),
                Err(reason) => {
                    observer.on_event(&PlanEvent::Unplaceable {
                        course: id,
                        reason: reason.clone(),
                    });
                    reasons.insert(id, reason);
                }
            }
        }

        tracing::debug!(
            placed = board.term_of.len(),
            unplaced = reasons.len(),
            rejected_locks = rejected_locks.len(),
            "plan finished"
        );

        Run {
            board,
            reasons,
            rejected_locks,
        }
    }

    fn attempt_order(
        &self,
        levels: &[Vec<CourseId>],
        graph: &DependencyGraph,
        catalog: &Catalog,
        observer: &mut dyn PlanObserver,
    ) -> Vec<CourseId> {
        let context = self.priority.as_ref().map(|_| PriorityContext {
            catalog_position: catalog
                .iter()
                .enumerate()
                .map(|(i, c)| (c.id, i))
                .collect(),
            dependents: graph.dependent_counts(),
        });

        let mut order = Vec::with_capacity(graph.len());
        for (idx, level) in levels.iter().enumerate() {
            let ids = match (&self.priority, &context) {
                (Some(priority), Some(context)) => {
                    let courses: Vec<&Course> =
                        level.iter().filter_map(|&id| catalog.get(id)).collect();
                    priority
                        .sort_indices(&courses, context)
                        .into_iter()
                        .map(|i| courses[i].id)
                        .collect()
                }
                _ => level.clone(),
            };
            observer.on_event(&PlanEvent::LevelBuilt {
                level: idx,
                courses: ids.clone(),
            });
            order.extend(ids);
        }
        order
    }
}

impl Default for TermAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one allocation run, before assembly.
struct Run<'a> {
    board: Board<'a>,
    reasons: HashMap<CourseId, UnplacedReason>,
    rejected_locks: Vec<RejectedLock>,
}

/// A (term index, option index) placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    term: usize,
    option: usize,
}

/// A non-locked placement, in commit order.
#[derive(Debug, Clone, Copy)]
struct Commit {
    course: CourseId,
    slot: Slot,
}

/// Everything needed to put a lifted course back exactly where it was.
#[derive(Debug)]
struct Lifted {
    slot: Slot,
    stack_pos: usize,
    term_pos: usize,
    assignment: Assignment,
}

/// Working state of one run.
struct Board<'a> {
    catalog: &'a Catalog,
    horizon: &'a Horizon,
    approved: &'a BTreeSet<CourseId>,
    cap: u32,
    preference: TimeOfDay,
    suggested_term_first: bool,
    terms: Vec<TermSchedule>,
    /// Term index of every placed course, locked or not.
    term_of: HashMap<CourseId, usize>,
    commits: Vec<Commit>,
    /// Applied locks as (request index, course).
    locked: Vec<(usize, CourseId)>,
    /// Catalog courses listing each ID as a prerequisite.
    dependents: HashMap<CourseId, Vec<CourseId>>,
    tried: HashSet<(CourseId, CourseId)>,
    abandoned: HashSet<(CourseId, usize, usize)>,
}

impl<'a> Board<'a> {
    fn new(request: &'a PlanRequest, suggested_term_first: bool) -> Self {
        let mut dependents: HashMap<CourseId, Vec<CourseId>> = HashMap::new();
        for course in &request.catalog {
            for &pre in &course.correlatives {
                dependents.entry(pre).or_default().push(course.id);
            }
        }
        let preferences = request.preferences.resolved();
        Self {
            catalog: &request.catalog,
            horizon: &request.horizon,
            approved: &request.approved,
            cap: preferences.max_hours_per_term,
            preference: preferences.preferred_time_of_day,
            suggested_term_first,
            terms: request
                .horizon
                .terms()
                .iter()
                .map(|&t| TermSchedule::new(t))
                .collect(),
            term_of: HashMap::new(),
            commits: Vec::new(),
            locked: Vec::new(),
            dependents,
            tried: HashSet::new(),
            abandoned: HashSet::new(),
        }
    }

    fn is_placed(&self, id: CourseId) -> bool {
        self.term_of.contains_key(&id)
    }

    fn apply_locks(
        &mut self,
        locks: &[Lock],
        withheld: &BTreeMap<usize, LockRejection>,
        observer: &mut dyn PlanObserver,
    ) -> Vec<RejectedLock> {
        let mut rejected = Vec::new();
        for (index, lock) in locks.iter().enumerate() {
            let checked = match withheld.get(&index) {
                Some(reason) => Err(reason.clone()),
                None => self.check_lock(lock),
            };
            match checked {
                Ok((term, hours)) => {
                    self.terms[term].push(Assignment::new(
                        lock.course_id,
                        lock.term,
                        lock.option.clone(),
                        hours,
                    ));
                    self.term_of.insert(lock.course_id, term);
                    self.locked.push((index, lock.course_id));
                    tracing::trace!(course = lock.course_id, term = %lock.term, "lock applied");
                }
                Err(reason) => {
                    observer.on_event(&PlanEvent::LockRejected {
                        course: lock.course_id,
                        term: lock.term,
                        reason: reason.clone(),
                    });
                    rejected.push(RejectedLock {
                        lock: lock.clone(),
                        reason,
                    });
                }
            }
        }
        rejected
    }

    /// Returns the term index and course hours of an acceptable lock.
    fn check_lock(&self, lock: &Lock) -> Result<(usize, u32), LockRejection> {
        let course = self
            .catalog
            .get(lock.course_id)
            .ok_or(LockRejection::UnknownCourse)?;
        let term = self
            .horizon
            .position(lock.term)
            .ok_or(LockRejection::TermOutsideHorizon)?;
        if self.approved.contains(&lock.course_id) {
            return Err(LockRejection::AlreadyApproved);
        }
        if self.is_placed(lock.course_id) {
            return Err(LockRejection::DuplicateLock);
        }
        let schedule = &self.terms[term];
        if schedule.total_hours.saturating_add(course.hours) > self.cap {
            return Err(LockRejection::ExceedsHourCap);
        }
        if let Some(other) = conflict::first_conflict(&lock.option, &schedule.assignments) {
            return Err(LockRejection::ScheduleConflict {
                with: other.course_id,
            });
        }
        if let Some(with) = self.order_conflict(course, term) {
            return Err(LockRejection::PrerequisiteOrder { with });
        }
        Ok((term, course.hours))
    }

    /// A course that makes placing `course` at term index `term` break
    /// prerequisite order against what is already on the board.
    fn order_conflict(&self, course: &Course, term: usize) -> Option<CourseId> {
        for &pre in &course.correlatives {
            if self.approved.contains(&pre) {
                continue;
            }
            let unreachable = match self.term_of.get(&pre) {
                Some(&t) => t >= term,
                None => term == 0 || self.catalog.get(pre).is_none(),
            };
            if unreachable {
                return Some(pre);
            }
        }
        self.dependents
            .get(&course.id)
            .into_iter()
            .flatten()
            .copied()
            .find(|d| self.term_of.get(d).is_some_and(|&t| t <= term))
    }

    /// First applied lock with a prerequisite that is neither approved nor
    /// placed in an earlier term, as (request index, prerequisite).
    fn broken_lock(&self) -> Option<(usize, CourseId)> {
        self.locked.iter().find_map(|&(index, id)| {
            let term = *self.term_of.get(&id)?;
            let course = self.catalog.get(id)?;
            course
                .correlatives
                .iter()
                .find(|pre| {
                    !self.approved.contains(pre)
                        && !matches!(self.term_of.get(pre), Some(&t) if t < term)
                })
                .map(|&pre| (index, pre))
        })
    }

    /// First term index at which every prerequisite is satisfied.
    fn earliest_term(&self, course: &Course) -> Result<usize, UnplacedReason> {
        let mut earliest = 0;
        let mut missing = Vec::new();
        for pre in &course.correlatives {
            if self.approved.contains(pre) {
                continue;
            }
            match self.term_of.get(pre) {
                Some(&t) => earliest = earliest.max(t + 1),
                None => missing.push(*pre),
            }
        }
        if missing.is_empty() {
            Ok(earliest)
        } else {
            Err(UnplacedReason::PrerequisiteUnplaced { missing })
        }
    }

    /// Term indices in `earliest..limit`, suggested term first when enabled.
    fn candidate_terms(&self, course: &Course, earliest: usize, limit: usize) -> Vec<usize> {
        let mut terms: Vec<usize> = (earliest..limit).collect();
        if self.suggested_term_first {
            let suggested = course
                .suggested_term()
                .and_then(|(year, half)| self.horizon.position(TermId::new(year, half)));
            if let Some(pos) = suggested.and_then(|s| terms.iter().position(|&t| t == s)) {
                let term = terms.remove(pos);
                terms.insert(0, term);
            }
        }
        terms
    }

    /// Finds a slot for a course among terms before `limit`, skipping
    /// (term, option) pairs rejected by `skip`.
    fn find_slot(
        &self,
        course: &Course,
        limit: usize,
        skip: &dyn Fn(usize, usize) -> bool,
        observer: &mut dyn PlanObserver,
    ) -> Result<Slot, UnplacedReason> {
        if course.hours > self.cap {
            return Err(UnplacedReason::ExceedsHourCap {
                hours: course.hours,
                cap: self.cap,
            });
        }
        if course.schedule_options.is_empty() {
            return Err(UnplacedReason::NoScheduleOptions);
        }
        let earliest = self.earliest_term(course)?;

        for t in self.candidate_terms(course, earliest, limit) {
            let schedule = &self.terms[t];
            let hours = schedule.total_hours + course.hours;
            if hours > self.cap {
                observer.on_event(&PlanEvent::OverCapacity {
                    course: course.id,
                    term: schedule.term,
                    hours,
                    cap: self.cap,
                });
                continue;
            }
            match conflict::select_option_where(
                &course.schedule_options,
                &schedule.assignments,
                self.preference,
                |o| !skip(t, o),
            ) {
                Some(option) => return Ok(Slot { term: t, option }),
                None => observer.on_event(&PlanEvent::Conflict {
                    course: course.id,
                    term: schedule.term,
                }),
            }
        }
        Err(UnplacedReason::HorizonExhausted)
    }

    fn place(&mut self, course: &Course, slot: Slot) {
        let schedule = &mut self.terms[slot.term];
        let term = schedule.term;
        schedule.push(Assignment::new(
            course.id,
            term,
            course.schedule_options[slot.option].clone(),
            course.hours,
        ));
        self.term_of.insert(course.id, slot.term);
        self.commits.push(Commit {
            course: course.id,
            slot,
        });
    }

    fn commit(&mut self, course: &Course, slot: Slot, observer: &mut dyn PlanObserver) {
        self.place(course, slot);
        self.emit_placed(course.id, slot, observer);
    }

    fn emit_placed(&self, course: CourseId, slot: Slot, observer: &mut dyn PlanObserver) {
        observer.on_event(&PlanEvent::Placed {
            course,
            term: self.terms[slot.term].term,
            option: slot.option,
        });
    }

    /// Removes a non-locked placement.
    fn lift(&mut self, id: CourseId) -> Option<Lifted> {
        let stack_pos = self.commits.iter().position(|c| c.course == id)?;
        let slot = self.commits[stack_pos].slot;
        let term_pos = self.terms[slot.term]
            .assignments
            .iter()
            .position(|a| a.course_id == id)?;

        self.commits.remove(stack_pos);
        let schedule = &mut self.terms[slot.term];
        let assignment = schedule.assignments.remove(term_pos);
        schedule.total_hours -= assignment.hours;
        self.term_of.remove(&id);
        Some(Lifted {
            slot,
            stack_pos,
            term_pos,
            assignment,
        })
    }

    fn restore(&mut self, lifted: Lifted) {
        let course = lifted.assignment.course_id;
        let schedule = &mut self.terms[lifted.slot.term];
        schedule.total_hours += lifted.assignment.hours;
        schedule.assignments.insert(lifted.term_pos, lifted.assignment);
        self.term_of.insert(course, lifted.slot.term);
        self.commits.insert(
            lifted.stack_pos,
            Commit {
                course,
                slot: lifted.slot,
            },
        );
    }

    /// Exclusive upper term bound for placing `id`.
    ///
    /// Each placed course downstream of `id` leaves one term per
    /// intermediate unplaced course between them.
    fn dependents_limit(&self, id: CourseId) -> usize {
        self.deadline(id, &mut HashMap::new())
            .unwrap_or(self.terms.len())
    }

    fn deadline(&self, id: CourseId, memo: &mut HashMap<CourseId, Option<usize>>) -> Option<usize> {
        if let Some(&known) = memo.get(&id) {
            return known;
        }
        // Entered before recursing so a cycle reads as unconstrained.
        memo.insert(id, None);
        let mut bound: Option<usize> = None;
        for &dependent in self.dependents.get(&id).into_iter().flatten() {
            let limit = match self.term_of.get(&dependent) {
                Some(&t) => Some(t),
                None => self
                    .deadline(dependent, memo)
                    .map(|t| t.saturating_sub(1)),
            };
            bound = match (bound, limit) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
        memo.insert(id, bound);
        bound
    }

    /// Tries to make room for `failing` by moving one placed course.
    fn backtrack(&mut self, failing: &Course, observer: &mut dyn PlanObserver) -> bool {
        let catalog = self.catalog;
        let mut quiet = NoopObserver;
        let blockers: Vec<CourseId> = self.commits.iter().rev().map(|c| c.course).collect();

        for blocker_id in blockers {
            if !self.tried.insert((failing.id, blocker_id)) {
                continue;
            }
            if failing.correlatives.contains(&blocker_id) {
                continue;
            }
            let Some(blocker) = catalog.get(blocker_id) else {
                continue;
            };
            let Some(lifted) = self.lift(blocker_id) else {
                continue;
            };

            let limit = self.dependents_limit(failing.id);
            let Ok(slot) = self.find_slot(failing, limit, &|_, _| false, &mut quiet) else {
                self.restore(lifted);
                observer.on_event(&PlanEvent::BacktrackFailed {
                    course: failing.id,
                    displaced: blocker_id,
                });
                continue;
            };
            self.place(failing, slot);

            let old = lifted.slot;
            let limit = self.dependents_limit(blocker_id);
            let abandoned = &self.abandoned;
            let skip = |t: usize, o: usize| {
                (t == old.term && o == old.option) || abandoned.contains(&(blocker_id, t, o))
            };
            let moved = self.find_slot(blocker, limit, &skip, &mut quiet);

            match moved {
                Ok(to) => {
                    self.place(blocker, to);
                    self.abandoned.insert((blocker_id, old.term, old.option));
                    observer.on_event(&PlanEvent::Backtrack {
                        course: failing.id,
                        displaced: blocker_id,
                        from: self.terms[old.term].term,
                        to: self.terms[to.term].term,
                    });
                    self.emit_placed(failing.id, slot, observer);
                    self.emit_placed(blocker_id, to, observer);
                    return true;
                }
                Err(_) => {
                    let undone = self.lift(failing.id);
                    debug_assert!(undone.is_some(), "failing course was placed just above");
                    self.restore(lifted);
                    observer.on_event(&PlanEvent::BacktrackFailed {
                        course: failing.id,
                        displaced: blocker_id,
                    });
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Preferences, ScheduleOption};
    use crate::planner::EventLog;
    use crate::priority::rules;
    use crate::validation::verify_plan;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn opt(days: &[&str], time: &str) -> ScheduleOption {
        ScheduleOption::parse(days, time).unwrap()
    }

    fn monday() -> ScheduleOption {
        opt(&["Lunes"], "14:00-18:00")
    }

    fn course(id: CourseId, hours: u32, options: &[ScheduleOption], pre: &[CourseId]) -> Course {
        options.iter().fold(
            Course::new(id, format!("Course {id}"))
                .with_hours(hours)
                .with_correlatives(pre.iter().copied()),
            |c, o| c.with_option(o.clone()),
        )
    }

    fn request(courses: Vec<Course>, horizon: Horizon, cap: u32) -> PlanRequest {
        PlanRequest::new(Catalog::new(courses).unwrap(), horizon, Preferences::new(cap))
    }

    fn assert_valid(plan: &Plan, request: &PlanRequest) {
        let violations = verify_plan(plan, &request.catalog, &request.preferences);
        assert!(violations.is_empty(), "violations: {violations:?}");
    }

    #[test]
    fn test_same_slot_courses_split_across_terms() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[monday()], &[]),
            ],
            Horizon::default(),
            256,
        );
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_course_over_cap_is_never_placed() {
        let req = request(vec![course(1, 128, &[monday()], &[])], Horizon::default(), 100);
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(
            plan.unplaced_course(1).map(|u| &u.reason),
            Some(&UnplacedReason::ExceedsHourCap {
                hours: 128,
                cap: 100
            })
        );
        assert_eq!(plan.assignment_count(), 0);
    }

    #[test]
    fn test_night_preference_picks_evening_slot() {
        let catalog = Catalog::new(vec![course(
            1,
            64,
            &[opt(&["Lunes"], "14:00-18:00"), opt(&["Lunes"], "18:30-22:30")],
            &[],
        )])
        .unwrap();
        let prefs = Preferences::new(256).with_preferred_time(TimeOfDay::Night);
        let req = PlanRequest::new(catalog, Horizon::default(), prefs);
        let plan = TermAllocator::new().plan(&req);

        let assignment = plan.assignment_for(1).unwrap();
        assert_eq!(assignment.option.time.to_string(), "18:30-22:30");
    }

    #[test]
    fn test_prerequisite_chain_advances_terms() {
        let req = request(
            vec![
                course(3, 64, &[monday()], &[2]),
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[opt(&["Martes"], "08:00-12:00")], &[1]),
            ],
            Horizon::years(3, 2),
            256,
        );
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
        assert_eq!(plan.term_of(3), Some(TermId::new(2, 1)));
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_hour_cap_defers_third_course() {
        let req = request(
            vec![
                course(1, 64, &[opt(&["Lunes"], "08:00-12:00")], &[]),
                course(2, 64, &[opt(&["Martes"], "08:00-12:00")], &[]),
                course(3, 64, &[opt(&["Miércoles"], "08:00-12:00")], &[]),
            ],
            Horizon::years(2, 2),
            128,
        );
        let mut log = EventLog::new();
        let plan = TermAllocator::new().plan_with_observer(&req, &mut log);

        assert_eq!(plan.term(TermId::new(1, 1)).unwrap().total_hours, 128);
        assert_eq!(plan.term_of(3), Some(TermId::new(1, 2)));
        assert!(log.events.iter().any(|e| matches!(
            e,
            PlanEvent::OverCapacity {
                course: 3,
                hours: 192,
                cap: 128,
                ..
            }
        )));
    }

    #[test]
    fn test_cycle_members_unplaced() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[2]),
                course(2, 64, &[monday()], &[1]),
                course(3, 64, &[monday()], &[]),
            ],
            Horizon::default(),
            256,
        );
        let plan = TermAllocator::new().plan(&req);

        let cycle = UnplacedReason::Cycle {
            members: vec![1, 2],
        };
        assert_eq!(plan.unplaced_course(1).map(|u| &u.reason), Some(&cycle));
        assert_eq!(plan.unplaced_course(2).map(|u| &u.reason), Some(&cycle));
        assert!(plan.is_placed(3));
    }

    #[test]
    fn test_dangling_correlative_unplaced() {
        let req = request(
            vec![course(1, 64, &[monday()], &[404]), course(2, 64, &[monday()], &[1])],
            Horizon::default(),
            256,
        );
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(
            plan.unplaced_course(1).map(|u| &u.reason),
            Some(&UnplacedReason::DanglingPrerequisite { missing: vec![404] })
        );
        assert_eq!(
            plan.unplaced_course(2).map(|u| &u.reason),
            Some(&UnplacedReason::PrerequisiteUnplaced { missing: vec![1] })
        );
        assert_eq!(plan.assignment_count(), 0);
    }

    #[test]
    fn test_dependent_of_oversized_course_is_blocked() {
        let req = request(
            vec![course(1, 128, &[monday()], &[]), course(2, 32, &[monday()], &[1])],
            Horizon::default(),
            100,
        );
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(
            plan.unplaced_course(2).map(|u| &u.reason),
            Some(&UnplacedReason::PrerequisiteUnplaced { missing: vec![1] })
        );
    }

    #[test]
    fn test_course_without_options() {
        let req = request(vec![course(1, 64, &[], &[])], Horizon::default(), 256);
        let plan = TermAllocator::new().plan(&req);
        assert_eq!(
            plan.unplaced_course(1).map(|u| &u.reason),
            Some(&UnplacedReason::NoScheduleOptions)
        );
    }

    #[test]
    fn test_approved_courses_satisfy_prerequisites() {
        let req = request(
            vec![course(1, 64, &[monday()], &[]), course(2, 64, &[monday()], &[1, 77])],
            Horizon::default(),
            256,
        )
        .with_approved([1, 77]);
        let plan = TermAllocator::new().plan(&req);

        assert!(!plan.is_placed(1));
        assert!(!plan.is_unplaced(1));
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 1)));
        assert_eq!(plan.approved, vec![1, 77]);
        assert!(plan.is_complete());
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_backtracking_moves_blocker_to_alternative_slot() {
        let tuesday = opt(&["Martes"], "14:00-18:00");
        let req = request(
            vec![
                course(1, 64, &[monday(), tuesday.clone()], &[]),
                course(2, 64, &[monday()], &[]),
            ],
            Horizon::years(1, 1),
            256,
        );

        let mut log = EventLog::new();
        let plan = TermAllocator::new().plan_with_observer(&req, &mut log);
        assert!(plan.is_complete());
        assert_eq!(plan.assignment_for(1).unwrap().option, tuesday);
        assert_eq!(plan.assignment_for(2).unwrap().option, monday());
        assert_eq!(log.backtracks(), 1);
        assert_valid(&plan, &req);

        let greedy = TermAllocator::new().with_backtracking(false).plan(&req);
        assert_eq!(
            greedy.unplaced_course(2).map(|u| &u.reason),
            Some(&UnplacedReason::HorizonExhausted)
        );
    }

    fn blocked_by_dependent(with_dependent: bool) -> PlanRequest {
        let thursday = opt(&["Jueves"], "14:00-18:00");
        let friday = opt(&["Viernes"], "08:00-12:00");
        let mut courses = vec![
            course(1, 64, &[monday(), thursday.clone()], &[]),
            course(2, 64, &[monday()], &[]),
            course(3, 64, &[thursday.clone()], &[]),
            course(4, 64, &[monday()], &[]),
        ];
        let mut locks = vec![
            Lock::new(3, TermId::new(1, 1), thursday),
            Lock::new(4, TermId::new(1, 2), monday()),
        ];
        if with_dependent {
            courses.push(course(5, 64, &[friday.clone()], &[1]));
            locks.push(Lock::new(5, TermId::new(1, 2), friday));
        }
        request(courses, Horizon::years(1, 2), 256).with_locks(locks)
    }

    #[test]
    fn test_backtracking_moves_blocker_to_later_term() {
        let req = blocked_by_dependent(false);
        let plan = TermAllocator::new().plan(&req);

        assert!(plan.is_complete());
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 2)));
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_backtracking_respects_placed_dependents() {
        // Course 5 sits in 1C2 and needs course 1, so course 1 cannot leave 1C1.
        let req = blocked_by_dependent(true);
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(
            plan.unplaced_course(2).map(|u| &u.reason),
            Some(&UnplacedReason::HorizonExhausted)
        );
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_failed_backtrack_restores_board() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[monday()], &[]),
            ],
            Horizon::years(1, 1),
            256,
        );
        let mut log = EventLog::new();
        let plan = TermAllocator::new().plan_with_observer(&req, &mut log);

        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(
            plan.unplaced_course(2).map(|u| &u.reason),
            Some(&UnplacedReason::HorizonExhausted)
        );
        assert_eq!(log.backtracks(), 0);
        assert!(log.events.iter().any(|e| matches!(
            e,
            PlanEvent::BacktrackFailed {
                course: 2,
                displaced: 1
            }
        )));
    }

    #[test]
    fn test_unplaced_course_rejections_reported_once() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[monday()], &[]),
                course(3, 256, &[opt(&["Martes"], "08:00-12:00")], &[]),
            ],
            Horizon::years(1, 1),
            256,
        );
        let mut log = EventLog::new();
        let plan = TermAllocator::new().plan_with_observer(&req, &mut log);

        assert!(plan.is_unplaced(2));
        assert!(plan.is_unplaced(3));
        let conflicts = log
            .events
            .iter()
            .filter(|e| matches!(e, PlanEvent::Conflict { course: 2, .. }))
            .count();
        let over = log
            .events
            .iter()
            .filter(|e| matches!(e, PlanEvent::OverCapacity { course: 3, .. }))
            .count();
        assert_eq!(conflicts, 1);
        assert_eq!(over, 1);
        assert!(log.events.iter().any(|e| matches!(
            e,
            PlanEvent::Unplaceable {
                course: 2,
                reason: UnplacedReason::HorizonExhausted
            }
        )));
    }

    #[test]
    fn test_priority_reorders_within_level() {
        let courses = vec![
            course(1, 32, &[monday()], &[]),
            course(2, 128, &[monday()], &[]),
        ];
        let req = request(courses, Horizon::default(), 256);

        let plain = TermAllocator::new().plan(&req);
        assert_eq!(plain.term_of(1), Some(TermId::new(1, 1)));

        let heavy_first = TermAllocator::new()
            .with_priority(CoursePriority::new().with_rule(rules::MostHours))
            .plan(&req);
        assert_eq!(heavy_first.term_of(2), Some(TermId::new(1, 1)));
        assert_eq!(heavy_first.term_of(1), Some(TermId::new(1, 2)));
    }

    #[test]
    fn test_suggested_term_first() {
        let req = request(
            vec![course(1, 64, &[monday()], &[]).with_suggested_term(2, 1)],
            Horizon::default(),
            256,
        );

        let scan = TermAllocator::new().plan(&req);
        assert_eq!(scan.term_of(1), Some(TermId::new(1, 1)));

        let suggested = TermAllocator::new()
            .with_suggested_term_first(true)
            .plan(&req);
        assert_eq!(suggested.term_of(1), Some(TermId::new(2, 1)));
    }

    #[test]
    fn test_locks_are_fixed_and_validated() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[monday(), opt(&["Martes"], "14:00-18:00")], &[]),
                course(3, 64, &[monday()], &[]),
                course(4, 64, &[monday()], &[]),
            ],
            Horizon::years(2, 2),
            256,
        )
        .with_approved([4])
        .with_locks([
            Lock::new(1, TermId::new(1, 2), monday()),
            Lock::new(99, TermId::new(1, 1), monday()),
            Lock::new(2, TermId::new(9, 1), monday()),
            Lock::new(4, TermId::new(1, 1), monday()),
            Lock::new(3, TermId::new(1, 2), monday()),
            Lock::new(1, TermId::new(2, 1), monday()),
        ]);

        let mut log = EventLog::new();
        let plan = TermAllocator::new().plan_with_observer(&req, &mut log);

        let reasons: Vec<LockRejection> =
            plan.rejected_locks.iter().map(|r| r.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                LockRejection::UnknownCourse,
                LockRejection::TermOutsideHorizon,
                LockRejection::AlreadyApproved,
                LockRejection::ScheduleConflict { with: 1 },
                LockRejection::DuplicateLock,
            ]
        );
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 2)));
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(3), Some(TermId::new(2, 1)));
        assert!(plan.is_complete());
        assert_eq!(
            log.events
                .iter()
                .filter(|e| matches!(e, PlanEvent::LockRejected { .. }))
                .count(),
            5
        );
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_lock_over_cap_rejected() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[opt(&["Martes"], "08:00-12:00")], &[]),
            ],
            Horizon::years(1, 2),
            100,
        )
        .with_locks([
            Lock::new(1, TermId::new(1, 1), monday()),
            Lock::new(2, TermId::new(1, 1), opt(&["Martes"], "08:00-12:00")),
        ]);
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(plan.rejected_locks.len(), 1);
        assert_eq!(plan.rejected_locks[0].reason, LockRejection::ExceedsHourCap);
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
    }

    #[test]
    fn test_lock_with_unplaceable_prerequisite_is_withheld() {
        let tuesday = opt(&["Martes"], "14:00-18:00");
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[tuesday.clone()], &[1]),
                course(3, 64, &[monday()], &[]),
            ],
            Horizon::years(2, 2),
            256,
        )
        .with_locks([
            Lock::new(3, TermId::new(1, 1), monday()),
            Lock::new(2, TermId::new(1, 2), tuesday),
        ]);
        let mut log = EventLog::new();
        let plan = TermAllocator::new().plan_with_observer(&req, &mut log);

        assert_valid(&plan, &req);
        assert_eq!(plan.rejected_locks.len(), 1);
        assert_eq!(plan.rejected_locks[0].lock.course_id, 2);
        assert_eq!(
            plan.rejected_locks[0].reason,
            LockRejection::PrerequisiteOrder { with: 1 }
        );
        assert_eq!(plan.term_of(3), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 2)));
        assert_eq!(plan.term_of(2), Some(TermId::new(2, 1)));
        assert_eq!(log.placements_of(1), vec![TermId::new(1, 2)]);
    }

    #[test]
    fn test_prerequisite_placed_before_locked_dependent() {
        let req = request(
            vec![
                course(1, 64, &[monday(), opt(&["Martes"], "14:00-18:00")], &[]),
                course(2, 64, &[opt(&["Jueves"], "08:00-12:00")], &[1]),
                course(3, 64, &[monday()], &[]),
            ],
            Horizon::years(2, 2),
            256,
        )
        .with_locks([
            Lock::new(3, TermId::new(1, 1), monday()),
            Lock::new(2, TermId::new(1, 2), opt(&["Jueves"], "08:00-12:00")),
        ]);
        let plan = TermAllocator::new().plan(&req);

        assert!(plan.rejected_locks.is_empty());
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(
            plan.assignment_for(1).map(|a| a.option.clone()),
            Some(opt(&["Martes"], "14:00-18:00"))
        );
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_lock_in_first_term_with_pending_prerequisite() {
        let req = request(
            vec![course(1, 64, &[monday()], &[]), course(2, 64, &[monday()], &[1])],
            Horizon::years(2, 2),
            256,
        )
        .with_lock(Lock::new(2, TermId::new(1, 1), monday()));
        let plan = TermAllocator::new().plan(&req);

        assert_eq!(
            plan.rejected_locks[0].reason,
            LockRejection::PrerequisiteOrder { with: 1 }
        );
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_locks_out_of_prerequisite_order() {
        let tuesday = opt(&["Martes"], "14:00-18:00");
        let wednesday = opt(&["Miércoles"], "14:00-18:00");
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[tuesday.clone()], &[1]),
                course(3, 64, &[wednesday.clone()], &[]),
                course(4, 64, &[tuesday.clone()], &[3, 404]),
            ],
            Horizon::years(2, 2),
            256,
        )
        .with_locks([
            Lock::new(2, TermId::new(1, 2), tuesday.clone()),
            Lock::new(1, TermId::new(1, 2), monday()),
            Lock::new(3, TermId::new(1, 1), wednesday),
            Lock::new(4, TermId::new(2, 1), tuesday),
        ]);
        let plan = TermAllocator::new().plan(&req);

        let reasons: Vec<(CourseId, LockRejection)> = plan
            .rejected_locks
            .iter()
            .map(|r| (r.lock.course_id, r.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (1, LockRejection::PrerequisiteOrder { with: 2 }),
                (4, LockRejection::PrerequisiteOrder { with: 404 }),
            ]
        );
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_suggested_term_yields_to_locked_descendant() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]).with_suggested_term(2, 1),
                course(2, 64, &[opt(&["Martes"], "14:00-18:00")], &[1]),
                course(3, 64, &[opt(&["Miércoles"], "14:00-18:00")], &[2]),
            ],
            Horizon::years(3, 2),
            256,
        )
        .with_lock(Lock::new(
            3,
            TermId::new(2, 1),
            opt(&["Miércoles"], "14:00-18:00"),
        ));
        let plan = TermAllocator::new()
            .with_suggested_term_first(true)
            .plan(&req);

        assert!(plan.rejected_locks.is_empty());
        assert_eq!(plan.term_of(1), Some(TermId::new(1, 1)));
        assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
        assert_eq!(plan.term_of(3), Some(TermId::new(2, 1)));
        assert_valid(&plan, &req);
    }

    #[test]
    fn test_replanning_from_locks_is_identical() {
        let req = request(
            vec![
                course(1, 64, &[monday(), opt(&["Martes"], "14:00-18:00")], &[]),
                course(2, 64, &[monday()], &[]),
                course(3, 96, &[opt(&["Jueves"], "18:30-22:30")], &[1, 2]),
                course(4, 128, &[monday()], &[3]),
                course(5, 64, &[monday()], &[6]),
                course(6, 64, &[monday()], &[5]),
            ],
            Horizon::years(2, 2),
            128,
        );
        let allocator = TermAllocator::new();
        let first = allocator.plan(&req);
        let second = allocator.plan(&req.clone().with_locks(first.to_locks()));

        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let req = request(
            vec![
                course(1, 64, &[monday()], &[]),
                course(2, 64, &[monday()], &[]),
                course(3, 64, &[monday()], &[1]),
            ],
            Horizon::default(),
            256,
        );
        let allocator = TermAllocator::new().with_priority(CoursePriority::prerequisites_first());
        assert_eq!(allocator.plan(&req), allocator.plan(&req));
    }

    #[test]
    fn test_events_report_levels_and_placements() {
        let req = request(
            vec![course(1, 64, &[monday()], &[]), course(2, 64, &[monday()], &[1])],
            Horizon::default(),
            256,
        );
        let mut log = EventLog::new();
        TermAllocator::new().plan_with_observer(&req, &mut log);

        assert_eq!(
            log.events[0],
            PlanEvent::LevelBuilt {
                level: 0,
                courses: vec![1]
            }
        );
        assert_eq!(log.placements_of(2), vec![TermId::new(1, 2)]);
    }

    #[test]
    fn test_empty_catalog() {
        let req = request(Vec::new(), Horizon::default(), 256);
        let plan = TermAllocator::new().plan(&req);
        assert_eq!(plan.terms.len(), 20);
        assert!(plan.is_complete());
        assert_eq!(plan.assignment_count(), 0);
    }

    fn random_catalog(rng: &mut SmallRng, size: u32) -> Vec<Course> {
        const DAYS: [&str; 5] = ["Lunes", "Martes", "Miércoles", "Jueves", "Viernes"];
        const TIMES: [&str; 5] = [
            "08:00-12:00",
            "10:00-13:00",
            "14:00-18:00",
            "16:00-18:00",
            "18:30-22:30",
        ];
        const HOURS: [u32; 5] = [32, 64, 96, 128, 200];

        (1..=size)
            .map(|id| {
                let mut c = Course::new(id, format!("Course {id}"))
                    .with_hours(HOURS[rng.random_range(0..HOURS.len())]);
                for _ in 0..rng.random_range(0..4) {
                    let first = DAYS[rng.random_range(0..DAYS.len())];
                    let second = DAYS[rng.random_range(0..DAYS.len())];
                    let time = TIMES[rng.random_range(0..TIMES.len())];
                    c = c.with_option(opt(&[first, second], time));
                }
                for _ in 0..rng.random_range(0..3) {
                    if id > 1 {
                        c = c.with_correlative(rng.random_range(1..id));
                    }
                }
                if rng.random_bool(0.05) {
                    c = c.with_correlative(1000 + id);
                }
                c
            })
            .collect()
    }

    #[test]
    fn test_random_catalogs_keep_invariants() {
        let mut rng = SmallRng::seed_from_u64(42);
        for round in 0..25 {
            let courses = random_catalog(&mut rng, 30);
            let req = request(courses, Horizon::years(3, 2), 192);
            let allocator = if round % 2 == 0 {
                TermAllocator::new()
            } else {
                TermAllocator::new().with_priority(CoursePriority::prerequisites_first())
            };
            let plan = allocator.plan(&req);

            assert_valid(&plan, &req);
            for c in req.catalog.iter() {
                assert!(
                    plan.is_placed(c.id) != plan.is_unplaced(c.id),
                    "course {} must be placed xor unplaced",
                    c.id
                );
            }
            let replay = allocator.plan(&req.clone().with_locks(plan.to_locks()));
            assert_eq!(plan, replay, "round {round} not idempotent");
        }
    }

    #[test]
    fn test_random_locks_on_dependents_keep_invariants() {
        let mut rng = SmallRng::seed_from_u64(7);
        let horizon = Horizon::years(3, 2);
        for round in 0..25 {
            let courses = random_catalog(&mut rng, 30);
            let mut locks = Vec::new();
            for c in &courses {
                if c.correlatives.is_empty() || c.schedule_options.is_empty() {
                    continue;
                }
                if !rng.random_bool(0.3) {
                    continue;
                }
                let terms = horizon.terms();
                let term = terms[rng.random_range(0..terms.len())];
                let options = &c.schedule_options;
                let option = options[rng.random_range(0..options.len())].clone();
                locks.push(Lock::new(c.id, term, option));
            }
            let req = request(courses, horizon.clone(), 192).with_locks(locks);
            let plan = TermAllocator::new().plan(&req);

            assert_valid(&plan, &req);
            for lock in &req.locks {
                let rejected = plan.rejected_locks.iter().any(|r| &r.lock == lock);
                assert!(
                    rejected || plan.term_of(lock.course_id) == Some(lock.term),
                    "round {round}: lock on {} neither applied nor rejected",
                    lock.course_id
                );
            }
            for c in req.catalog.iter() {
                assert!(plan.is_placed(c.id) != plan.is_unplaced(c.id));
            }
        }
    }
}
