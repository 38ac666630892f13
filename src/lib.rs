//! Curriculum term planning.
//!
//! Distributes the courses of a study plan over a horizon of academic
//! terms, honouring prerequisites (correlatives), a per-term workload cap
//! and weekly timetable conflicts.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Course`, `Catalog`, `ScheduleOption`,
//!   `TermId`, `Horizon`, `Preferences`, `Lock`, `Plan`
//! - **`validation`**: Catalog integrity checks and plan verification
//! - **`conflict`**: Weekly slot overlap tests and option selection
//! - **`graph`**: Prerequisite graph and Kahn leveling
//! - **`priority`**: Rules for ordering courses within a level
//! - **`planner`**: Term allocator, plan assembly, KPIs and events
//!
//! # Example
//!
//! ```
//! use u_curriculum::models::{Catalog, Horizon, Preferences, TermId};
//! use u_curriculum::planner::{PlanKpi, PlanRequest, TermAllocator};
//!
//! let json = r#"[
//!   {"id": 1, "name": "Análisis I", "hours": 128,
//!    "scheduleOptions": [{"days": ["Lunes", "Jueves"], "time": "14:00-18:00"}],
//!    "correlatives": []},
//!   {"id": 2, "name": "Análisis II", "hours": 128,
//!    "scheduleOptions": [{"days": ["Lunes"], "time": "18:30-22:30"}],
//!    "correlatives": [1]}
//! ]"#;
//! let catalog = Catalog::from_json_str(json).unwrap();
//! let request = PlanRequest::new(catalog, Horizon::default(), Preferences::new(192));
//!
//! let plan = TermAllocator::new().plan(&request);
//! assert_eq!(plan.term_of(2), Some(TermId::new(1, 2)));
//!
//! let kpi = PlanKpi::calculate(&plan, &request.preferences);
//! assert_eq!(kpi.terms_used, 2);
//! ```
//!
//! # References
//!
//! - Kahn (1962), "Topological sorting of large networks"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

pub mod conflict;
pub mod graph;
pub mod models;
pub mod planner;
pub mod priority;
pub mod validation;
