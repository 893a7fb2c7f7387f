//! screendle-core: deterministic daily scheduling for Classic and Scales

pub mod assignment;
pub mod classic;
pub mod date;
pub mod error;
pub mod fallback;
pub mod movie;
pub mod prng;
pub mod reconcile;
pub mod salt;
pub mod scales;
pub mod shuffle;
pub mod store;
pub mod time;
pub mod window;

pub use assignment::{ClassicAssignment, ScalesRound};
pub use classic::{ClassicPick, ClassicPlan, ClassicScheduler};
pub use date::{DateSpan, add_days, date_to_seed, format_date, parse_date, subtract_days};
pub use error::ScheduleError;
pub use fallback::{ClassicToday, FallbackLevel, OnlineFallback, ScalesToday};
pub use movie::{CandidateMovie, ExternalId, eligible_pool};
pub use prng::{Seed, seeded_random};
pub use reconcile::{BatchOptions, BatchPlan, CommitSummary, Horizon, commit, plan_batch, run_batch};
pub use salt::{Salt, SaltTable};
pub use scales::{MOVIES_PER_DAY, ROUNDS_PER_DAY, ScalesPair, ScalesPlan, ScalesScheduler, rank_pairs};
pub use shuffle::seeded_shuffle;
pub use store::{AssignmentStore, MemoryStore, PoolProvider};
pub use window::LookbackWindow;
