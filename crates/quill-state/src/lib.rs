pub mod authority_check;
pub mod engine;
pub mod reward;
pub mod store;
pub mod table;

pub use authority_check::{check_authority, AuthorityLevel};
pub use engine::{apply_operation, run_housekeeping, StateEngine};
pub use reward::{advance_recent_claims, evaluate_reward_curve};
pub use store::Store;
