pub mod badges;
pub mod levels;
pub mod scoring;

pub use badges::evaluate_badges;
pub use levels::{calculate_level, level_progress, max_level, xp_to_next_level, LevelUp};
pub use scoring::{base_points, calculate_points, SessionScore};
