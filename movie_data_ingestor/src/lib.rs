pub mod models;
pub mod normalize;
pub mod providers;
pub mod rate_guard;
