pub mod movie;
pub mod raw;
