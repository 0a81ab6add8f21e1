pub mod arena;
pub mod round;
