//! Domain logic: runs, ideas, purchases, and the generation job.

pub mod generation;
pub mod ideas;
pub mod purchases;
pub mod runs;
