//! 1-out-of-2 random oblivious transfer over the Ristretto group.
//!
//! The sender of a random OT ends up with two fresh random keys; the
//! receiver ends up with exactly the one selected by its private choice
//! bit. Neither party learns anything else.

pub mod ot;

pub use ot::*;
