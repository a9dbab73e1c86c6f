//! semicircle-validate: statistical validation of semicircle-constraint data.
//!
//! Checks measured (q, C) pairs against the closed form C(q) = sqrt(q(1-q))
//! and its circle form (q - 1/2)^2 + C^2 = 1/4, and runs seeded simulations
//! (gradient variance scans, exponential depth decay, convergence) that are
//! compared against the same theory curves.

pub mod constraint;
pub mod scenarios;
pub mod simulate;
pub mod stats;
pub mod types;
