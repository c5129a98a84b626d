//! Functional units driven by the pipeline framework.

/// IEEE-754 adder stages and their pipelined, state-machine and multi-lane realisations.
pub mod fpu;
