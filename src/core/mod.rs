//! Foundational types shared by the engine, analysis, and simulation layers.

pub mod event;
pub mod participant;
pub mod preference;
