//! Flutter-facing bindings for the HabitMap core.

pub mod api;
