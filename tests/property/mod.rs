//! Property-based tests for availability and composition laws

mod composition_laws;
