//! Unit tests for the plan bounded context.
