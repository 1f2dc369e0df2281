//! Unit tests for the routing bounded context.
