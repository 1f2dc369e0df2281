//! Unit tests for the project bounded context.
