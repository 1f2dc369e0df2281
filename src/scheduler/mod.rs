//! Polling worker: claims ready agent tasks and hands them to an external
//! agent command.
//!
//! The scheduler writes through the task lifecycle service, so it competes
//! for claims on the same terms as any other caller.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
