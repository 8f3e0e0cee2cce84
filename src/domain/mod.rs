//! Domain layer - marketplace billing rules with no I/O.

pub mod billing;
pub mod earnings;
pub mod foundation;
pub mod subscription;
pub mod usage;
