//! Run configuration: the trigger payload and the dependencies built from the environment.

mod dependencies;
mod trigger;

pub use dependencies::Dependencies;
pub use trigger::{SyncTrigger, TriggerTables};
