// giveawaybot-core/src/tasks/mod.rs

pub mod accrual;

pub use accrual::{spawn_accrual_task, spawn_accrual_task_with_restart_delay};
