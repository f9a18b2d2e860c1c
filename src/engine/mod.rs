//! The two computational cores: the balance engine (pure) and the reminder
//! scheduler (state machine + polling loop).

pub mod balance;
pub mod runner;
pub mod scheduler;

pub use balance::{compute_settlements, net_positions};
pub use scheduler::{ReminderScheduler, TickReport};
