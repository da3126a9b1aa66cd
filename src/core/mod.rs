pub mod updater;

pub use updater::{RunReport, Updater};
