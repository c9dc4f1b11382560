pub mod commands;
pub mod controller;
pub mod slides;
pub mod timer;

pub use controller::{CookController, CookSnapshot, ExitOutcome, TimerSnapshot};
pub use slides::{Slide, SlideDeck};
pub use timer::{StepTimer, Tick, TimerPhase};
