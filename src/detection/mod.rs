// Detection - rule evaluation over decoded packets and the worker pool feeding it
pub mod alert;
pub mod engine;

pub use alert::Alert;
pub use engine::{DetectionEngine, DetectionStats};
