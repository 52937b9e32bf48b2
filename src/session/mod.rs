//! Guided, resumable execution of one day's workouts.

pub mod engine;
pub mod recovery;
pub mod snapshot;
pub mod timer;

pub use engine::{DEFAULT_REST_SECONDS, LiveSession, SessionState};
pub use snapshot::{ExerciseProgress, SessionSnapshot, SnapshotStore};
