pub mod attempt;
pub mod candidate;
pub mod events;
pub mod space;
pub mod task;

pub use attempt::{AttemptOutcome, AttemptResult, FailureStage, SessionOutcome, SessionReport};
pub use candidate::Candidate;
pub use events::{AppEvent, EventSink, ProgressSnapshot, SessionPhase};
pub use space::{resolve_alphabet, CandidateSpace, SpecError};
pub use task::{Recurrence, Task, SCHEDULE_DATETIME_FORMAT};
