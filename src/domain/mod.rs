pub mod forum;
pub mod outcome;

pub use forum::Forum;
pub use outcome::{ForumOutcome, RunOutcome};
