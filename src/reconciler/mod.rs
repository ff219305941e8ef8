pub mod pass;
pub mod shorts;
pub mod state;

pub use pass::{
    clear_suppression, collect_candidates, reconcile, CandidateItem, ItemVerdict, PassOutcome,
    PassReport,
};
pub use shorts::{apply_short_form, SHORTS_BLOCKED_NOTICE};
pub use state::{OperatingState, PassContext};
