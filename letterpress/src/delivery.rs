mod executor;
mod ledger;
mod pacer;
mod pipeline;
mod scanner;
mod selector;

/// Email body rendering
pub mod render;

pub use executor::{dispatch, DispatchOutcome, RecipientFailure};
pub use ledger::{record_and_dispatch, DeliverySummary};
pub use pacer::BatchPacer;
pub use pipeline::{
    scan_and_send_due, send_now, ScanOutcome, ScanReport, SendOutcome, SkipReason,
};
pub use scanner::is_due;
pub use selector::{select_posts, AUTO_SELECT_CAP};
