mod actor;
mod email_address;
mod frequency;
mod status;

pub use actor::{Actor, Role};
pub use email_address::EmailAddress;
pub use frequency::{DigestFrequency, SendMode};
pub use status::{DeliveryStatus, PostStatus, SubscriberStatus};
