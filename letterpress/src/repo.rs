mod authors;
mod deliveries;
mod posts;
mod subscribers;

pub use authors::{AuthorCredentials, AuthorsRepo};
pub use deliveries::DeliveriesRepo;
pub use posts::PostsRepo;
pub use subscribers::{PgSubscriberRepo, SubscriberRepo};
