mod authors;
mod deliveries;
mod posts;
mod subscribers;

pub use authors::{Author, NewAuthor, NewsletterSettingsUpdate};
pub use deliveries::{Delivery, NewDelivery};
pub use posts::{NewPost, Post, PostTitle};
pub use subscribers::{NewSubscriber, Subscriber, SubscriberStats};
