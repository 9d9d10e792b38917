/// Newsletter settings and subscriber management endpoints
pub mod newsletter_settings;
/// Newsletter send/scan/history endpoints
pub mod newsletters;
/// Public subscription endpoints
pub mod subscriptions;
