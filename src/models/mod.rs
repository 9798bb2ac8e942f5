//! Domain models

pub mod book;
pub mod document;
pub mod fine;
pub mod reading_session;
pub mod reconciliation;
pub mod request;
pub mod user;
