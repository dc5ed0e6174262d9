//! Verification email delivery.
//!
//! The governor talks to a [`NotificationSender`]; this crate provides an
//! HTTP transactional-mail implementation, an SMTP implementation, and a
//! logging implementation for local development.

pub mod config;
pub mod error;
pub mod http;
pub mod log;
pub mod sender;
pub mod smtp;
mod template;

pub use config::MailConfig;
pub use error::MailError;
pub use http::HttpMailSender;
pub use log::LogMailSender;
pub use sender::{verification_link, NotificationSender};
pub use smtp::SmtpMailSender;
