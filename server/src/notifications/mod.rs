pub mod mailer;
pub mod messages;

pub use mailer::{Email, LogMailer, MailError, Mailer, SmtpMailer};
