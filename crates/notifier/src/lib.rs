//! Delivery adapters for deadline reminders.
//!
//! Two channels exist: push notifications through FCM and email through
//! either EmailJS or an SMTP relay. Each adapter reports success with the
//! provider's response text, or a `DeliveryError` whose message ends up in
//! the caller's outcome record. Nothing here retries.

pub mod channels;
pub mod emailjs;
pub mod error;
pub mod fcm;
pub mod message;
pub mod smtp;

pub use channels::{Channels, EmailSender, PushSender};
pub use error::DeliveryError;
pub use message::{EmailMessage, PushMessage};
