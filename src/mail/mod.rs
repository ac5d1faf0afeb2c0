//! Report mail pipeline: recipients, attachments, transport parameters,
//! message assembly and failure reporting.

pub mod address;
pub mod attachment;
pub mod composer;
pub mod describe;
pub mod inline;
pub mod message;
pub mod smtp;
pub mod transport;

pub use attachment::{Attachment, Disposition};
pub use composer::MessageComposer;
pub use describe::{AuthenticationFailed, describe};
pub use message::{ComposedMessage, ComposedMessageBuilder};
pub use smtp::SmtpDelivery;
pub use transport::{Transport, TransportFailure, TransportSettings};
