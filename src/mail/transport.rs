//! Transport parameters and the delivery seam.

use lettre::transport::smtp::authentication::Credentials;

use crate::config::ServerProfile;
use crate::mail::message::ComposedMessage;

/// Error type returned by [`Transport`] implementations.
pub type TransportFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Delivers a finished message. One call is one delivery attempt.
pub trait Transport {
    fn deliver(
        &self,
        settings: &TransportSettings,
        message: &ComposedMessage,
    ) -> Result<(), TransportFailure>;
}

/// Connection parameters taken from a [`ServerProfile`].
#[derive(Clone)]
pub struct TransportSettings {
    pub host: String,
    /// `None` keeps the default port for the TLS mode.
    pub port: Option<u16>,
    pub credentials: Option<Credentials>,
    pub bounce_address: Option<String>,
    pub debug: bool,
    pub tls_on_connect: bool,
}

impl TransportSettings {
    /// Map a profile onto transport parameters. Optional values are only
    /// carried over when present and non-empty.
    pub fn from_profile(profile: &ServerProfile) -> Self {
        Self {
            host: profile.host.clone(),
            port: profile.port,
            credentials: profile
                .credentials()
                .map(|(user, password)| Credentials::new(user.to_owned(), password.to_owned())),
            bounce_address: profile.bounce_address.clone().filter(|b| !b.is_empty()),
            debug: profile.debug,
            tls_on_connect: profile.tls_on_connect,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}

impl std::fmt::Debug for TransportSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("authenticated", &self.is_authenticated())
            .field("bounce_address", &self.bounce_address)
            .field("debug", &self.debug)
            .field("tls_on_connect", &self.tls_on_connect)
            .finish()
    }
}
