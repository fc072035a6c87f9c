use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use super::{AuthError, ClientAuthenticator};
use crate::messages::{Authenticate, Challenge, Dict};

/// `ticket` authentication: answers any CHALLENGE with the pre-shared ticket.
#[derive(Clone)]
pub struct TicketAuthenticator {
    authid: String,
    ticket: Zeroizing<String>,
    authextra: Option<Dict>,
}

impl TicketAuthenticator {
    /// Create a ticket authenticator
    pub fn new(authid: impl Into<String>, ticket: impl Into<String>, authextra: Option<Dict>) -> Self {
        Self {
            authid: authid.into(),
            ticket: Zeroizing::new(ticket.into()),
            authextra,
        }
    }
}

impl fmt::Debug for TicketAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketAuthenticator")
            .field("authid", &self.authid)
            .field("ticket", &"[REDACTED]")
            .field("authextra", &self.authextra)
            .finish()
    }
}

#[async_trait]
impl ClientAuthenticator for TicketAuthenticator {
    fn auth_method(&self) -> &str {
        "ticket"
    }

    fn auth_id(&self) -> &str {
        &self.authid
    }

    fn auth_extra(&self) -> Option<&Dict> {
        self.authextra.as_ref()
    }

    async fn authenticate(&self, _challenge: &Challenge) -> Result<Authenticate, AuthError> {
        Ok(Authenticate::new(self.ticket.as_str(), Dict::new()))
    }
}
