use async_trait::async_trait;

use super::{AuthError, ClientAuthenticator};
use crate::messages::{Authenticate, Challenge, Dict};

/// `anonymous` authentication: no secret, no CHALLENGE.
#[derive(Debug, Clone, Default)]
pub struct AnonymousAuthenticator {
    authid: String,
    authextra: Dict,
}

impl AnonymousAuthenticator {
    /// Create an anonymous authenticator. Missing `authextra` becomes `{}`.
    pub fn new(authid: impl Into<String>, authextra: Option<Dict>) -> Self {
        Self {
            authid: authid.into(),
            authextra: authextra.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ClientAuthenticator for AnonymousAuthenticator {
    fn auth_method(&self) -> &str {
        "anonymous"
    }

    fn auth_id(&self) -> &str {
        &self.authid
    }

    fn auth_extra(&self) -> Option<&Dict> {
        Some(&self.authextra)
    }

    async fn authenticate(&self, _challenge: &Challenge) -> Result<Authenticate, AuthError> {
        Err(AuthError::AnonymousChallenge)
    }
}
