//! Display names for whoever sent a request

use std::net::SocketAddr;

pub const ANONYMOUS: &str = "anonymous";
pub const MAX_NAME_CHARS: usize = 32;

/// Who sent a request, as far as the transport can tell.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub addr: SocketAddr,
    /// Name attached by the hosting page, if any.
    pub claimed_name: Option<String>,
}

/// Resolves the display name of the caller. Authentication is the host's
/// job; the scoreboard only needs something to print next to a comment.
pub trait IdentityProvider: Send + Sync {
    fn display_name(&self, caller: &Caller) -> String;
}

/// Trusts the name the hosting context attached to the request.
#[derive(Debug, Default, Clone)]
pub struct HostIdentity;

impl IdentityProvider for HostIdentity {
    fn display_name(&self, caller: &Caller) -> String {
        let name: String = caller
            .claimed_name
            .as_deref()
            .unwrap_or_default()
            .trim()
            .chars()
            .filter(|c| !c.is_control())
            .take(MAX_NAME_CHARS)
            .collect();

        if name.is_empty() {
            ANONYMOUS.to_string()
        } else {
            name
        }
    }
}
