//! Request-scoped authentication context.

use std::net::IpAddr;

use crate::auth::token::Claims;

/// Outcome of the authentication filter, attached to the request for the
/// duration of the filter chain.
///
/// The enum makes the invariant structural: a context can only be
/// authenticated when verified claims are present.
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// No token, or a token that failed verification.
    Anonymous,

    /// A token that verified against the signing secret and is unexpired.
    Authenticated(Claims),
}

impl AuthContext {
    /// Verified claims, if any. The proxy uses this when stamping identity
    /// headers on the forwarded request.
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            AuthContext::Authenticated(claims) => Some(claims),
            AuthContext::Anonymous => None,
        }
    }

    /// Rate-limit key for this caller. Authenticated traffic is keyed by
    /// subject, anonymous traffic by peer address; the namespaces are
    /// disjoint so the two are limited independently.
    pub fn rate_limit_key(&self, peer: IpAddr) -> String {
        match self {
            AuthContext::Authenticated(claims) => format!("user:{}", claims.sub),
            AuthContext::Anonymous => format!("ip:{peer}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_separates_authenticated_and_anonymous() {
        let peer: IpAddr = "10.0.0.7".parse().unwrap();
        let anon = AuthContext::Anonymous;
        let authed = AuthContext::Authenticated(Claims {
            sub: "alice".into(),
            roles: vec![],
            iat: 0,
            exp: i64::MAX,
        });
        assert_eq!(anon.rate_limit_key(peer), "ip:10.0.0.7");
        assert_eq!(authed.rate_limit_key(peer), "user:alice");
    }
}
