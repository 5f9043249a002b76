//! Deployment-time selection of the nonce-derivation hash and salt size.
//!
//! The profile is not persisted outside of its effect on `SaltSize` (which
//! *is* persisted, since the salt itself is stored in the header). Decrypting
//! a file with a profile different from the one it was encrypted under will
//! fail: either the salt length read from the header won't match what the
//! HMAC produces, or the first block's tag simply won't verify.

use std::env;

/// Hash and salt-size combination used for the HMAC/HKDF nonce derivation in
/// [`crate::nonce`].
///
/// `Default` matches the reference implementation's out-of-the-box behavior;
/// `Constrained` trades a smaller salt (and a cheaper HMAC) for use in
/// resource-limited environments such as CI runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// HMAC-SHA3-512, 64-byte salt.
    Default,
    /// HMAC-SHA-256, 32-byte salt.
    Constrained,
}

impl Profile {
    /// Salt size in bytes for this profile.
    #[must_use]
    pub const fn salt_size(self) -> usize {
        match self {
            Profile::Default => 64,
            Profile::Constrained => 32,
        }
    }

    /// Select a profile from the environment, matching the reference
    /// implementation's CI workaround: `CI=true` or `GITHUB_ACTIONS=true`
    /// selects [`Profile::Constrained`].
    ///
    /// This is a deployment convenience, not the primary API — production
    /// callers should construct a [`Profile`] explicitly instead of relying
    /// on ambient environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let is_ci = |var: &str| env::var(var).is_ok_and(|v| v == "true");
        Self::from_flags(is_ci("CI"), is_ci("GITHUB_ACTIONS"))
    }

    /// Pure core of [`Self::from_env`], split out so it can be tested without
    /// mutating process-global environment state.
    const fn from_flags(ci: bool, github_actions: bool) -> Self {
        if ci || github_actions {
            Profile::Constrained
        } else {
            Profile::Default
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_sizes_match_spec() {
        assert_eq!(Profile::Default.salt_size(), 64);
        assert_eq!(Profile::Constrained.salt_size(), 32);
    }

    #[test]
    fn from_flags_selects_constrained_for_ci() {
        assert_eq!(Profile::from_flags(true, false), Profile::Constrained);
        assert_eq!(Profile::from_flags(false, true), Profile::Constrained);
        assert_eq!(Profile::from_flags(true, true), Profile::Constrained);
    }

    #[test]
    fn from_flags_defaults_without_ci() {
        assert_eq!(Profile::from_flags(false, false), Profile::Default);
    }
}
