// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::OperationKind;

/// Grant sent to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenGrant {
	/// Authorization code redeemed after the PKCE redirect.
	AuthorizationCode,
	/// Refresh token traded for a fresh access token.
	RefreshToken,
}
impl TokenGrant {
	/// Wire value of the `grant_type` parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenGrant::AuthorizationCode => "authorization_code",
			TokenGrant::RefreshToken => "refresh_token",
		}
	}

	pub(crate) const fn operation(self) -> OperationKind {
		match self {
			TokenGrant::AuthorizationCode => OperationKind::TokenExchange,
			TokenGrant::RefreshToken => OperationKind::TokenRefresh,
		}
	}
}

/// Snapshot of the counters kept for one grant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrantCounts {
	/// Exchanges started.
	pub attempts: u64,
	/// Exchanges that produced a token.
	pub successes: u64,
	/// Exchanges the token endpoint or transport rejected.
	pub failures: u64,
}

#[derive(Debug, Default)]
struct GrantCounters {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
}
impl GrantCounters {
	fn snapshot(&self) -> GrantCounts {
		GrantCounts {
			attempts: self.attempts.load(Ordering::Relaxed),
			successes: self.successes.load(Ordering::Relaxed),
			failures: self.failures.load(Ordering::Relaxed),
		}
	}
}

/// Token endpoint exchange counters of one OAuth provider, kept per grant.
///
/// Single-flight waiters that adopt another caller's outcome are not counted; every count maps to
/// one request the token endpoint actually saw.
#[derive(Debug, Default)]
pub struct TokenMetrics {
	authorization_code: GrantCounters,
	refresh_token: GrantCounters,
	consecutive_failures: AtomicU64,
}
impl TokenMetrics {
	/// Counters for `grant`.
	pub fn grant(&self, grant: TokenGrant) -> GrantCounts {
		self.counters(grant).snapshot()
	}

	/// Exchanges started across all grants.
	pub fn attempts(&self) -> u64 {
		self.total(|counts| counts.attempts)
	}

	/// Exchanges that produced a token across all grants.
	pub fn successes(&self) -> u64 {
		self.total(|counts| counts.successes)
	}

	/// Failed exchanges across all grants.
	pub fn failures(&self) -> u64 {
		self.total(|counts| counts.failures)
	}

	/// Failures since the last successful exchange.
	pub fn consecutive_failures(&self) -> u64 {
		self.consecutive_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self, grant: TokenGrant) {
		self.counters(grant).attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_outcome(&self, grant: TokenGrant, succeeded: bool) {
		let counters = self.counters(grant);

		if succeeded {
			counters.successes.fetch_add(1, Ordering::Relaxed);
			self.consecutive_failures.store(0, Ordering::Relaxed);
		} else {
			counters.failures.fetch_add(1, Ordering::Relaxed);
			self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
		}
	}

	fn counters(&self, grant: TokenGrant) -> &GrantCounters {
		match grant {
			TokenGrant::AuthorizationCode => &self.authorization_code,
			TokenGrant::RefreshToken => &self.refresh_token,
		}
	}

	fn total(&self, field: impl Fn(GrantCounts) -> u64) -> u64 {
		field(self.authorization_code.snapshot()) + field(self.refresh_token.snapshot())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counts_are_kept_per_grant() {
		let metrics = TokenMetrics::default();

		metrics.record_attempt(TokenGrant::AuthorizationCode);
		metrics.record_outcome(TokenGrant::AuthorizationCode, true);
		metrics.record_attempt(TokenGrant::RefreshToken);
		metrics.record_outcome(TokenGrant::RefreshToken, false);
		metrics.record_attempt(TokenGrant::RefreshToken);
		metrics.record_outcome(TokenGrant::RefreshToken, false);

		assert_eq!(
			metrics.grant(TokenGrant::AuthorizationCode),
			GrantCounts { attempts: 1, successes: 1, failures: 0 }
		);
		assert_eq!(metrics.grant(TokenGrant::RefreshToken), GrantCounts { attempts: 2, successes: 0, failures: 2 });
		assert_eq!(metrics.attempts(), 3);
		assert_eq!(metrics.consecutive_failures(), 2);

		metrics.record_attempt(TokenGrant::RefreshToken);
		metrics.record_outcome(TokenGrant::RefreshToken, true);

		assert_eq!(metrics.consecutive_failures(), 0);
		assert_eq!(metrics.successes(), 2);
	}
}
