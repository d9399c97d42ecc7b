/// Freshness of the cached token relative to the refresh margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Fresh { remaining_seconds: i64 },
    Stale { remaining_seconds: i64 },
}

impl TokenState {
    pub fn is_fresh(&self) -> bool {
        matches!(self, TokenState::Fresh { .. })
    }

    pub fn remaining_seconds(&self) -> i64 {
        match *self {
            TokenState::Fresh { remaining_seconds } | TokenState::Stale { remaining_seconds } => remaining_seconds,
        }
    }
}

/// Classify a cached expiry.
///
/// `None` and `0` mean no token. The remaining time is `|expiry - now|`, so a
/// token that expired `n` seconds ago and one that becomes valid in `n`
/// seconds are classified the same way.
pub fn evaluate(expiry_epoch_seconds: Option<i64>, now: i64, safety_margin_seconds: i64) -> TokenState {
    let expiry = match expiry_epoch_seconds {
        Some(expiry) if expiry != 0 => expiry,
        _ => return TokenState::Stale { remaining_seconds: 0 },
    };
    let remaining_seconds = expiry.saturating_sub(now).saturating_abs();
    if remaining_seconds < safety_margin_seconds {
        TokenState::Stale { remaining_seconds }
    } else {
        TokenState::Fresh { remaining_seconds }
    }
}
