//! Reward-curve evaluation and the `recent_claims` decay accumulator a
//! `RewardFund` uses to turn a comment's claimed rshares into a share of the
//! fund's balance.

use quill_core::constants::RECENT_RSHARES_DECAY_SECS;
use quill_core::global::RewardCurve;
use quill_core::types::Timestamp;

/// `f(r)` for the given curve, saturating at `u128::MAX` rather than
/// overflowing — rshares are bounded well below the point this would bite,
/// but the original's u256 intermediate is worth at least saturating
/// defensively against.
pub fn evaluate_reward_curve(rshares: i64, curve: RewardCurve, content_constant: u128) -> u128 {
    if rshares <= 0 {
        return 0;
    }
    let r = rshares as u128;
    match curve {
        RewardCurve::Quadratic => {
            let s = content_constant / 2;
            let a = r.saturating_add(s);
            a.saturating_mul(a).saturating_sub(s.saturating_mul(s))
        }
        RewardCurve::Linear => r,
        RewardCurve::Power { power_factor } => r.saturating_mul(power_factor as u128) / 10_000,
    }
}

/// Decays `recent_claims` linearly over `RECENT_RSHARES_DECAY_SECS` since
/// `last_update`, then adds `claim`. Mirrors the original's
/// `recent_claims -= recent_claims * delta_time / decay_window`.
pub fn advance_recent_claims(recent_claims: u128, last_update: Timestamp, now: Timestamp, claim: u128) -> u128 {
    let elapsed = (now - last_update).max(0) as u128;
    let decayed = if elapsed >= RECENT_RSHARES_DECAY_SECS as u128 {
        0
    } else {
        recent_claims - (recent_claims * elapsed) / RECENT_RSHARES_DECAY_SECS as u128
    };
    decayed.saturating_add(claim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_curve_matches_expansion() {
        let got = evaluate_reward_curve(1_000, RewardCurve::Quadratic, 2_000_000_000);
        let s = 1_000_000_000u128;
        let expected = (1_000u128 + s).pow(2) - s.pow(2);
        assert_eq!(got, expected);
    }

    #[test]
    fn non_positive_rshares_claim_nothing() {
        assert_eq!(evaluate_reward_curve(0, RewardCurve::Linear, 0), 0);
        assert_eq!(evaluate_reward_curve(-5, RewardCurve::Linear, 0), 0);
    }

    #[test]
    fn recent_claims_decays_fully_past_window() {
        let got = advance_recent_claims(1_000_000, 0, RECENT_RSHARES_DECAY_SECS + 1, 500);
        assert_eq!(got, 500);
    }

    #[test]
    fn recent_claims_decays_proportionally() {
        let half_window = RECENT_RSHARES_DECAY_SECS / 2;
        let got = advance_recent_claims(1_000_000, 0, half_window, 0);
        assert_eq!(got, 500_000);
    }
}
