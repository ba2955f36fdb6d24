//! Booking status transition policy
//!
//! A booking moves forward one step at a time along [`STATUS_CHAIN`]. The
//! policy is pure: no state, no locks, no side effects.

use crate::types::BookingStatus;

/// The only legal order of statuses; the last entry is terminal
pub const STATUS_CHAIN: [BookingStatus; 5] = [
    BookingStatus::Pending,
    BookingStatus::Accepted,
    BookingStatus::OnTheWay,
    BookingStatus::Washing,
    BookingStatus::Complete,
];

/// Outcome of evaluating a requested transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDecision {
    Allowed,
    Denied,
}

impl TransitionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, TransitionDecision::Allowed)
    }
}

/// The single status that may follow `status`, if any
pub fn successor(status: BookingStatus) -> Option<BookingStatus> {
    STATUS_CHAIN
        .iter()
        .position(|s| *s == status)
        .and_then(|i| STATUS_CHAIN.get(i + 1))
        .copied()
}

/// Whether no further transition is possible
pub fn is_terminal(status: BookingStatus) -> bool {
    successor(status).is_none()
}

/// Decide whether `current → requested` is legal
pub fn evaluate(current: BookingStatus, requested: BookingStatus) -> TransitionDecision {
    match successor(current) {
        Some(next) if next == requested => TransitionDecision::Allowed,
        _ => TransitionDecision::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = BookingStatus> {
        proptest::sample::select(STATUS_CHAIN.to_vec())
    }

    fn rank(status: BookingStatus) -> usize {
        STATUS_CHAIN.iter().position(|s| *s == status).unwrap()
    }

    #[test]
    fn test_forward_chain_is_allowed() {
        for pair in STATUS_CHAIN.windows(2) {
            assert_eq!(evaluate(pair[0], pair[1]), TransitionDecision::Allowed);
        }
    }

    #[test]
    fn test_named_denials() {
        use BookingStatus::*;

        assert_eq!(evaluate(Pending, Washing), TransitionDecision::Denied);
        assert_eq!(evaluate(Accepted, Pending), TransitionDecision::Denied);
        assert_eq!(evaluate(Complete, Accepted), TransitionDecision::Denied);
        assert_eq!(evaluate(Accepted, Accepted), TransitionDecision::Denied);
        assert_eq!(evaluate(Accepted, Washing), TransitionDecision::Denied);
    }

    #[test]
    fn test_complete_is_the_only_terminal_status() {
        for status in STATUS_CHAIN {
            assert_eq!(is_terminal(status), status == BookingStatus::Complete);
        }
        assert_eq!(successor(BookingStatus::Washing), Some(BookingStatus::Complete));
    }

    proptest! {
        #[test]
        fn prop_allowed_iff_adjacent_next(current in any_status(), requested in any_status()) {
            let allowed = evaluate(current, requested).is_allowed();
            prop_assert_eq!(allowed, rank(requested) == rank(current) + 1);
        }

        #[test]
        fn prop_complete_admits_nothing(requested in any_status()) {
            prop_assert_eq!(
                evaluate(BookingStatus::Complete, requested),
                TransitionDecision::Denied
            );
        }
    }
}
