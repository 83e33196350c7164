use super::models::{Bucket, CountdownState, CountdownTarget, ScheduledEvent};
use crate::utils::time::{format_hm, format_hms};
use chrono::{DateTime, Duration, Utc};

/// Text shown while the first event is inside its grace window
pub const STARTED_TEXT: &str = "00:00:00";

/// How long the countdown stays pinned after the first event starts
pub fn grace_window() -> Duration {
    Duration::seconds(60)
}

/// Derive the countdown from the visible events of a timeline.
///
/// Counts down to the first event until it starts, then shows
/// [`STARTED_TEXT`] for one minute, then counts down to the next event that
/// hasn't started yet.
pub fn compute_countdown(visible: &[ScheduledEvent], now: DateTime<Utc>) -> CountdownState {
    let Some(first) = visible.first() else {
        return CountdownState::none();
    };

    if now < first.start {
        return counting(CountdownTarget::FirstUpcoming, first, first.start - now);
    }

    if now < first.start + grace_window() {
        // Pinned even when the next event's countdown would say more
        return CountdownState {
            target: CountdownTarget::FirstUpcoming,
            text: STARTED_TEXT.to_string(),
            bucket: Bucket::Active,
            remaining: Some(Duration::zero()),
            event_title: Some(first.title().to_string()),
        };
    }

    match visible[1..].iter().find(|event| event.start > now) {
        Some(next) => counting(CountdownTarget::GapToNext, next, next.start - now),
        None => CountdownState::none(),
    }
}

fn counting(target: CountdownTarget, event: &ScheduledEvent, remaining: Duration) -> CountdownState {
    // Clock skew between us and the provider can put the target in the past
    if remaining <= Duration::zero() {
        return CountdownState::none();
    }

    CountdownState {
        target,
        text: format_countdown(remaining),
        bucket: Bucket::for_remaining(remaining),
        remaining: Some(remaining),
        event_title: Some(event.title().to_string()),
    }
}

/// `HH:MM:SS` for the last minute, `HH:MM` before that
pub fn format_countdown(remaining: Duration) -> String {
    if remaining <= Duration::seconds(60) {
        format_hms(remaining)
    } else {
        format_hm(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::schedule::models::RawEvent;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn scheduled(summary: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduledEvent {
        ScheduledEvent::from_raw(&RawEvent::new(summary, start.to_rfc3339(), end.to_rfc3339()))
            .unwrap()
    }

    fn sample() -> Vec<ScheduledEvent> {
        vec![
            scheduled("A", at(10, 0, 0), at(10, 30, 0)),
            scheduled("B", at(10, 45, 0), at(11, 0, 0)),
        ]
    }

    #[test]
    fn test_counts_down_to_first_event() {
        let state = compute_countdown(&sample(), at(9, 0, 0));
        assert_eq!(state.target, CountdownTarget::FirstUpcoming);
        assert_eq!(state.remaining, Some(Duration::seconds(3600)));
        assert_eq!(state.bucket, Bucket::Far);
        assert_eq!(state.text, "01:00");
        assert_eq!(state.event_title.as_deref(), Some("A"));
    }

    #[test]
    fn test_grace_window_is_pinned() {
        for now in [at(10, 0, 0), at(10, 0, 1), at(10, 0, 59)] {
            let state = compute_countdown(&sample(), now);
            assert_eq!(state.text, "00:00:00");
            assert_eq!(state.bucket, Bucket::Active);
            assert_eq!(state.target, CountdownTarget::FirstUpcoming);
        }

        // Grace window is half-open
        let state = compute_countdown(&sample(), at(10, 1, 0));
        assert_eq!(state.target, CountdownTarget::GapToNext);
    }

    #[test]
    fn test_counts_down_to_next_event_after_grace() {
        let state = compute_countdown(&sample(), at(10, 10, 0));
        assert_eq!(state.target, CountdownTarget::GapToNext);
        assert_eq!(state.remaining, Some(Duration::seconds(2100)));
        assert_eq!(state.bucket, Bucket::Far);
        assert_eq!(state.text, "00:35");
        assert_eq!(state.event_title.as_deref(), Some("B"));
    }

    #[test]
    fn test_nothing_left_to_count() {
        let state = compute_countdown(&[], at(9, 0, 0));
        assert_eq!(state, CountdownState::none());

        // Only one event and it started long ago
        let only = vec![scheduled("A", at(10, 0, 0), at(12, 0, 0))];
        let state = compute_countdown(&only, at(11, 0, 0));
        assert_eq!(state.target, CountdownTarget::None);
        assert_eq!(state.text, "");
        assert_eq!(state.bucket, Bucket::None);
    }

    #[test]
    fn test_next_event_must_start_after_now() {
        let events = vec![
            scheduled("A", at(10, 0, 0), at(11, 0, 0)),
            scheduled("B", at(10, 5, 0), at(11, 0, 0)),
            scheduled("C", at(10, 40, 0), at(11, 0, 0)),
        ];
        let state = compute_countdown(&events, at(10, 30, 0));
        assert_eq!(state.event_title.as_deref(), Some("C"));
        assert_eq!(state.text, "00:10");
    }

    #[test]
    fn test_bucket_thresholds() {
        let first_at = |secs: i64| {
            let now = at(10, 0, 0) - Duration::seconds(secs);
            compute_countdown(&sample(), now)
        };

        assert_eq!(first_at(601).bucket, Bucket::Far);
        assert_eq!(first_at(600).bucket, Bucket::Near);
        assert_eq!(first_at(61).bucket, Bucket::Near);
        assert_eq!(first_at(60).bucket, Bucket::Imminent);
        assert_eq!(first_at(1).bucket, Bucket::Imminent);

        assert_eq!(first_at(61).text, "00:01");
        assert_eq!(first_at(60).text, "00:01:00");
        assert_eq!(first_at(5).text, "00:00:05");
    }

    #[test]
    fn test_bucket_is_the_same_for_gap_countdown() {
        let events = sample();
        // 10 minutes before B, well past A's grace window
        let state = compute_countdown(&events, at(10, 35, 0));
        assert_eq!(state.target, CountdownTarget::GapToNext);
        assert_eq!(state.bucket, Bucket::Near);

        let state = compute_countdown(&events, at(10, 44, 30));
        assert_eq!(state.bucket, Bucket::Imminent);
        assert_eq!(state.text, "00:00:30");
    }

    #[test]
    fn test_sub_second_countdown_still_renders() {
        let now = at(10, 0, 0) - Duration::milliseconds(400);
        let state = compute_countdown(&sample(), now);
        assert_eq!(state.bucket, Bucket::Imminent);
        assert_eq!(state.text, "00:00:00");
    }

    #[test]
    fn test_non_positive_countdown_renders_nothing() {
        let events = sample();
        let state = counting(CountdownTarget::GapToNext, &events[1], Duration::zero());
        assert_eq!(state, CountdownState::none());

        let state = counting(CountdownTarget::GapToNext, &events[1], Duration::seconds(-5));
        assert_eq!(state.text, "");
        assert_eq!(state.bucket, Bucket::None);
    }

    #[test]
    fn test_countdown_is_deterministic() {
        let events = sample();
        assert_eq!(
            compute_countdown(&events, at(9, 59, 30)),
            compute_countdown(&events, at(9, 59, 30))
        );
    }
}
