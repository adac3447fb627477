use proptest::prelude::*;

use sse_hub::{BoundedHistory, Mode};

proptest! {
    // After any sequence of appends the history holds at most `capacity`
    // items, and exactly the most recent pushes in arrival order.
    #[test]
    fn append_retains_newest_in_order(
        capacity in 0usize..32,
        pushes in prop::collection::vec(any::<u16>(), 0..128),
    ) {
        let mut history = BoundedHistory::new(capacity);
        for p in &pushes {
            history.push(*p, Mode::Append);
            prop_assert!(history.len() <= capacity);
        }

        let start = pushes.len().saturating_sub(capacity);
        prop_assert_eq!(history.snapshot(), pushes[start..].to_vec());
    }

    // Prepend keeps the same retained set, newest-first.
    #[test]
    fn prepend_retains_newest_reversed(
        capacity in 0usize..32,
        pushes in prop::collection::vec(any::<u16>(), 0..128),
    ) {
        let mut history = BoundedHistory::new(capacity);
        for p in &pushes {
            history.push(*p, Mode::Prepend);
            prop_assert!(history.len() <= capacity);
        }

        let start = pushes.len().saturating_sub(capacity);
        let mut expected = pushes[start..].to_vec();
        expected.reverse();
        prop_assert_eq!(history.snapshot(), expected);
    }

    // Whatever mix of directions, the most recently pushed item is always
    // retained (capacity permitting) at the end it was pushed onto.
    #[test]
    fn latest_push_is_always_retained(
        capacity in 1usize..16,
        pushes in prop::collection::vec((any::<u16>(), any::<bool>()), 1..64),
    ) {
        let mut history = BoundedHistory::new(capacity);
        for (value, append) in &pushes {
            let mode = if *append { Mode::Append } else { Mode::Prepend };
            history.push(*value, mode);

            let snapshot = history.snapshot();
            let retained = if *append { snapshot.last() } else { snapshot.first() };
            prop_assert_eq!(retained, Some(value));
        }
    }

    // Evicted item plus retained items always account for every push.
    #[test]
    fn eviction_is_one_in_one_out(
        capacity in 1usize..16,
        pushes in prop::collection::vec(any::<u16>(), 0..64),
    ) {
        let mut history = BoundedHistory::new(capacity);
        let mut evicted = 0usize;
        for p in &pushes {
            if history.push(*p, Mode::Append).is_some() {
                evicted += 1;
            }
        }
        prop_assert_eq!(history.len() + evicted, pushes.len());
    }
}
