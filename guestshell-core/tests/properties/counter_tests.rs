//! Property-based tests for the open session counter

use guestshell_core::SessionCounter;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn counter_matches_saturating_model(ops in prop::collection::vec(any::<bool>(), 0..60)) {
        let counter = SessionCounter::new();
        let mut model: usize = 0;
        for open in ops {
            let reported = if open {
                model += 1;
                counter.increment()
            } else {
                model = model.saturating_sub(1);
                counter.decrement()
            };
            prop_assert_eq!(reported, model);
            prop_assert_eq!(counter.get(), model);
        }
    }

    #[test]
    fn clones_share_the_count(opens in 0usize..20) {
        let counter = SessionCounter::new();
        let clone = counter.clone();
        for _ in 0..opens {
            clone.increment();
        }
        prop_assert_eq!(counter.get(), opens);
        prop_assert!(counter.same_as(&clone));
        prop_assert!(!counter.same_as(&SessionCounter::new()));
    }
}
