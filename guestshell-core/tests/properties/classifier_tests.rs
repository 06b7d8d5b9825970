//! Property-based tests for output classification

use guestshell_core::session::{ErrorMarkerClassifier, OutputClassifier};
use proptest::prelude::*;

fn arb_clean_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 /._:-]{0,60}".prop_filter("no marker", |l| !l.contains("libguestfs"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn clean_output_is_success(lines in prop::collection::vec(arb_clean_line(), 0..10)) {
        let output = lines.join("\n");
        prop_assert_eq!(ErrorMarkerClassifier::default().classify(&output), 0);
    }

    #[test]
    fn marker_anywhere_is_failure(
        before in prop::collection::vec(arb_clean_line(), 0..5),
        after in prop::collection::vec(arb_clean_line(), 0..5),
        message in "[a-z ]{0,30}",
    ) {
        let mut lines = before;
        lines.push(format!("libguestfs: error: {message}"));
        lines.extend(after);
        let output = lines.join("\n");

        let classifier = ErrorMarkerClassifier::default();
        prop_assert_eq!(classifier.classify(&output), 1);
        let first = classifier.first_error_line(&output);
        prop_assert!(first.is_some_and(|l| l.starts_with("libguestfs: error:")));
    }

    #[test]
    fn classification_is_binary(output in "[ -~\n]{0,200}") {
        let status = ErrorMarkerClassifier::default().classify(&output);
        prop_assert!(status == 0 || status == 1);
    }
}
