//! Property-based tests for guestfish argument quoting

use guestshell_core::command::{guestfish_quote, inner_line};
use proptest::prelude::*;

/// Reads one argument back the way guestfish's tokenizer does
fn unquote(word: &str) -> String {
    let Some(inner) = word.strip_prefix('"').and_then(|w| w.strip_suffix('"')) else {
        return word.to_string();
    };
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn arb_argument() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9/._:-]{1,30}",
        "[ -~]{0,40}",
        "[a-z \t\n\r\"'\\\\#|<>!]{0,30}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn quoted_argument_is_single_line(arg in arb_argument()) {
        let quoted = guestfish_quote(&arg);
        prop_assert!(!quoted.contains('\n'));
        prop_assert!(!quoted.contains('\r'));
    }

    #[test]
    fn quoted_argument_reads_back(arg in arb_argument()) {
        prop_assert_eq!(unquote(&guestfish_quote(&arg)), arg);
    }

    #[test]
    fn plain_words_pass_through(arg in "[a-zA-Z0-9/._:=-]{1,30}") {
        prop_assert_eq!(guestfish_quote(&arg), arg);
    }

    #[test]
    fn inner_line_keeps_argument_count(args in prop::collection::vec(arb_argument(), 0..6)) {
        let line = inner_line("write", &args);
        prop_assert!(line.starts_with("write"));
        prop_assert!(!line.contains('\n'));
        if args.iter().all(|a| !a.is_empty() && a.chars().all(|c| c.is_ascii_alphanumeric() || "/._:-".contains(c))) {
            prop_assert_eq!(line.split(' ').count(), args.len() + 1);
        }
    }
}
