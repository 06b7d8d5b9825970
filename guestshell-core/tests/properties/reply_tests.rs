//! Property-based tests for interactive reply cleanup

use guestshell_core::config::DEFAULT_PROMPT;
use guestshell_core::session::{clean_reply, normalize_output};
use proptest::prelude::*;
use regex::Regex;

fn prompt() -> Regex {
    Regex::new(DEFAULT_PROMPT).unwrap()
}

fn arb_output_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 /._:-]{0,40}".prop_filter("no prompt", |l| !l.contains("><fs>"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn normalized_output_has_no_carriage_returns(raw in "[ -~\r\n\x1b]{0,200}") {
        prop_assert!(!normalize_output(&raw).contains('\r'));
    }

    #[test]
    fn reply_is_output_between_echo_and_prompt(
        command in "[a-z][a-z-]{0,10}( /[a-z]{1,8}){0,2}",
        lines in prop::collection::vec(arb_output_line(), 0..8),
    ) {
        let mut raw = format!("{command}\r\n");
        for line in &lines {
            raw.push_str(line);
            raw.push_str("\r\n");
        }
        raw.push_str("><fs> ");

        let reply = clean_reply(&prompt(), &command, &normalize_output(&raw));
        if lines.is_empty() {
            prop_assert_eq!(reply, "");
        } else {
            let mut expected = lines.join("\n");
            expected.push('\n');
            prop_assert_eq!(reply, expected);
        }
    }
}
