//! Quoting helpers for host shell command lines and guestfish arguments

use std::borrow::Cow;

/// Quotes a single word for a POSIX shell
///
/// Plain words are returned unchanged; anything else is single-quoted.
#[must_use]
pub fn shell_quote(word: &str) -> String {
    shell_escape::unix::escape(Cow::Borrowed(word)).into_owned()
}

/// Joins a program and its arguments into one shell-safe command line
#[must_use]
pub fn join_command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = shell_quote(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg.as_ref()));
    }
    line
}

/// Characters that force quoting of a guestfish argument
fn needs_guestfish_quoting(word: &str) -> bool {
    word.is_empty()
        || word.chars().any(|c| {
            c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '#' | '|' | '<' | '>' | '!')
        })
}

/// Quotes a single argument for the guestfish command language
///
/// guestfish splits inner commands on whitespace and understands double
/// quoted strings with C-style escapes. Plain words pass through unchanged;
/// everything else is double-quoted so the result always stays on one line.
///
/// # Example
/// ```
/// use guestshell_core::command::guestfish_quote;
///
/// assert_eq!(guestfish_quote("/etc/fstab"), "/etc/fstab");
/// assert_eq!(guestfish_quote("hello world"), "\"hello world\"");
/// assert_eq!(guestfish_quote("a\nb"), "\"a\\nb\"");
/// ```
#[must_use]
pub fn guestfish_quote(word: &str) -> String {
    if !needs_guestfish_quoting(word) {
        return word.to_string();
    }

    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Builds an inner command line from a guestfish command name and arguments
#[must_use]
pub fn inner_line<S: AsRef<str>>(name: &str, args: &[S]) -> String {
    let mut line = name.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&guestfish_quote(arg.as_ref()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote_plain_word() {
        assert_eq!(shell_quote("virt-df"), "virt-df");
        assert_eq!(shell_quote("/var/lib/images/a.qcow2"), "/var/lib/images/a.qcow2");
    }

    #[test]
    fn test_shell_quote_spaces() {
        assert_eq!(shell_quote("my disk.img"), "'my disk.img'");
    }

    #[test]
    fn test_shell_quote_single_quote() {
        let quoted = shell_quote("it's");
        assert!(quoted.starts_with('\''));
        assert!(quoted.contains("\\'"));
    }

    #[test]
    fn test_join_command_line() {
        let line = join_command_line("virt-cat", &["-a", "disk one.img", "/etc/hosts"]);
        assert_eq!(line, "virt-cat -a 'disk one.img' /etc/hosts");
    }

    #[test]
    fn test_guestfish_quote_plain() {
        assert_eq!(guestfish_quote("/dev/sda1"), "/dev/sda1");
        assert_eq!(guestfish_quote("readonly:true"), "readonly:true");
    }

    #[test]
    fn test_guestfish_quote_empty() {
        assert_eq!(guestfish_quote(""), "\"\"");
    }

    #[test]
    fn test_guestfish_quote_escapes() {
        assert_eq!(guestfish_quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(guestfish_quote("a\\b"), "\"a\\\\b\"");
        assert_eq!(guestfish_quote("line1\nline2"), "\"line1\\nline2\"");
    }

    #[test]
    fn test_inner_line() {
        assert_eq!(inner_line("mount", &["/dev/sda1", "/"]), "mount /dev/sda1 /");
        assert_eq!(
            inner_line("write", &["/etc/motd", "hello world"]),
            "write /etc/motd \"hello world\""
        );
        assert_eq!(inner_line::<&str>("df", &[]), "df");
    }
}
