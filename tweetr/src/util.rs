//! Small helpers shared by the subsystems: repeated strings, relative times,
//! interactive prompts and timing.

use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;

/// The datetime format Twitter returns when posting.
///
/// ```
/// # use tweetr::util::TWEET_DATETIME_FORMAT;
/// # use chrono::DateTime;
/// assert_eq!(
///     DateTime::parse_from_str("Mon Sep 05 20:30:51 +0000 2016", TWEET_DATETIME_FORMAT),
///     DateTime::parse_from_rfc3339("2016-09-05T20:30:51+00:00"),
/// );
/// ```
pub static TWEET_DATETIME_FORMAT: &str = "%a %b %d %T %z %Y";

static RELATIVE_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^in\s+([0-9]+)\s+(second|minute|hour|day|week)s?$")
        .expect("relative time regex must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelativeTimeError {
    #[error("expected \"now\" or \"in <n> <second|minute|hour|day|week>[s]\", got {0:?}")]
    Malformed(String),
    #[error("relative time {0:?} is too far in the future")]
    Overflow(String),
}

/// Runs `f`, returning how long it took together with its return value.
///
/// ```
/// # use tweetr::util::span_r;
/// # use std::time::Duration;
/// let (dur, i) = span_r(|| {
///     std::thread::sleep(Duration::from_millis(10));
///     420
/// });
/// assert_eq!(i, 420);
/// assert!(dur.num_milliseconds() >= 10);
/// ```
pub fn span_r<F, R>(f: F) -> (chrono::Duration, R)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let res = f();
    let elapsed = start.elapsed();
    (
        chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::MAX),
        res,
    )
}

/// `what`, `n` times over.
///
/// ```
/// # use tweetr::util::mul_str;
/// assert_eq!(mul_str("Го! ", 3), "Го! Го! Го! ");
/// ```
pub fn mul_str(what: &str, n: usize) -> String {
    what.repeat(n)
}

/// Parse `now` or `in <n> <unit>[s]` into the offset from the current time.
///
/// Units are `second`, `minute`, `hour`, `day` and `week`; matching is case-insensitive.
///
/// ```
/// # use tweetr::util::parse_relative_time;
/// # use std::time::Duration;
/// assert_eq!(parse_relative_time("now"), Ok(Duration::ZERO));
/// assert_eq!(parse_relative_time("in 5 MINUTES"), Ok(Duration::from_secs(5 * 60)));
/// assert!(parse_relative_time("in 23 wsfas1eeks").is_err());
/// ```
pub fn parse_relative_time(delta: &str) -> Result<Duration, RelativeTimeError> {
    let delta = delta.trim();
    if delta.eq_ignore_ascii_case("now") {
        return Ok(Duration::ZERO);
    }

    let capts = RELATIVE_TIME_REGEX
        .captures(delta)
        .ok_or_else(|| RelativeTimeError::Malformed(delta.to_owned()))?;
    let unit_secs: u64 = match capts[2].to_ascii_lowercase().as_str() {
        "second" => 1,
        "minute" => 60,
        "hour" => 60 * 60,
        "day" => 60 * 60 * 24,
        "week" => 60 * 60 * 24 * 7,
        unit => unreachable!("regex admitted unknown unit {unit:?}"),
    };
    capts[1]
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(unit_secs))
        .map(Duration::from_secs)
        .ok_or_else(|| RelativeTimeError::Overflow(delta.to_owned()))
}

/// What to do when the input runs dry before a line was read.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OnEof {
    Empty,
    Fail,
}

/// Write `label`, read one line into `out`, trimmed.
/// A line the verifier rejects is left empty.
fn ask<R, W, F>(
    input: &mut R,
    output: &mut W,
    label: &str,
    verifier: &F,
    on_eof: OnEof,
    out: &mut String,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> bool,
{
    write!(output, "{label}")?;
    output.flush()?;

    out.clear();
    if input.read_line(out)? == 0 && on_eof == OnEof::Fail {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input ended before an answer was given",
        ));
    }

    *out = out.trim().to_owned();
    if !verifier(out.as_str()) {
        out.clear();
    }
    Ok(())
}

fn label(prompt_s: &str) -> String {
    format!("{prompt_s}: ")
}

/// Ask for a string exactly `desired_len` characters long, re-prompting until one is given.
///
/// ```
/// # use std::io::Cursor;
/// # use tweetr::util::prompt_exact_len;
/// let mut input = Cursor::new(&b"123\n1234abcdef\n1234567890\n"[..]);
/// let got = prompt_exact_len(&mut input, &mut Vec::new(), "Long number",
///                            |s| s.parse::<u64>().is_ok(), 10).unwrap();
/// assert_eq!(got, "1234567890");
/// ```
pub fn prompt_exact_len<R, W, F>(
    input: &mut R,
    output: &mut W,
    prompt_s: &str,
    verifier: F,
    desired_len: usize,
) -> io::Result<String>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> bool,
{
    let label = label(prompt_s);
    let mut out = String::new();
    while out.chars().count() != desired_len {
        ask(input, output, &label, &verifier, OnEof::Fail, &mut out)?;
    }
    Ok(out)
}

/// Ask for a non-empty string, re-prompting until one is given.
pub fn prompt_nonzero_len<R, W, F>(
    input: &mut R,
    output: &mut W,
    prompt_s: &str,
    verifier: F,
) -> io::Result<String>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> bool,
{
    let label = label(prompt_s);
    let mut out = String::new();
    while out.is_empty() {
        ask(input, output, &label, &verifier, OnEof::Fail, &mut out)?;
    }
    Ok(out)
}

/// Ask once for a string of any length.
///
/// Empty, rejected and missing input all yield `None`.
pub fn prompt_any_len<R, W, F>(
    input: &mut R,
    output: &mut W,
    prompt_s: &str,
    verifier: F,
) -> io::Result<Option<String>>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> bool,
{
    let mut out = String::new();
    ask(input, output, &label(prompt_s), &verifier, OnEof::Empty, &mut out)?;
    Ok(if out.is_empty() { None } else { Some(out) })
}

/// Ask for a multiline string, re-prompting until the verifier accepts it.
///
/// A line ending in `\` continues on the next one; `\\` at the end is a literal backslash:
///
/// ```plaintext
/// Prompt: Abolish\
///         the\
///         burgeoisie!
/// ```
///
/// yields `"Abolish\nthe\nburgeoisie!"`, while `Prompt: Capitalism\\` yields `r"Capitalism\"`.
///
/// ```
/// # use std::io::Cursor;
/// # use tweetr::util::prompt_multiline;
/// let mut input = Cursor::new(&b"Line 1\\\nLine 2\\\nLine 3\n"[..]);
/// assert_eq!(prompt_multiline(&mut input, &mut Vec::new(), "Lines", |_| true).unwrap(),
///            "Line 1\nLine 2\nLine 3");
/// ```
pub fn prompt_multiline<R, W, F>(
    input: &mut R,
    output: &mut W,
    prompt_s: &str,
    verifier: F,
) -> io::Result<String>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> bool,
{
    let reprompt = mul_str(" ", label(prompt_s).chars().count());
    let mut line = String::new();

    loop {
        let mut buf = prompt_nonzero_len(input, output, prompt_s, |_| true)?;

        while buf.ends_with('\\') && !buf.ends_with(r"\\") {
            buf.pop();
            buf.push('\n');
            ask(input, output, &reprompt, &|_: &str| true, OnEof::Fail, &mut line)?;
            buf.push_str(&line);
        }
        if buf.ends_with(r"\\") {
            buf.pop();
        }

        if verifier(buf.as_str()) {
            return Ok(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};

    use super::*;

    fn input(s: &str) -> Cursor<Vec<u8>> {
        Cursor::new(s.as_bytes().to_vec())
    }

    #[test]
    fn mul_str_zero_is_empty() {
        assert_eq!(mul_str("abc", 0), "");
        assert_eq!(mul_str("", 5), "");
        assert_eq!(mul_str("ab", 2), "abab");
    }

    #[test]
    fn relative_time_units() {
        assert_eq!(parse_relative_time("now"), Ok(Duration::ZERO));
        assert_eq!(parse_relative_time("NOW"), Ok(Duration::ZERO));
        assert_eq!(parse_relative_time("in 3 seconds"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_relative_time("in 1 second"), Ok(Duration::from_secs(1)));
        assert_eq!(parse_relative_time("iN 1 hOur"), Ok(Duration::from_secs(60 * 60)));
        assert_eq!(
            parse_relative_time("in 2 daYs"),
            Ok(Duration::from_secs(60 * 60 * 24 * 2))
        );
        assert_eq!(
            parse_relative_time("in 4 weeks"),
            Ok(Duration::from_secs(60 * 60 * 24 * 7 * 4))
        );
    }

    #[test]
    fn relative_time_rejects_garbage() {
        for bad in [
            "in a23d weeks",
            "in 23 wsfas1eeks",
            "23 wsfas1eeks",
            "in 5 minutesfoo",
            "soon in 5 minutes",
            "in -1 days",
            "",
        ] {
            assert!(
                matches!(parse_relative_time(bad), Err(RelativeTimeError::Malformed(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn relative_time_overflow() {
        assert!(matches!(
            parse_relative_time("in 18446744073709551615 weeks"),
            Err(RelativeTimeError::Overflow(_))
        ));
        assert!(matches!(
            parse_relative_time("in 99999999999999999999999 seconds"),
            Err(RelativeTimeError::Overflow(_))
        ));
    }

    #[test]
    fn exact_len_reprompts_and_counts_chars() {
        let mut out = Vec::new();
        let got = prompt_exact_len(&mut input("short\nŻółwie\n"), &mut out, "Word", |_| true, 6)
            .unwrap();
        assert_eq!(got, "Żółwie");
        assert_eq!(String::from_utf8(out).unwrap(), "Word: Word: ");
    }

    #[test]
    fn exact_len_eof_is_error() {
        let err = prompt_exact_len(&mut input("1234abcdef"), &mut Vec::new(), "Long number",
                                   |s| s.parse::<u64>().is_ok(), 10)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn nonzero_len_skips_blank_and_rejected() {
        let got = prompt_nonzero_len(&mut input("\n  \nabc\n 42 \n"), &mut Vec::new(), "Number",
                                     |s| s.parse::<u64>().is_ok())
            .unwrap();
        assert_eq!(got, "42");
        assert!(prompt_nonzero_len(&mut input("123abcdef"), &mut Vec::new(), "Number",
                                   |s| s.parse::<u64>().is_ok())
            .is_err());
    }

    #[test]
    fn any_len_prompts_once() {
        assert_eq!(
            prompt_any_len(&mut input("123456789"), &mut Vec::new(), "Any", |_| true).unwrap(),
            Some("123456789".to_owned())
        );
        assert_eq!(prompt_any_len(&mut input(""), &mut Vec::new(), "Any", |_| true).unwrap(), None);
        assert_eq!(
            prompt_any_len(&mut input("123abcdef\n42\n"), &mut Vec::new(), "Number",
                           |s| s.parse::<u64>().is_ok())
                .unwrap(),
            None
        );
    }

    #[test]
    fn multiline_escaped_backslash() {
        assert_eq!(
            prompt_multiline(&mut input("Line 0\\\\\n"), &mut Vec::new(), "Escaped line", |_| true)
                .unwrap(),
            "Line 0\\"
        );
    }

    #[test]
    fn multiline_reprompt_is_aligned() {
        let mut out = Vec::new();
        let got = prompt_multiline(&mut input("a\\\nb\n"), &mut out, "Text", |_| true).unwrap();
        assert_eq!(got, "a\nb");
        assert_eq!(String::from_utf8(out).unwrap(), "Text:       ");
    }

    #[test]
    fn multiline_verifier_restarts_entry() {
        let got = prompt_multiline(&mut input("one line\nLine 1\\\nLine 2\n"), &mut Vec::new(),
                                   "2 lines", |s| s.lines().count() == 2)
            .unwrap();
        assert_eq!(got, "Line 1\nLine 2");
    }

    #[test]
    fn multiline_eof_in_continuation() {
        let err = prompt_multiline(&mut input("dangling\\\n"), &mut Vec::new(), "Text", |_| true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn span_r_returns_value() {
        let (dur, v) = span_r(|| "done");
        assert_eq!(v, "done");
        assert!(dur >= chrono::Duration::zero());
    }
}
