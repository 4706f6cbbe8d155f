use std::borrow::Cow;

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended when a name is cut short
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns (CJK and emoji count double).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Appends "..." when text is cut. Widths of three columns or fewer have no
/// room for the ellipsis, so as many characters as fit are returned instead.
/// Returns `Cow::Borrowed` when the string already fits.
///
/// ```
/// use shoplist::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Bread", 10), "Bread");
/// assert_eq!(truncate_to_width("Breadsticks", 8), "Bread...");
/// assert_eq!(truncate_to_width("Bread", 2), "Br");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        cut = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..cut].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    }
}

/// Strip terminal control characters and ANSI escape sequences from text that
/// came from the remote store.
///
/// Item names are typed by either user and stored in a third-party bin, so they
/// are rendered as untrusted input:
/// - CSI sequences (`\x1b[` ... final byte 0x40-0x7E) are dropped
/// - OSC sequences (`\x1b]` ... BEL or `\x1b\\`) are dropped
/// - bare ESC, DEL, C0 and C1 controls are dropped (U+009B is a one-char CSI)
/// - tab, newline and carriage return become a single space (names are one line)
///
/// Returns `Cow::Borrowed` when nothing needed cleaning.
pub fn clean_remote_text(s: &str) -> Cow<'_, str> {
    let needs_cleaning = s.chars().any(char::is_control);
    if !needs_cleaning {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\t' | '\n' | '\r' => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// Short relative age of a timestamp: "now", "12m", "3h", "5d", then "May 09".
///
/// Future timestamps (clock skew between the two users' machines) read as "now".
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();

    if secs < 60 {
        return "now".to_string();
    }
    if secs < 3600 {
        return format!("{}m", secs / 60);
    }
    if secs < 86_400 {
        return format!("{}h", secs / 3600);
    }
    if secs < 604_800 {
        return format!("{}d", secs / 86_400);
    }

    at.format("%b %d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_truncate_fits_is_borrowed() {
        let result = truncate_to_width("Milk", 10);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Milk");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        // 11 cols into 8 -> 5 cols of text + "..."
        assert_eq!(truncate_to_width("Peanut oils", 8), "Peanu...");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // 10 columns of CJK; a width of 7 leaves 4 for text
        assert_eq!(truncate_to_width("牛奶和面包", 7), "牛奶...");
    }

    #[test]
    fn test_truncate_narrow_widths() {
        assert_eq!(truncate_to_width("Eggs", 0), "");
        assert_eq!(truncate_to_width("Eggs", 1), "E");
        assert_eq!(truncate_to_width("Eggs", 3), "Egg");
        assert_eq!(truncate_to_width("牛奶", 3), "牛");
    }

    #[test]
    fn test_clean_plain_name_is_borrowed() {
        let result = clean_remote_text("Oat milk (2 cartons)");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn test_clean_strips_csi_and_osc() {
        assert_eq!(clean_remote_text("\x1b[1;31mCheese\x1b[0m"), "Cheese");
        assert_eq!(clean_remote_text("\x1b]0;pwned\x07Butter"), "Butter");
        assert_eq!(clean_remote_text("\x1b]0;pwned\x1b\\Butter"), "Butter");
        assert_eq!(clean_remote_text("Ja\x1bm"), "Jam");
    }

    #[test]
    fn test_clean_flattens_whitespace_controls() {
        assert_eq!(clean_remote_text("Rice\n\nand beans"), "Rice and beans");
        assert_eq!(clean_remote_text("Tea\tbags"), "Tea bags");
    }

    #[test]
    fn test_clean_drops_c0_and_del() {
        assert_eq!(clean_remote_text("Ap\x00pl\x7fes\x08"), "Apples");
    }

    #[test]
    fn test_clean_drops_c1_controls() {
        assert_eq!(clean_remote_text("Milk\u{9b}2J\u{85}"), "Milk2J");
        assert_eq!(clean_remote_text("Crème fraîche"), "Crème fraîche");
    }

    #[test]
    fn test_format_age_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        assert_eq!(format_age(now - Duration::seconds(5), now), "now");
        assert_eq!(format_age(now - Duration::minutes(12), now), "12m");
        assert_eq!(format_age(now - Duration::hours(3), now), "3h");
        assert_eq!(format_age(now - Duration::days(5), now), "5d");
        assert_eq!(format_age(now - Duration::days(11), now), "May 09");
    }

    #[test]
    fn test_format_age_future_is_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        assert_eq!(format_age(now + Duration::hours(2), now), "now");
    }
}
