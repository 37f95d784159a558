use std::borrow::Cow;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static EMOJI_REPLACER: LazyLock<gh_emoji::Replacer> = LazyLock::new(gh_emoji::Replacer::new);

/// Expand GitHub emoji shortcodes (e.g. `:tada:`) in the given text.
///
/// Returns `Cow::Borrowed` when no shortcodes are found, avoiding allocation.
pub(crate) fn expand_emoji(text: &str) -> Cow<'_, str> {
    EMOJI_REPLACER.replace_all(text)
}

/// Format a datetime according to the configured date format.
///
/// If `date_format` is `"relative"` (or empty), displays the age relative to
/// `now` like `"2h"`, `"3d"`, `"1w"`. Otherwise, uses `strftime`-style
/// formatting.
pub(crate) fn format_date(dt: &DateTime<Utc>, date_format: &str, now: DateTime<Utc>) -> String {
    if date_format.is_empty() || date_format == "relative" {
        format_relative_time(dt, now)
    } else {
        dt.format(date_format).to_string()
    }
}

fn format_relative_time(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    let minutes = duration.num_minutes();
    if minutes < 1 {
        return "now".to_owned();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = duration.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }

    let days = duration.num_days();
    if days < 7 {
        return format!("{days}d");
    }
    if days < 30 {
        return format!("{}w", days / 7);
    }
    if days < 365 {
        return format!("{}mo", days / 30);
    }

    format!("{}y", days / 365)
}

/// Cut `text` to at most `max_width` terminal columns, ending with `…` when
/// something was dropped.
pub(crate) fn truncate_to_width(text: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(text) <= max_width {
        return Cow::Borrowed(text);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }
    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    Cow::Owned(out)
}

/// Right-pad `text` with spaces to `width` terminal columns.
pub(crate) fn pad_to_width(text: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(text);
    let mut out = text.to_owned();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(w)));
    out
}
