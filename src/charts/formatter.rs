use crate::api::RankedRecord;
use crate::fmt;

/// Discord rejects nicknames longer than this.
pub const MAX_NICKNAME_CHARS: usize = 32;

const NICKNAME_LINE_CHARS: usize = 24;

pub fn format_record(record: &RankedRecord) -> String {
    fmt!(
        "#{} {} — {}",
        record.rank,
        record.name,
        format_count(record.count)
    )
}

/// `2.50M`, `15.0k`, `42`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        fmt!("{:.2}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        fmt!("{:.1}k", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// `"<prefix> • <line>"`, with the line cut to 24 characters and the whole
/// name kept within Discord's nickname limit.
pub fn nickname(prefix: &str, line: &str) -> String {
    let short = truncate_chars(line, NICKNAME_LINE_CHARS);
    let full = fmt!("{prefix} • {short}");
    if full.chars().count() > MAX_NICKNAME_CHARS {
        truncate_chars(&full, MAX_NICKNAME_CHARS - 1)
    } else {
        full
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => fmt!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
