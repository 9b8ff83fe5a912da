//! Turning search results into a bounded, crisis-first context string.

use carerag_core::types::SearchResult;

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Room kept free after the header when a block has to be cut short.
pub const TRUNCATION_RESERVE: usize = 10;
/// A truncated block is only worth adding with more text than this.
pub const MIN_FRAGMENT_CHARS: usize = 100;
pub const ELLIPSIS: &str = "...";

/// Query words that pull every result into the crisis partition.
pub const CRISIS_QUERY_KEYWORDS: [&str; 5] = ["suicide", "crisis", "emergency", "harm", "danger"];

/// Query words that select the crisis text when nothing was retrieved.
pub const FALLBACK_CRISIS_KEYWORDS: [&str; 7] =
    ["suicide", "crisis", "emergency", "harm", "danger", "die", "kill"];

pub const CRISIS_DEFAULT_CONTEXT: &str = "\
[Crisis Resource] If you are in immediate danger or having thoughts of self-harm:
- Call 988 (National Suicide Prevention Lifeline) - available 24/7, free and confidential
- Text HOME to 741741 (Crisis Text Line)
- Call 911 or go to your nearest emergency room
- Contact campus security immediately

You are not alone, and help is available. These feelings can be temporary, and professional help can make a difference.";

pub const GENERAL_DEFAULT_CONTEXT: &str = "\
[General Resource] Christ University provides comprehensive mental health support services.
All counseling services are free and confidential for students.
Contact your assigned counselor or visit the counseling office for support.
Remember: Seeking help is a sign of strength, not weakness.";

fn mentions_any(query: &str, keywords: &[&str]) -> bool {
    let lowered = query.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

pub fn is_crisis_query(query: &str) -> bool {
    mentions_any(query, &CRISIS_QUERY_KEYWORDS)
}

/// Fixed fallback text chosen from the query alone.
pub fn default_context(query: &str) -> &'static str {
    if mentions_any(query, &FALLBACK_CRISIS_KEYWORDS) {
        CRISIS_DEFAULT_CONTEXT
    } else {
        GENERAL_DEFAULT_CONTEXT
    }
}

/// Crisis results first, each partition keeping its incoming order.
/// A crisis query makes every result a crisis result.
pub fn prioritize(query: &str, results: Vec<SearchResult>) -> Vec<SearchResult> {
    if is_crisis_query(query) {
        return results;
    }
    let (mut crisis, other): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|r| r.metadata.is_high_priority());
    crisis.extend(other);
    crisis
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// `[Type Label] (source)`; the label defaults to `Info`.
pub fn block_header(result: &SearchResult) -> String {
    let kind = result.metadata.kind.as_deref().unwrap_or("info");
    let mut header = format!("[{}]", title_case(&kind.replace('_', " ")));
    if let Some(source) = result.metadata.source.as_deref().filter(|s| !s.is_empty()) {
        header.push_str(&format!(" ({source})"));
    }
    header
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Greedily pack `results` into at most `context_length` characters.
///
/// Blocks are joined with [`CONTEXT_SEPARATOR`], which counts against the
/// budget. The first block that does not fit is cut short when enough room
/// remains for a meaningful fragment; packing stops there either way.
pub fn pack_context(results: &[SearchResult], context_length: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut used = 0usize;
    let sep_len = char_len(CONTEXT_SEPARATOR);

    for result in results {
        if used >= context_length {
            break;
        }
        let text = result.text.trim();
        let header = block_header(result);
        let block = format!("{header}\n{text}");
        let sep = if parts.is_empty() { 0 } else { sep_len };
        let cost = sep + char_len(&block);

        if used + cost <= context_length {
            parts.push(block);
            used += cost;
            continue;
        }

        let room = context_length
            .saturating_sub(used + sep + char_len(&header) + TRUNCATION_RESERVE);
        if room > MIN_FRAGMENT_CHARS {
            let fragment: String = text.chars().take(room).collect();
            parts.push(format!("{header}\n{fragment}{ELLIPSIS}"));
        }
        break;
    }

    parts.join(CONTEXT_SEPARATOR)
}
