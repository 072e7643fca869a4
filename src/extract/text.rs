use html_escape::decode_html_entities;

/// Normalizes scraped text
///
/// HTML entities are decoded (repeatedly, so double-escaped text settles),
/// then CR, LF, tab and non-breaking space become plain spaces, runs of
/// spaces collapse to one, and the result is trimmed.
///
/// # Examples
///
/// ```
/// use shelf_sounder::extract::clean;
///
/// assert_eq!(clean("a\n\tb  c"), "a b c");
/// assert_eq!(clean("Salt &amp; Trace\r\n"), "Salt & Trace");
/// ```
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut decoded = text.to_string();
    while decoded.contains('&') {
        let next = decode_html_entities(&decoded).into_owned();
        if next == decoded {
            break;
        }
        decoded = next;
    }

    let mut out = String::with_capacity(decoded.len());
    let mut last_was_space = false;
    for c in decoded.chars() {
        let c = match c {
            '\r' | '\n' | '\t' | '\u{a0}' => ' ',
            other => other,
        };

        if c == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        out.push(c);
    }

    out.trim().to_string()
}

/// `clean` over an optional value; absent text becomes empty
pub fn clean_opt(text: Option<&str>) -> String {
    text.map(clean).unwrap_or_default()
}
