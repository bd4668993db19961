use super::operator::{IN, NOT_IN};

/// Split a filter string into clauses on unquoted whitespace
///
/// Quoted segments (`'...'` or `"..."`, backslash escapes honored) and
/// parenthesized value lists are kept whole, and the word operators
/// ` not in ` / ` in ` are treated as part of the clause they sit in, so
/// `state not in (running, pending)` stays a single clause. An unterminated
/// quote folds the rest of the input into the final clause.
pub fn split_respecting_quotes(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0;
    let mut resume_at = 0;

    for (i, c) in s.char_indices() {
        if i < resume_at {
            continue;
        }
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '\'' | '"' => match quote {
                None => quote = Some(c),
                Some(open) if open == c => quote = None,
                Some(_) => {}
            },
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth = depth.saturating_sub(1),
            ' ' | '\t' if quote.is_none() && depth == 0 => {
                let rest = &s[i..];
                if has_content(&s[start..i]) {
                    if let Some(op) = [NOT_IN, IN].into_iter().find(|op| rest.starts_with(*op)) {
                        resume_at = skip_blanks(s, i + op.len());
                        continue;
                    }
                }
                push_part(&mut parts, &s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    push_part(&mut parts, &s[start..]);
    parts
}

/// Byte index of the first occurrence of `needle` outside any quoted span
pub(crate) fn find_unquoted(haystack: &str, needle: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in haystack.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if quote.is_none() && haystack[i..].starts_with(needle) {
            return Some(i);
        }
        match c {
            '\\' => escaped = true,
            '\'' | '"' => match quote {
                None => quote = Some(c),
                Some(open) if open == c => quote = None,
                Some(_) => {}
            },
            _ => {}
        }
    }
    None
}

fn has_content(part: &str) -> bool {
    !part.trim().is_empty()
}

fn skip_blanks(s: &str, from: usize) -> usize {
    from + s[from..].len() - s[from..].trim_start_matches([' ', '\t']).len()
}

fn push_part<'a>(parts: &mut Vec<&'a str>, part: &'a str) {
    let part = part.trim();
    if !part.is_empty() {
        parts.push(part);
    }
}
