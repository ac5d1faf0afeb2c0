//! Recipient list parsing.
//!
//! Users routinely separate recipients with `;` even though RFC 822 only
//! knows `,`, so semicolons are folded into commas before parsing.

use lettre::message::Mailbox;

use crate::error::AddressError;

/// Parse a raw recipient string into mailboxes, preserving order.
///
/// `None`, empty and blank input yield an empty list. Empty entries between
/// separators are skipped.
pub fn normalize(raw: Option<&str>) -> Result<Vec<Mailbox>, AddressError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let list = raw.replace(';', ",");
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    split_list(&list)
        .into_iter()
        .map(|token| {
            token.parse::<Mailbox>().map_err(|source| AddressError {
                token: token.to_string(),
                source,
            })
        })
        .collect()
}

/// Split on top-level commas. Commas inside a quoted display name or an
/// angle-bracket address do not separate entries.
fn split_list(list: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut escaped = false;

    for (i, c) in list.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                tokens.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    tokens.push(&list[start..]);

    tokens
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
