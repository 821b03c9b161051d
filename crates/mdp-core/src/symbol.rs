//! Symbol normalization and validation.
//!
//! One malformed ticker must never take down a whole run: invalid entries
//! are split out with a reason and reported by the caller.

/// A symbol dropped during validation, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Normalize a raw symbol list: trim, uppercase, dedupe (first occurrence
/// wins), and reject anything outside the 3-5 alphanumeric ticker format
/// used on the Vietnamese boards (numerics are legal, e.g. A32).
pub fn normalize_symbols<I, S>(raw: I) -> (Vec<String>, Vec<RejectedSymbol>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for entry in raw {
        let normalized = entry.as_ref().trim().to_ascii_uppercase();
        if normalized.is_empty() {
            rejected.push(RejectedSymbol {
                symbol: entry.as_ref().to_string(),
                reason: "empty symbol".to_string(),
            });
            continue;
        }
        if !seen.insert(normalized.clone()) {
            continue;
        }
        if !is_valid_ticker(&normalized) {
            rejected.push(RejectedSymbol {
                symbol: normalized,
                reason: "invalid symbol format (expected 3-5 alphanumeric)".to_string(),
            });
            continue;
        }
        valid.push(normalized);
    }

    (valid, rejected)
}

fn is_valid_ticker(s: &str) -> bool {
    (3..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
