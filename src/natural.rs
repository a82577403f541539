use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    static ref CHUNK_PATTERN: Regex = Regex::new(r"[0-9]+|[^0-9]+").unwrap();
}

/// Natural order: digit runs compare by numeric value, everything else byte-wise.
/// `clip10` sorts after `clip9`.
pub fn compare(a: &str, b: &str) -> Ordering {
    compare_with(a, b, false)
}

/// Natural order that also ignores letter case, used for display ordering.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    compare_with(a, b, true)
}

fn compare_with(a: &str, b: &str, fold_case: bool) -> Ordering {
    let mut left = CHUNK_PATTERN.find_iter(a);
    let mut right = CHUNK_PATTERN.find_iter(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_chunk(x.as_str(), y.as_str(), fold_case);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_chunk(x: &str, y: &str, fold_case: bool) -> Ordering {
    let x_numeric = x.starts_with(|c: char| c.is_ascii_digit());
    let y_numeric = y.starts_with(|c: char| c.is_ascii_digit());

    if x_numeric && y_numeric {
        let x_trimmed = x.trim_start_matches('0');
        let y_trimmed = y.trim_start_matches('0');
        // Equal-length digit strings compare lexically as numbers; leading zeros break ties.
        return x_trimmed
            .len()
            .cmp(&y_trimmed.len())
            .then_with(|| x_trimmed.cmp(y_trimmed))
            .then_with(|| x.len().cmp(&y.len()));
    }

    if fold_case {
        x.to_lowercase().cmp(&y.to_lowercase())
    } else {
        x.cmp(y)
    }
}
