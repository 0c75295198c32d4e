//! Folding of repeated response headers into one value per name.

use std::collections::BTreeMap;

/// Separator between folded values (RFC 2616 §4.2).
pub const FOLD_SEPARATOR: &str = ", ";

/// Join the values of each header name with `", "`.
///
/// Values keep their arrival order and names keep the order in which they
/// were first seen; nothing is sorted or re-cased.
pub fn fold_headers<'a, I>(headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut folded: Vec<(String, String)> = Vec::new();
    for (name, value) in headers {
        match folded.iter_mut().find(|(n, _)| n == name) {
            Some((_, joined)) => {
                joined.push_str(FOLD_SEPARATOR);
                joined.push_str(value);
            }
            None => folded.push((name.to_string(), value.to_string())),
        }
    }
    folded
}

/// Fold into the map stored as `response_headers`.
pub fn fold_into_map<'a, I>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fold_headers(headers).into_iter().collect()
}
