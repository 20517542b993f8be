//! URL-fragment style anchors for section names.

/// `#` followed by the lower-cased alphanumerics of `name`, with each run
/// of anything else turned into a single `-`.
///
/// ```
/// use strata_engine::to_anchor_string;
///
/// assert_eq!(to_anchor_string("Getting Started!"), "#getting-started");
/// ```
pub fn to_anchor_string(name: &str) -> String {
    let mut anchor = String::with_capacity(name.len() + 1);
    anchor.push('#');
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && anchor.len() > 1 {
                anchor.push('-');
            }
            pending_dash = false;
            anchor.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    anchor
}
