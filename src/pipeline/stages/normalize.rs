//! Text normalization for free-text attribute values.
//!
//! The vision model is inconsistent about conjunctions ("glass and steel"
//! vs "glass, steel"). Normalizing turns both into the same comma-separated,
//! lower-case list so per-attribute vocabularies are comparable.

/// Canonicalize an attribute value.
///
/// - lower-cases the text
/// - splits on commas and whitespace
/// - turns every `and` word into a separator unless it is the first or last
///   word of the whole text
/// - trims segments, drops empty ones, joins with `", "`
///
/// Word positions are counted across comma segments, so `"a,and b"` and
/// `"a, and b"` flatten alike and the result is a fixed point:
/// `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let segments: Vec<Vec<&str>> = lowered
        .split(',')
        .map(|segment| segment.split_whitespace().collect())
        .collect();
    let total: usize = segments.iter().map(Vec::len).sum();

    let mut items = Vec::new();
    let mut position = 0;
    for words in &segments {
        let mut current = Vec::new();
        for word in words {
            let interior = position > 0 && position + 1 < total;
            position += 1;
            if *word == "and" && interior {
                flush(&mut items, &mut current);
            } else {
                current.push(*word);
            }
        }
        flush(&mut items, &mut current);
    }
    items.join(", ")
}

fn flush(items: &mut Vec<String>, current: &mut Vec<&str>) {
    if !current.is_empty() {
        items.push(current.join(" "));
        current.clear();
    }
}
