//! Identifier casing helpers.

use convert_case::{Case, Casing};

/// Splits on every non-alphanumeric character as well as on case and digit
/// boundaries, then joins as camelCase: `bind:tap` -> `bindTap`,
/// `scroll-view` -> `scrollView`.
pub fn camel_case(input: &str) -> String {
    let spaced: String = input
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = spaced.split_whitespace().collect();
    if words.is_empty() {
        return String::new();
    }
    words.join(" ").to_case(Case::Camel)
}

/// First character uppercased, remainder camel-cased: `scroll-view` ->
/// `ScrollView`, `view` -> `View`.
pub fn pascal_tag(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&camel_case(chars.as_str()));
            out
        }
        None => String::new(),
    }
}
