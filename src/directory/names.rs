//! Display-name cleanup for agency names.

/// Fixed replacements applied after title-casing, in order.
const CORRECTIONS: &[(&str, &str)] = &[
    ("Dept. ", "Department "),
    ("Dept ", "Department "),
    ("Admin.", "Administration"),
    ("Admin ", "Administration "),
    ("Natl. ", "National "),
    ("Natl ", "National "),
    ("Nat'l ", "National "),
    ("Govt. ", "Government "),
    ("Govt ", "Government "),
    ("Corp.", "Corporation"),
    ("Comm.", "Commission"),
    ("Svc.", "Service"),
    ("Svcs.", "Services"),
    ("Intl ", "International "),
    ("Fed. ", "Federal "),
    ("U.s.", "U.S."),
    (" & ", " and "),
    (" Of ", " of "),
    (" And ", " and "),
    (" The ", " the "),
    (" For ", " for "),
    (" On ", " on "),
    (" In ", " in "),
    (" To ", " to "),
    (" At ", " at "),
    (" By ", " by "),
];

/// Clean one raw directory name into its display form.
///
/// Whitespace is collapsed, shouted names (no lowercase letters, more
/// than one word) are title-cased except for acronyms, then
/// [`CORRECTIONS`] are applied.
pub fn clean_agency_name(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let shouted = words.len() > 1 && !raw.chars().any(|c| c.is_lowercase());

    let mut name = if shouted {
        words
            .iter()
            .map(|w| if is_acronym(w) { w.to_string() } else { title_case(w) })
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        words.join(" ")
    };

    for (from, to) in CORRECTIONS {
        // Matches sharing a space ("Of Of") need a second pass.
        while name.contains(from) {
            name = name.replace(from, to);
        }
    }
    name
}

/// `(HUD)`, `U.S.` and similar tokens keep their capitals.
fn is_acronym(word: &str) -> bool {
    let parenthesized = word.len() > 2 && word.starts_with('(') && word.ends_with(')');
    let dotted = word.contains('.')
        && word
            .split('.')
            .all(|part| part.chars().filter(|c| c.is_alphabetic()).count() <= 1);
    parenthesized || dotted
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
