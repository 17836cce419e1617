// ledgerflow-core/src/domain/cleaning/normalize.rs
//
// Text normalization applied to the join-key labels (department, category).
// Expenses and budgets go through the exact same function: gold joins on its output.

/// Title-cases `input`: a cased character following another cased character is
/// lower-cased, every other cased character is upper-cased. Digits and punctuation
/// break words (`r&d` -> `R&D`, `3rd` -> `3Rd`).
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_cased = false;

    for c in input.chars() {
        if previous_is_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_is_cased = c.is_uppercase() || c.is_lowercase();
    }

    out
}

/// Trim surrounding whitespace, then title-case.
pub fn normalize_label(raw: &str) -> String {
    title_case(raw.trim())
}
