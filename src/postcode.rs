//! UK postcode normalisation.
//!
//! Validation is deliberately permissive: it checks length and rough
//! shape only, with no outward-code whitelist, so the site form never
//! rejects a postcode the lookup service might still recognise.

/// Shortest cleaned postcode accepted (e.g. `W21JB`).
const MIN_LEN: usize = 5;
/// Longest cleaned postcode accepted.
const MAX_LEN: usize = 8;
/// The inward code is always the last three characters.
const INWARD_LEN: usize = 3;

/// Strip all whitespace and upper-case.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Whether `raw` looks like a UK postcode.
///
/// True iff the normalized form is 5-8 characters long, has a letter in
/// its first two characters and contains at least one digit.
pub fn is_valid(raw: &str) -> bool {
    let cleaned: Vec<char> = normalize(raw).chars().collect();
    if cleaned.len() < MIN_LEN || cleaned.len() > MAX_LEN {
        return false;
    }

    let letter_up_front = cleaned.iter().take(2).any(|c| c.is_alphabetic());
    let has_digit = cleaned.iter().any(|c| c.is_ascii_digit());
    letter_up_front && has_digit
}

/// Canonical `"<outward> <inward>"` form.
///
/// Inputs shorter than five characters are incomplete and come back
/// normalized but without a space.
pub fn format(raw: &str) -> String {
    let cleaned: Vec<char> = normalize(raw).chars().collect();
    let split = match cleaned.len() {
        n if n < MIN_LEN => return cleaned.into_iter().collect(),
        5 => 2,
        6 => 3,
        n => n - INWARD_LEN,
    };

    let outward: String = cleaned[..split].iter().collect();
    let inward: String = cleaned[split..].iter().collect();
    format!("{outward} {inward}")
}
