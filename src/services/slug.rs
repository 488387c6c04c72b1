//! URL slugs for teams, sessions, games and tournaments.

use deunicode::deunicode;
use rand::Rng;

const SUFFIX_LEN: usize = 5;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Transliterate `input` to ASCII, lowercase it, keep letters and digits,
/// and join the remaining words with single dashes.
pub fn slugify(input: &str) -> String {
    deunicode(input)
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug of `base` followed by a short random base36 suffix.
pub fn unique_slug(base: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    match slugify(base) {
        clean if clean.is_empty() => suffix,
        clean => format!("{clean}-{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Smash  Club!! Paris "), "smash-club-paris");
        assert_eq!(slugify("Rock'n'Roll"), "rock-n-roll");
        assert_eq!(slugify("équipe 2"), "equipe-2");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn non_latin_names_are_transliterated() {
        assert_eq!(slugify("Москва"), "moskva");
        assert_eq!(slugify("Çà Été"), "ca-ete");
    }

    #[test]
    fn unique_slug_appends_base36_suffix() {
        let slug = unique_slug("smash-club-2025-03-14 Friday");
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "smash-club-2025-03-14-friday");
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn unique_slug_of_blank_base_is_the_suffix() {
        assert_eq!(unique_slug("!!").len(), SUFFIX_LEN);
    }
}
