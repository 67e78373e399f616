//! Destination phone-number normalization.
//!
//! The messaging API expects bare digits with a country code and no `+`.
//! The default rule here — strip separators, trust an explicit `+` prefix,
//! otherwise drop leading zeros and prepend a configured country code — is
//! a narrow locale heuristic, so it lives behind a trait and can be swapped
//! per deployment.

// ---------------------------------------------------------------------------
// NumberNormalizer
// ---------------------------------------------------------------------------

/// Strategy for turning user-entered phone numbers into API destinations.
pub trait NumberNormalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> String;
}

// ---------------------------------------------------------------------------
// DefaultNormalizer
// ---------------------------------------------------------------------------

/// Separator-stripping normalizer with a configured default country code.
///
/// # Example
/// ```rust
/// use medbridge::delivery::{DefaultNormalizer, NumberNormalizer};
///
/// let normalizer = DefaultNormalizer::new("92");
/// assert_eq!(normalizer.normalize("0300-1234567"), "923001234567");
/// assert_eq!(normalizer.normalize("+92 300 1234567"), "923001234567");
/// ```
pub struct DefaultNormalizer {
    country_code: String,
}

impl DefaultNormalizer {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
        }
    }
}

impl NumberNormalizer for DefaultNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let explicit_country = trimmed.starts_with('+');

        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

        if explicit_country {
            return digits;
        }

        let national = digits.trim_start_matches('0');
        format!("{}{}", self.country_code, national)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> DefaultNormalizer {
        DefaultNormalizer::new("92")
    }

    #[test]
    fn strips_spaces_dashes_and_parens() {
        assert_eq!(normalizer().normalize("(0300) 123-4567"), "923001234567");
    }

    #[test]
    fn explicit_plus_prefix_is_trusted_verbatim() {
        assert_eq!(normalizer().normalize("+44 7700 900123"), "447700900123");
    }

    #[test]
    fn leading_zero_is_replaced_by_country_code() {
        assert_eq!(normalizer().normalize("03001234567"), "923001234567");
    }

    #[test]
    fn bare_national_number_gets_country_code() {
        assert_eq!(normalizer().normalize("3001234567"), "923001234567");
    }

    #[test]
    fn different_country_code_is_honoured() {
        let n = DefaultNormalizer::new("1");
        assert_eq!(n.normalize("555-0100"), "15550100");
    }
}
