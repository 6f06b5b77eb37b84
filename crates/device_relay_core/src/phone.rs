pub const DEFAULT_COUNTRY_CODE: &str = "65";

const LOCAL_NUMBER_DIGITS: usize = 8;
const INTERNATIONAL_NUMBER_CHARS: usize = 10;

/// Prefix local 8-digit numbers with `country_code`.
pub fn with_country_code(phone: &str, country_code: &str) -> String {
    let phone = phone.trim();
    if phone.len() == LOCAL_NUMBER_DIGITS {
        format!("{country_code}{phone}")
    } else {
        phone.to_string()
    }
}

/// Bring a number into `+<country><local>` form.
///
/// Only 8-digit local numbers and 10-character numbers are rewritten; other
/// lengths pass through untouched.
pub fn normalize_phone(phone: &str, country_code: &str) -> String {
    let phone = with_country_code(phone, country_code);
    if phone.len() == INTERNATIONAL_NUMBER_CHARS && !phone.starts_with('+') {
        format!("+{phone}")
    } else {
        phone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_numbers_gain_country_code() {
        assert_eq!(
            with_country_code("12345678", DEFAULT_COUNTRY_CODE),
            "6512345678"
        );
    }

    #[test]
    fn normalizes_to_international_form() {
        assert_eq!(
            normalize_phone("12345678", DEFAULT_COUNTRY_CODE),
            "+6512345678"
        );
        assert_eq!(
            normalize_phone("6512345678", DEFAULT_COUNTRY_CODE),
            "+6512345678"
        );
        assert_eq!(
            normalize_phone("+6512345678", DEFAULT_COUNTRY_CODE),
            "+6512345678"
        );
    }

    #[test]
    fn other_lengths_pass_through() {
        assert_eq!(normalize_phone("999", DEFAULT_COUNTRY_CODE), "999");
        assert_eq!(
            normalize_phone("+14155550100", DEFAULT_COUNTRY_CODE),
            "+14155550100"
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            normalize_phone(" 12345678 ", DEFAULT_COUNTRY_CODE),
            "+6512345678"
        );
    }
}
