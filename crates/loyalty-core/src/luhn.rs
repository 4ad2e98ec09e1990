//! Luhn checksum validation for order numbers

/// Returns `true` if `number` is a non-empty digit string passing the Luhn checksum.
///
/// Digits are walked right to left; every second digit starting from the
/// one before the check digit is doubled, with 9 subtracted when the result
/// exceeds 9.
///
/// ```
/// use loyalty_core::luhn::is_valid;
///
/// assert!(is_valid("79927398713"));
/// assert!(!is_valid("79927398710"));
/// ```
pub fn is_valid(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    for (i, c) in number.bytes().rev().enumerate() {
        if !c.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(c - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }

    sum % 10 == 0
}
