/// Maps English cardinal ("one".."ten") and ordinal ("first".."tenth") words to
/// their digit string. Anything else yields `None`.
pub fn normalize(word: &str) -> Option<&'static str> {
    let digits = match word.trim().to_lowercase().as_str() {
        "one" | "first" => "1",
        "two" | "second" => "2",
        "three" | "third" => "3",
        "four" | "fourth" => "4",
        "five" | "fifth" => "5",
        "six" | "sixth" => "6",
        "seven" | "seventh" => "7",
        "eight" | "eighth" => "8",
        "nine" | "ninth" => "9",
        "ten" | "tenth" => "10",
        _ => return None,
    };
    Some(digits)
}

/// Digit string for a token that is either all digits or a known number word.
pub fn token_digits(token: &str) -> Option<String> {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return Some(token.to_string());
    }
    normalize(token).map(str::to_string)
}
