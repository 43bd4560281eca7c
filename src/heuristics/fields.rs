use regex::Regex;
use std::sync::LazyLock;

static MONEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+(?:\.\d+)?)").expect("valid money pattern"));

static MILEAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mi\b").expect("valid mileage pattern"));

// 12-hour clock, optional AM/PM marker
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2}:\d{2})\s?(AM|PM)?").expect("valid time pattern"));

// ---------------------------------------------------------------------------
// Scalar field extractors
// ---------------------------------------------------------------------------

/// First `$<digits>(.<digits>)?` amount anywhere in the text.
pub fn extract_money(text: &str) -> Option<f64> {
    MONEY_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
}

/// Mileage from the first line carrying a `<number> mi` mention.
pub fn extract_mileage(lines: &[&str]) -> Option<f64> {
    lines.iter().find_map(|line| {
        MILEAGE_RE
            .captures(line)
            .and_then(|c| c[1].parse::<f64>().ok())
    })
}

/// The `H:MM` part of the first clock time on the line.
pub fn extract_time_string(line: &str) -> Option<&str> {
    time_parts(line).map(|(clock, _)| clock)
}

/// `H:MM` plus the AM/PM marker, if OCR kept one.
pub(crate) fn time_parts(line: &str) -> Option<(&str, Option<&str>)> {
    let cap = TIME_RE.captures(line)?;
    let clock = cap.get(1)?.as_str();
    let marker = cap.get(2).map(|m| m.as_str());
    Some((clock, marker))
}

// ---------------------------------------------------------------------------
// Line filters
// ---------------------------------------------------------------------------

/// Lines that mention a clock time, in their original order.
pub fn time_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines
        .iter()
        .copied()
        .filter(|line| TIME_RE.is_match(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_first_match() {
        assert_eq!(extract_money("Total $12.50 earned"), Some(12.50));
        assert_eq!(extract_money("$7 guaranteed, $9.25 with tip"), Some(7.0));
        assert_eq!(extract_money("Deliver by 7:42 PM"), None);
        assert_eq!(extract_money("$ 4.00"), None);
    }

    #[test]
    fn test_mileage() {
        assert_eq!(extract_mileage(&["3.2 mi away", "other"]), Some(3.2));
        assert_eq!(extract_mileage(&["no match here"]), None);
        assert_eq!(extract_mileage(&["Pickup", "12MI total"]), Some(12.0));
    }

    #[test]
    fn test_mileage_needs_word_boundary() {
        assert_eq!(extract_mileage(&["4 miles", "2.5 mi"]), Some(2.5));
        assert_eq!(extract_mileage(&["5 minutes"]), None);
    }

    #[test]
    fn test_time_string() {
        assert_eq!(extract_time_string("Deliver by 7:42 PM"), Some("7:42"));
        assert_eq!(extract_time_string("12:05am"), Some("12:05"));
        assert_eq!(extract_time_string("9:07"), Some("9:07"));
        assert_eq!(extract_time_string("no clock here"), None);
    }

    #[test]
    fn test_time_parts_marker_is_optional() {
        assert_eq!(time_parts("7:42 pm"), Some(("7:42", Some("pm"))));
        assert_eq!(time_parts("7:42"), Some(("7:42", None)));
    }

    #[test]
    fn test_time_lines_keep_order() {
        let lines = ["6:58", "$8.50", "Deliver by 7:31 PM", "2.4 mi", "Arrive 7:10"];
        assert_eq!(
            time_lines(&lines),
            vec!["6:58", "Deliver by 7:31 PM", "Arrive 7:10"]
        );
    }
}
