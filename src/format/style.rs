//! Colours, emoji and Italian date text for the mobile UI

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

const WEEKDAYS: [&str; 7] = [
    "Lunedì",
    "Martedì",
    "Mercoledì",
    "Giovedì",
    "Venerdì",
    "Sabato",
    "Domenica",
];

const MONTHS: [&str; 12] = [
    "gennaio",
    "febbraio",
    "marzo",
    "aprile",
    "maggio",
    "giugno",
    "luglio",
    "agosto",
    "settembre",
    "ottobre",
    "novembre",
    "dicembre",
];

const CATEGORY_COLORS: [(&str, &str); 8] = [
    ("Lavoro", "#3B82F6"),
    ("Personale", "#8B5CF6"),
    ("Cibo", "#EF4444"),
    ("Studio", "#F59E0B"),
    ("Sport", "#10B981"),
    ("Famiglia", "#EC4899"),
    ("Salute", "#14B8A6"),
    ("Spesa", "#F97316"),
];

/// Fallback palette for user-defined categories
const FALLBACK_COLORS: [&str; 8] = [
    "#6366F1", "#0EA5E9", "#22C55E", "#EAB308", "#F43F5E", "#A855F7", "#06B6D4", "#84CC16",
];

const DEFAULT_PRIORITY_COLOR: &str = "#6B7280";

/// "2025-12-15T18:00:00+00:00" -> "Lunedì 15 dicembre, 18:00"
///
/// Accepts RFC 3339 and naive ISO timestamps. Empty input gives an empty
/// string; anything unparseable is returned unchanged.
pub fn format_date_for_mobile(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }

    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"));

    match parsed {
        Ok(dt) => format!(
            "{} {} {}, {:02}:{:02}",
            WEEKDAYS[dt.weekday().num_days_from_monday() as usize],
            dt.day(),
            MONTHS[dt.month0() as usize],
            dt.hour(),
            dt.minute()
        ),
        Err(_) => value.to_string(),
    }
}

pub fn get_priority_emoji(priority: &str) -> &'static str {
    match priority {
        "Alta" => "⚡",
        _ => "",
    }
}

pub fn get_priority_color(priority: &str) -> &'static str {
    match priority {
        "Alta" => "#EF4444",
        "Media" => "#F59E0B",
        "Bassa" => "#10B981",
        _ => DEFAULT_PRIORITY_COLOR,
    }
}

/// Known categories have fixed colours; others hash into a stable palette
pub fn get_category_color(category: &str) -> &'static str {
    if let Some(&(_, color)) = CATEGORY_COLORS.iter().find(|&&(name, _)| name == category) {
        return color;
    }

    let hash = category
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    FALLBACK_COLORS[hash as usize % FALLBACK_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_for_mobile() {
        let result = format_date_for_mobile("2025-12-15T18:00:00+00:00");
        assert_eq!(result, "Lunedì 15 dicembre, 18:00");
        assert!(result.to_lowercase().contains("dicembre"));

        assert_eq!(format_date_for_mobile(""), "");
    }

    #[test]
    fn test_format_naive_dates() {
        assert_eq!(format_date_for_mobile("2025-01-03T09:05:00"), "Venerdì 3 gennaio, 09:05");
        assert_eq!(format_date_for_mobile("2025-08-10 07:30:00"), "Domenica 10 agosto, 07:30");
    }

    #[test]
    fn test_keeps_offset_local_time() {
        assert_eq!(
            format_date_for_mobile("2025-12-15T18:00:00+01:00"),
            "Lunedì 15 dicembre, 18:00"
        );
    }

    #[test]
    fn test_unparseable_date_passthrough() {
        assert_eq!(format_date_for_mobile("domani"), "domani");
    }

    #[test]
    fn test_get_priority_emoji() {
        assert_eq!(get_priority_emoji("Alta"), "⚡");
        assert_eq!(get_priority_emoji("Media"), "");
        assert_eq!(get_priority_emoji("Bassa"), "");
    }

    #[test]
    fn test_get_priority_color() {
        assert_eq!(get_priority_color("Alta"), "#EF4444");
        assert_eq!(get_priority_color("Media"), "#F59E0B");
        assert_eq!(get_priority_color("Bassa"), "#10B981");
        assert_eq!(get_priority_color("Urgentissima"), DEFAULT_PRIORITY_COLOR);
    }

    #[test]
    fn test_get_category_color() {
        assert_eq!(get_category_color("Lavoro"), "#3B82F6");
        assert_eq!(get_category_color("Personale"), "#8B5CF6");

        let color1 = get_category_color("CustomCategory");
        let color2 = get_category_color("CustomCategory");
        assert_eq!(color1, color2);
        assert!(color1.starts_with('#'));
        assert!(FALLBACK_COLORS.contains(&color1));
    }
}
