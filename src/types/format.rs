//! Human-readable formatting for search results.

/// Format a duration in seconds as `M:SS`, or `H:MM:SS` from one hour up.
///
/// Missing, zero, negative and non-finite durations render as `0:00`.
pub fn format_duration(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|s| s.is_finite() && *s > 0.0) else {
        return "0:00".to_owned();
    };
    let total = seconds as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Format a view count with a one-decimal K/M/B suffix.
pub fn format_view_count(views: Option<u64>) -> String {
    match views {
        None | Some(0) => "0 views".to_owned(),
        Some(n) if n >= 1_000_000_000 => format!("{:.1}B views", n as f64 / 1e9),
        Some(n) if n >= 1_000_000 => format!("{:.1}M views", n as f64 / 1e6),
        Some(n) if n >= 1_000 => format!("{:.1}K views", n as f64 / 1e3),
        Some(n) => format!("{n} views"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_under_an_hour() {
        assert_eq!(format_duration(Some(212.0)), "3:32");
        assert_eq!(format_duration(Some(5.0)), "0:05");
    }

    #[test]
    fn duration_over_an_hour() {
        assert_eq!(format_duration(Some(3725.0)), "1:02:05");
    }

    #[test]
    fn duration_fraction_truncates() {
        assert_eq!(format_duration(Some(59.9)), "0:59");
    }

    #[test]
    fn duration_missing_or_non_positive() {
        assert_eq!(format_duration(None), "0:00");
        assert_eq!(format_duration(Some(0.0)), "0:00");
        assert_eq!(format_duration(Some(-3.0)), "0:00");
        assert_eq!(format_duration(Some(f64::NAN)), "0:00");
    }

    #[test]
    fn views_with_suffixes() {
        assert_eq!(format_view_count(Some(999)), "999 views");
        assert_eq!(format_view_count(Some(1_500)), "1.5K views");
        assert_eq!(format_view_count(Some(2_340_000)), "2.3M views");
        assert_eq!(format_view_count(Some(1_000_000_000)), "1.0B views");
    }

    #[test]
    fn views_missing_or_zero() {
        assert_eq!(format_view_count(None), "0 views");
        assert_eq!(format_view_count(Some(0)), "0 views");
    }
}
