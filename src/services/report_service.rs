use std::fmt::Write;

use crate::models::RankingReport;

/// Renders a ranking as the plain-text chat message.
pub fn format_report(report: &RankingReport) -> String {
    let mut msg = String::from("📊 Institutional absorption ranking\n");

    if let Some(as_of) = report.as_of() {
        let days = report.trading_days();
        if days < report.window_size as usize {
            let _ = writeln!(
                msg,
                "Window: {} trading days ending {} (only {} of {} stored)",
                days, as_of, days, report.window_size
            );
        } else {
            let _ = writeln!(msg, "Window: {} trading days ending {}", days, as_of);
        }
    }

    for (i, entry) in report.entries.iter().enumerate() {
        let _ = writeln!(
            msg,
            "{}. {} ({}) {:.2}%",
            i + 1,
            entry.name,
            entry.code,
            entry.ratio
        );
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AbsorptionEntry;
    use chrono::NaiveDate;

    fn entry(code: &str, name: &str, ratio: f64) -> AbsorptionEntry {
        AbsorptionEntry {
            code: code.to_string(),
            name: name.to_string(),
            ratio,
        }
    }

    fn dates(n: u32) -> Vec<NaiveDate> {
        (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 31 - i).unwrap())
            .collect()
    }

    #[test]
    fn test_full_window_report() {
        let report = RankingReport {
            window_dates: dates(20),
            window_size: 20,
            entries: vec![entry("2330", "TSMC", 1.5), entry("2317", "Hon Hai", -0.25)],
        };

        assert_eq!(
            format_report(&report),
            "📊 Institutional absorption ranking\n\
             Window: 20 trading days ending 2024-01-31\n\
             1. TSMC (2330) 1.50%\n\
             2. Hon Hai (2317) -0.25%\n"
        );
    }

    #[test]
    fn test_short_window_is_noted() {
        let report = RankingReport {
            window_dates: dates(3),
            window_size: 20,
            entries: vec![entry("A", "Alpha", 0.6)],
        };

        let msg = format_report(&report);

        assert!(msg.contains("Window: 3 trading days ending 2024-01-31 (only 3 of 20 stored)"));
        assert!(msg.ends_with("1. Alpha (A) 0.60%\n"));
    }
}
