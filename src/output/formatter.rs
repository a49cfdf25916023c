use std::io::IsTerminal;
use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use terminal_size::{Width, terminal_size};

use crate::scoring::{
    round_score, AssessmentRecord, Catalog, ControlScore, FamilySummary, ScoreReport,
};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with two decimals ("4.39", "5.00")
pub fn format_score(score: Decimal) -> String {
    format!("{:.2}", score)
}

/// Traffic-light coloring: green from 4.0, yellow from 2.5, red below
fn colorize_score(text: &str, score: Decimal) -> String {
    if score >= Decimal::new(4, 0) {
        text.green().to_string()
    } else if score >= Decimal::new(25, 1) {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// "Overall Score: 4.69/5.0 (94%)"
pub fn format_overall(report: &ScoreReport, use_colors: bool) -> String {
    let score = format!("{}/5.0", format_score(report.overall_score));
    let score = if use_colors {
        colorize_score(&score, report.overall_score).bold().to_string()
    } else {
        score
    };
    format!("Overall Score: {} ({}%)", score, report.percent)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format family scores, one line per assessed family:
/// "AC  Access Control  4.39/5.0  (1 controls)"
pub fn format_family_scores(families: &[FamilySummary], use_colors: bool) -> String {
    if families.is_empty() {
        return "No controls assessed yet.".to_string();
    }

    let term_width = get_terminal_width();
    let code_width = families.iter().map(|f| f.code.as_str().len()).max().unwrap_or(2);
    // code + 2 spaces + score "5.00/5.0" + 2 spaces + "(999 controls)"
    let fixed_width = code_width + 2 + 8 + 2 + 14 + 2;
    let name_width = match term_width {
        Some(width) if width > fixed_width + 10 => width - fixed_width,
        Some(_) => 20,
        None => usize::MAX,
    };
    let longest_name = families
        .iter()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(name_width);

    families
        .iter()
        .map(|family| {
            let name = truncate_name(&family.name, name_width);
            let name_padded = format!("{:<width$}", name, width = longest_name);
            let score = format!("{}/5.0", format_score(family.average));
            let controls = format!("({} controls)", family.controls);
            let code = format!("{:<width$}", family.code.as_str(), width = code_width);

            if use_colors {
                format!(
                    "{}  {}  {}  {}",
                    code.bold(),
                    name_padded,
                    colorize_score(&score, family.average),
                    controls.dimmed()
                )
            } else {
                format!("{}  {}  {}  {}", code, name_padded, score, controls)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the control list with 1-based indices:
/// " 1. AC-2 (AC)  4.39/5.0  PDR: 4.50, Implementation: 0.98  3h"
pub fn format_control_list(rows: &[(DateTime<Utc>, &AssessmentRecord)], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No controls assessed yet.".to_string();
    }

    let now = Utc::now();
    rows.iter()
        .enumerate()
        .map(|(idx, (recorded_at, record))| {
            let index_str = format!("{:>2}.", idx + 1);
            let score = format!("{}/5.0", format_score(record.final_score));
            let detail = format!(
                "PDR: {}, Implementation: {}",
                format_score(record.pdr_score),
                format_score(record.implementation_multiplier)
            );
            let age = format_age(now - *recorded_at);

            if use_colors {
                format!(
                    "{} {} ({})  {}  {}  {}",
                    index_str.dimmed(),
                    record.input.control_id.bold(),
                    record.input.family.cyan(),
                    colorize_score(&score, record.final_score),
                    detail,
                    age.dimmed()
                )
            } else {
                format!(
                    "{} {} ({})  {}  {}  {}",
                    index_str, record.input.control_id, record.input.family, score, detail, age
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line summary of a just-recorded control:
/// "Recorded AC-2 (AC): 4.39/5.0 (PDR: 4.50, Implementation: 0.98)"
pub fn format_record(record: &AssessmentRecord, use_colors: bool) -> String {
    let score = format!("{}/5.0", format_score(record.final_score));
    let score = if use_colors {
        colorize_score(&score, record.final_score)
    } else {
        score
    };
    format!(
        "Recorded {} ({}): {} (PDR: {}, Implementation: {})",
        record.input.control_id,
        record.input.family,
        score,
        format_score(record.pdr_score),
        format_score(record.implementation_multiplier)
    )
}

/// Format a previewed control score
pub fn format_control_score(score: &ControlScore, use_colors: bool) -> String {
    let final_score = format!("{}/5.0", format_score(score.final_score));
    let final_score = if use_colors {
        colorize_score(&final_score, score.final_score)
    } else {
        final_score
    };
    format!(
        "Score: {}\n  PDR: {}\n  Implementation: {}",
        final_score,
        format_score(score.pdr_score),
        format_score(score.implementation_multiplier)
    )
}

// `{:.2}` on a Decimal truncates, so round first.
fn format_weight(weight: Decimal) -> String {
    format!("{:.2}", round_score(weight))
}

/// Format the family catalog: code, weight, name
pub fn format_catalog(catalog: &Catalog, use_colors: bool) -> String {
    let code_width = catalog
        .families
        .iter()
        .map(|f| f.code.as_str().len())
        .max()
        .unwrap_or(2);

    let mut lines: Vec<String> = catalog
        .families
        .iter()
        .map(|family| {
            let code = format!("{:<width$}", family.code.as_str(), width = code_width);
            let weight = format!("{:>5}", format_weight(family.weight));
            if use_colors {
                format!("{}  {}  {}", code.bold(), weight.cyan(), family.name)
            } else {
                format!("{}  {}  {}", code, weight, family.name)
            }
        })
        .collect();
    lines.push(format!("Total weight: {}", format_weight(catalog.total_weight())));
    lines.join("\n")
}

/// Family scores as tab-separated values for scripting
/// Columns: code, name, weight, controls, average (no headers, no colors)
pub fn format_family_tsv(families: &[FamilySummary]) -> String {
    families
        .iter()
        .map(|f| {
            format!(
                "{}\t{}\t{}\t{}\t{}",
                f.code,
                f.name,
                f.weight,
                f.controls,
                format_score(f.average)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Control list as tab-separated values for scripting
/// Columns: control, family, final, pdr, multiplier, status, percentage
pub fn format_control_tsv(records: &[&AssessmentRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.input.control_id,
                r.input.family,
                format_score(r.final_score),
                format_score(r.pdr_score),
                format_score(r.implementation_multiplier),
                r.input.status,
                r.input.percentage
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{AssessmentInput, FamilyCode, ImplementationStatus, ScoreEngine};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_engine() -> ScoreEngine {
        let mut engine = ScoreEngine::new(Catalog::default());
        for (family, control, pdr, pct) in [("AC", "AC-2", (3, 3, 2), "92"), ("SC", "SC-8", (3, 3, 3), "95")] {
            engine
                .add_assessment(AssessmentInput {
                    family: FamilyCode::parse(family).unwrap(),
                    control_id: control.to_string(),
                    protect: pdr.0,
                    detect: pdr.1,
                    respond: pdr.2,
                    status: ImplementationStatus::Full,
                    percentage: dec(pct),
                })
                .unwrap();
        }
        engine
    }

    #[test]
    fn test_format_score_two_decimals() {
        assert_eq!(format_score(dec("4.5")), "4.50");
        assert_eq!(format_score(dec("5")), "5.00");
        assert_eq!(format_score(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_overall() {
        let report = sample_engine().report();
        assert_eq!(format_overall(&report, false), "Overall Score: 4.69/5.0 (94%)");
    }

    #[test]
    fn test_format_overall_empty() {
        let report = ScoreEngine::new(Catalog::default()).report();
        assert_eq!(format_overall(&report, false), "Overall Score: 0.00/5.0 (0%)");
    }

    #[test]
    fn test_format_family_scores() {
        let summaries = sample_engine().family_summaries();
        let result = format_family_scores(&summaries, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("AC  Access Control"));
        assert!(lines[0].contains("4.39/5.0"));
        assert!(lines[0].ends_with("(1 controls)"));
        assert!(lines[1].contains("4.93/5.0"));
    }

    #[test]
    fn test_format_family_scores_empty() {
        assert_eq!(format_family_scores(&[], false), "No controls assessed yet.");
    }

    #[test]
    fn test_format_control_list() {
        let engine = sample_engine();
        let now = Utc::now();
        let rows: Vec<_> = engine
            .list_assessments(None)
            .into_iter()
            .map(|r| (now - Duration::hours(3), r))
            .collect();
        let result = format_control_list(&rows, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            " 1. AC-2 (AC)  4.39/5.0  PDR: 4.50, Implementation: 0.98  3h"
        );
        assert!(lines[1].starts_with(" 2. SC-8 (SC)  4.93/5.0"));
    }

    #[test]
    fn test_format_record() {
        let engine = sample_engine();
        let records = engine.list_assessments(None);
        assert_eq!(
            format_record(records[1], false),
            "Recorded SC-8 (SC): 4.93/5.0 (PDR: 5.00, Implementation: 0.99)"
        );
    }

    #[test]
    fn test_format_control_score() {
        let score = crate::scoring::score_control(3, 3, 2, ImplementationStatus::Full, dec("92")).unwrap();
        assert_eq!(
            format_control_score(&score, false),
            "Score: 4.39/5.0\n  PDR: 4.50\n  Implementation: 0.98"
        );
    }

    #[test]
    fn test_format_catalog() {
        let result = format_catalog(&Catalog::default(), false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], "AC   0.12  Access Control");
        assert_eq!(lines[20], "Total weight: 1.14");
    }

    #[test]
    fn test_format_catalog_rounds_weights() {
        let mut catalog = Catalog::default();
        catalog.families.truncate(2);
        catalog.families[0].weight = dec("0.129");
        catalog.families[1].weight = dec("0.125");
        let result = format_catalog(&catalog, false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines[0], "AC   0.13  Access Control");
        assert_eq!(lines[1], "AT   0.13  Awareness and Training");
        assert_eq!(lines[2], "Total weight: 0.25");
    }

    #[test]
    fn test_format_family_tsv() {
        let summaries = sample_engine().family_summaries();
        let result = format_family_tsv(&summaries);
        assert_eq!(
            result.lines().next().unwrap(),
            "AC\tAccess Control\t0.12\t1\t4.39"
        );
    }

    #[test]
    fn test_format_control_tsv() {
        let engine = sample_engine();
        let result = format_control_tsv(&engine.list_assessments(None));
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split('\t').count(), 7);
        assert!(lines[1].starts_with("SC-8\tSC\t4.93\t5.00\t0.99\t"));
    }

    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("Planning", 20), "Planning");
    }

    #[test]
    fn test_truncate_name_long() {
        assert_eq!(truncate_name("Supply Chain Risk Management", 15), "Supply Chain...");
    }

    #[test]
    fn test_truncate_name_very_narrow() {
        assert_eq!(truncate_name("Maintenance", 3), "Mai");
    }

    #[test]
    fn test_format_age_hours() {
        assert_eq!(format_age(Duration::hours(3)), "3h");
    }

    #[test]
    fn test_format_age_days() {
        assert_eq!(format_age(Duration::days(2)), "2d");
    }

    #[test]
    fn test_format_age_weeks() {
        assert_eq!(format_age(Duration::weeks(2)), "2w");
    }

    #[test]
    fn test_format_age_now() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }
}
