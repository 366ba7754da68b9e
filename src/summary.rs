use crate::relief::{Card, Dashboard, PeriodOutcome};
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;

/// Permet de customiser le rendu du récapitulatif (texte, messagerie, etc.).
pub trait SummaryRenderer {
    fn render(&self, dashboard: &Dashboard) -> String;
}

/// Récapitulatif texte à coller dans une messagerie.
///
/// Vide s'il n'y a aucun absent à afficher.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSummary;

struct Line<'a> {
    start: NaiveTime,
    time: String,
    class_name: &'a str,
    subject: &'a str,
    absent: &'a str,
}

impl<'a> Line<'a> {
    fn new(card: &'a Card, period: &'a PeriodOutcome) -> Self {
        Self {
            start: period.start_time,
            time: period.time_range(),
            class_name: &period.class_name,
            subject: &period.subject,
            absent: &card.teacher_name,
        }
    }
}

impl SummaryRenderer for TextSummary {
    fn render(&self, dashboard: &Dashboard) -> String {
        if dashboard.cards.is_empty() {
            return String::new();
        }

        let mut out = vec![
            format!("RELIEF SUMMARY — {}", format_day(dashboard.date)),
            String::new(),
            "ABSENT:".to_string(),
        ];
        out.extend(dashboard.cards.iter().map(|c| format!("• {}", c.teacher_name)));
        out.push(String::new());

        // clé : (nom sans casse, nom) pour un tri stable
        let mut relief: BTreeMap<(String, &str), Vec<Line>> = BTreeMap::new();
        let mut uncovered: Vec<Line> = Vec::new();
        for card in &dashboard.cards {
            for period in &card.periods {
                match period.covering_teacher_name() {
                    Some(name) => relief
                        .entry((name.to_lowercase(), name))
                        .or_default()
                        .push(Line::new(card, period)),
                    None => uncovered.push(Line::new(card, period)),
                }
            }
        }

        if !relief.is_empty() {
            out.push("RELIEF ASSIGNMENTS:".to_string());
            out.push(String::new());
            for ((_, name), mut lines) in relief {
                out.push(name.to_uppercase());
                lines.sort_by_key(|l| l.start);
                for l in lines {
                    out.push(format!(
                        "• {} → {} {} (replacing {})",
                        l.time, l.class_name, l.subject, l.absent
                    ));
                }
                out.push(String::new());
            }
        }

        if !uncovered.is_empty() {
            out.push("UNCOVERED:".to_string());
            uncovered.sort_by_key(|l| l.start);
            for l in uncovered {
                out.push(format!(
                    "• {} → {} {} ({}) — no relief assigned",
                    l.time, l.class_name, l.subject, l.absent
                ));
            }
        }

        out.join("\n").trim_end().to_string()
    }
}

/// `Monday, 9 March 2026`
pub fn format_day(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}
