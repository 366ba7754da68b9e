use crate::relief::{Dashboard, SlotOutcome};
use anyhow::Context;
use csv::WriterBuilder;
use std::fs;
use std::path::Path;

/// Export JSON du tableau de bord (jolie mise en forme)
pub fn export_dashboard_json<P: AsRef<Path>>(path: P, dashboard: &Dashboard) -> anyhow::Result<()> {
    let path = path.as_ref();
    let s = serde_json::to_string_pretty(dashboard)?;
    fs::write(path, s).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Export CSV, une ligne par créneau:
/// header `teacher,period,start,end,class,subject,status,covering,candidates`
///
/// `candidates` liste les noms séparés par `;`.
pub fn export_dashboard_csv<P: AsRef<Path>>(path: P, dashboard: &Dashboard) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut w = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "teacher",
        "period",
        "start",
        "end",
        "class",
        "subject",
        "status",
        "covering",
        "candidates",
    ])?;
    for card in &dashboard.cards {
        for p in &card.periods {
            let ordinal = p.period_ordinal.to_string();
            let start = p.start_time.format("%H:%M").to_string();
            let end = p.end_time.format("%H:%M").to_string();
            let (status, covering, candidates) = match &p.outcome {
                SlotOutcome::Covered {
                    covering_teacher_name,
                    ..
                } => ("covered", covering_teacher_name.clone(), String::new()),
                SlotOutcome::Uncovered { candidates } => (
                    "uncovered",
                    String::new(),
                    candidates
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(";"),
                ),
            };
            w.write_record([
                card.teacher_name.as_str(),
                ordinal.as_str(),
                start.as_str(),
                end.as_str(),
                p.class_name.as_str(),
                p.subject.as_str(),
                status,
                covering.as_str(),
                candidates.as_str(),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}
