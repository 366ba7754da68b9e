#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use relief::{
    io,
    model::{AssignmentId, School, SickReportId, SlotId, TeacherId, TeacherKind, WeekTag},
    parity::{iso_week_number, week_parity, Parity},
    relief::{DeskOptions, NewAssignment, ReliefDesk, SlotOutcome, SlotSpec},
    storage::JsonStorage,
    summary::{SummaryRenderer, TextSummary},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de gestion des remplacements (stockage JSON local)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de l'établissement
    #[arg(long, global = true, default_value = "school.json")]
    school: String,

    /// Durée maximale d'une absence déclarée (jours)
    #[arg(long, global = true, default_value_t = 14)]
    max_sick_days: u32,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ajouter un enseignant
    AddTeacher {
        #[arg(long)]
        name: String,
        /// Remplaçant permanent (sans emploi du temps)
        #[arg(long)]
        relief: bool,
    },

    /// Supprimer un enseignant (cours, absences et remplacements inclus)
    RemoveTeacher {
        #[arg(long)]
        name: String,
    },

    /// Ajouter une période
    AddPeriod {
        #[arg(long)]
        ordinal: u8,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM
        #[arg(long)]
        end: String,
    },

    /// Créer ou modifier un cours
    SetSlot {
        #[arg(long)]
        teacher: String,
        /// 1 = lundi … 5 = vendredi
        #[arg(long)]
        day: u8,
        /// Numéro de période
        #[arg(long)]
        period: u8,
        /// all | odd | even
        #[arg(long, default_value = "all")]
        tag: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        subject: String,
    },

    /// Déclarer une absence
    ReportSick {
        #[arg(long)]
        teacher: String,
        /// YYYY-MM-DD
        #[arg(long)]
        start: String,
        #[arg(long, default_value_t = 1)]
        days: u32,
    },

    /// Afficher le tableau de bord d'une journée
    Dashboard {
        /// YYYY-MM-DD (défaut : aujourd'hui)
        #[arg(long)]
        date: Option<String>,
        /// Forcer la parité : odd | even
        #[arg(long)]
        week: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
        /// Imprimer le récapitulatif texte au lieu du détail
        #[arg(long)]
        summary: bool,
    },

    /// Affecter un remplaçant à un créneau
    Assign {
        #[arg(long)]
        report: String,
        #[arg(long)]
        slot: String,
        /// Nom du remplaçant
        #[arg(long)]
        with: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Annuler un remplacement
    Unassign {
        #[arg(long)]
        id: String,
    },

    /// Lister les enseignants (par nom)
    Teachers,

    /// Lister les périodes
    Periods,

    /// Emploi du temps d'un enseignant
    Timetable {
        #[arg(long)]
        teacher: String,
        /// Limiter à une étiquette : all | odd | even
        #[arg(long)]
        tag: Option<String>,
    },

    /// Parité de la semaine d'une date
    Parity {
        /// YYYY-MM-DD (défaut : aujourd'hui)
        #[arg(long)]
        date: Option<String>,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").with_context(|| format!("invalid time: {raw}"))
}

fn date_or_today(raw: Option<String>) -> Result<NaiveDate> {
    match raw {
        Some(raw) => parse_date(&raw),
        None => Ok(Local::now().date_naive()),
    }
}

fn teacher_id(school: &School, name: &str) -> Result<TeacherId> {
    school
        .find_teacher_by_name(name)
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow::anyhow!("unknown teacher: {name}"))
}

fn day_name(day: u8) -> &'static str {
    match day {
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        _ => "?",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let opts = DeskOptions {
        max_sick_days: cli.max_sick_days,
        ..DeskOptions::default()
    };
    let desk = ReliefDesk::open(JsonStorage::open(&cli.school)?, opts)?;

    let code = match cli.cmd {
        Commands::AddTeacher { name, relief } => {
            let kind = if relief {
                TeacherKind::PermanentRelief
            } else {
                TeacherKind::Regular
            };
            let t = desk.add_teacher(&name, kind)?;
            println!("{}", t.id);
            0
        }
        Commands::RemoveTeacher { name } => {
            let id = teacher_id(&desk.snapshot()?, &name)?;
            desk.remove_teacher(&id)?;
            0
        }
        Commands::AddPeriod {
            ordinal,
            start,
            end,
        } => {
            let p = desk.add_period(ordinal, parse_time(&start)?, parse_time(&end)?)?;
            println!("{}", p.id);
            0
        }
        Commands::SetSlot {
            teacher,
            day,
            period,
            tag,
            class,
            subject,
        } => {
            let school = desk.snapshot()?;
            let teacher_id = teacher_id(&school, &teacher)?;
            let period_id = school
                .find_period_by_ordinal(period)
                .map(|p| p.id.clone())
                .ok_or_else(|| anyhow::anyhow!("unknown period: {period}"))?;
            let tag: WeekTag = tag.parse().map_err(anyhow::Error::msg)?;
            let slot = desk.set_slot(SlotSpec {
                teacher_id,
                day,
                period_id,
                tag,
                class_name: class,
                subject,
            })?;
            println!("{}", slot.id);
            0
        }
        Commands::ReportSick {
            teacher,
            start,
            days,
        } => {
            let id = teacher_id(&desk.snapshot()?, &teacher)?;
            let report = desk.report_sick(&id, parse_date(&start)?, days)?;
            println!("{}", report.id);
            0
        }
        Commands::Dashboard {
            date,
            week,
            out_json,
            out_csv,
            summary,
        } => {
            let date = date_or_today(date)?;
            let parity = week
                .map(|w| w.parse::<Parity>().map_err(anyhow::Error::msg))
                .transpose()?;
            let dashboard = desk.dashboard(date, parity)?;

            if let Some(path) = out_json {
                io::export_dashboard_json(path, &dashboard)?;
            }
            if let Some(path) = out_csv {
                io::export_dashboard_csv(path, &dashboard)?;
            }

            if summary {
                println!("{}", TextSummary.render(&dashboard));
            } else if dashboard.is_weekend {
                println!("{date}: no school");
            } else {
                let week = dashboard
                    .week_type
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                println!(
                    "{date} ({week}) | {} uncovered | {} covered",
                    dashboard.total_uncovered, dashboard.total_covered
                );
                for card in &dashboard.cards {
                    println!("{} | report {}", card.teacher_name, card.sick_report_id);
                    for p in &card.periods {
                        let detail = match &p.outcome {
                            SlotOutcome::Covered {
                                assignment_id,
                                covering_teacher_name,
                                ..
                            } => format!("covered by {covering_teacher_name} ({assignment_id})"),
                            SlotOutcome::Uncovered { candidates } => {
                                let names: Vec<&str> =
                                    candidates.iter().map(|c| c.name.as_str()).collect();
                                format!("uncovered → {}", names.join(", "))
                            }
                        };
                        println!(
                            "  P{} {} {} {} | slot {} | {}",
                            p.period_ordinal,
                            p.time_range(),
                            p.class_name,
                            p.subject,
                            p.slot_id,
                            detail
                        );
                    }
                }
            }

            // Code 2 = WARNING/INCOMPLETE
            if dashboard.total_uncovered > 0 {
                2
            } else {
                0
            }
        }
        Commands::Assign {
            report,
            slot,
            with,
            date,
        } => {
            let covering = teacher_id(&desk.snapshot()?, &with)?;
            let assignment = desk.create_assignment(NewAssignment {
                sick_report_id: SickReportId::new(report),
                slot_id: SlotId::new(slot),
                covering_teacher_id: covering,
                date: parse_date(&date)?,
            })?;
            println!("{}", assignment.id);
            0
        }
        Commands::Unassign { id } => {
            desk.delete_assignment(&AssignmentId::new(id))?;
            0
        }
        Commands::Teachers => {
            for t in desk.teachers()? {
                println!("{} | {} | {}", t.name, t.kind, t.id);
            }
            0
        }
        Commands::Periods => {
            for p in desk.periods()? {
                println!("P{} {} | {}", p.ordinal, p.time_range(), p.id);
            }
            0
        }
        Commands::Timetable { teacher, tag } => {
            let id = teacher_id(&desk.snapshot()?, &teacher)?;
            let tag = tag
                .map(|t| t.parse::<WeekTag>().map_err(anyhow::Error::msg))
                .transpose()?;
            for e in desk.timetable(&id, tag)? {
                println!(
                    "{} P{} {} {} {} [{}] | slot {}",
                    day_name(e.slot.day),
                    e.period.ordinal,
                    e.period.time_range(),
                    e.slot.class_name,
                    e.slot.subject,
                    e.slot.tag,
                    e.slot.id
                );
            }
            0
        }
        Commands::Parity { date } => {
            let date = date_or_today(date)?;
            println!(
                "{date}: week {} ({})",
                iso_week_number(date),
                week_parity(date)
            );
            0
        }
    };

    std::process::exit(code);
}
