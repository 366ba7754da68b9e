use crate::model::{
    AssignmentId, Period, PeriodId, SickReportId, SlotId, Teacher, TeacherId, TeacherKind,
    TimetableSlot, WeekTag,
};
use crate::parity::Parity;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Options du bureau des remplacements
#[derive(Debug, Clone, Copy)]
pub struct DeskOptions {
    /// Durée maximale d'une déclaration d'absence, en jours.
    pub max_sick_days: u32,
    /// Réutiliser un tableau de bord tant qu'aucune mutation n'a eu lieu.
    pub cache_dashboards: bool,
}

impl Default for DeskOptions {
    fn default() -> Self {
        Self {
            max_sick_days: 14,
            cache_dashboards: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Teacher,
    Period,
    Slot,
    SickReport,
    Assignment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Teacher => "teacher",
            EntityKind::Period => "period",
            EntityKind::Slot => "timetable slot",
            EntityKind::SickReport => "sick report",
            EntityKind::Assignment => "relief assignment",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Le remplaçant couvre déjà une autre classe à cette période, ce jour-là.
    TeacherBusy {
        teacher: TeacherId,
        date: NaiveDate,
        period: PeriodId,
        existing: AssignmentId,
    },
    /// Le créneau a déjà un remplaçant pour cette date.
    SlotCovered {
        slot: SlotId,
        date: NaiveDate,
        existing: AssignmentId,
    },
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::TeacherBusy {
                teacher,
                date,
                period,
                existing,
            } => write!(
                f,
                "teacher {teacher} already covers period {period} on {date} (assignment {existing})"
            ),
            ConflictKind::SlotCovered {
                slot,
                date,
                existing,
            } => write!(
                f,
                "slot {slot} is already covered on {date} (assignment {existing})"
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReliefError {
    #[error("conflict: {0}")]
    Conflict(ConflictKind),
    #[error("unknown {kind}: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("invalid assignment: {0}")]
    InvalidAssignment(&'static str),
    #[error("invalid sick report: {0}")]
    InvalidSickReport(&'static str),
    #[error("invalid teacher: {0}")]
    InvalidTeacher(&'static str),
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("invalid timetable slot: {0}")]
    InvalidSlot(String),
    #[error("duplicate period ordinal: {0}")]
    DuplicatePeriod(u8),
    #[error("teacher {teacher} already has a {existing:?} slot on day {day}, period {period}; {requested:?} cannot coexist with it")]
    TagClash {
        teacher: TeacherId,
        day: u8,
        period: PeriodId,
        existing: WeekTag,
        requested: WeekTag,
    },
    #[error("school store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReliefError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        ReliefError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ReliefError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReliefError::NotFound { .. })
    }
}

/// Demande de remplacement émise par un KP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub sick_report_id: SickReportId,
    pub slot_id: SlotId,
    pub covering_teacher_id: TeacherId,
    pub date: NaiveDate,
}

/// Description d'un cours à créer ou mettre à jour (clé : enseignant, jour, période, étiquette).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub teacher_id: TeacherId,
    pub day: u8,
    pub period_id: PeriodId,
    #[serde(default)]
    pub tag: WeekTag,
    pub class_name: String,
    pub subject: String,
}

/// Cours d'un emploi du temps avec sa période.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableEntry {
    #[serde(flatten)]
    pub slot: TimetableSlot,
    pub period: Period,
}

/// Enseignant disponible pour un créneau non couvert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: TeacherId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TeacherKind,
}

impl From<&Teacher> for Candidate {
    fn from(t: &Teacher) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            kind: t.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlotOutcome {
    Covered {
        assignment_id: AssignmentId,
        covering_teacher_id: TeacherId,
        covering_teacher_name: String,
    },
    Uncovered {
        candidates: Vec<Candidate>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOutcome {
    pub slot_id: SlotId,
    pub period_id: PeriodId,
    pub period_ordinal: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub class_name: String,
    pub subject: String,
    #[serde(flatten)]
    pub outcome: SlotOutcome,
}

impl PeriodOutcome {
    pub fn is_covered(&self) -> bool {
        matches!(self.outcome, SlotOutcome::Covered { .. })
    }

    pub fn covering_teacher_name(&self) -> Option<&str> {
        match &self.outcome {
            SlotOutcome::Covered {
                covering_teacher_name,
                ..
            } => Some(covering_teacher_name),
            SlotOutcome::Uncovered { .. } => None,
        }
    }

    pub fn assignment_id(&self) -> Option<&AssignmentId> {
        match &self.outcome {
            SlotOutcome::Covered { assignment_id, .. } => Some(assignment_id),
            SlotOutcome::Uncovered { .. } => None,
        }
    }

    /// Candidats (vide pour un créneau couvert).
    pub fn candidates(&self) -> &[Candidate] {
        match &self.outcome {
            SlotOutcome::Uncovered { candidates } => candidates,
            SlotOutcome::Covered { .. } => &[],
        }
    }

    /// `HH:MM–HH:MM`
    pub fn time_range(&self) -> String {
        format!(
            "{}–{}",
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

/// Fiche d'un enseignant absent pour la journée.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    /// Premier rapport d'absence couvrant la date.
    pub sick_report_id: SickReportId,
    /// Tous les rapports couvrant la date (fusionnés dans cette fiche).
    pub sick_report_ids: Vec<SickReportId>,
    pub periods: Vec<PeriodOutcome>,
}

impl Card {
    pub fn uncovered(&self) -> usize {
        self.periods.iter().filter(|p| !p.is_covered()).count()
    }

    pub fn covered(&self) -> usize {
        self.periods.iter().filter(|p| p.is_covered()).count()
    }

    pub fn period(&self, ordinal: u8) -> Option<&PeriodOutcome> {
        self.periods.iter().find(|p| p.period_ordinal == ordinal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub is_weekend: bool,
    pub week_type: Option<Parity>,
    pub cards: Vec<Card>,
    pub total_uncovered: usize,
    pub total_covered: usize,
}

impl Dashboard {
    /// Samedi ou dimanche : rien à couvrir.
    pub fn non_school_day(date: NaiveDate) -> Self {
        Self {
            date,
            is_weekend: true,
            week_type: None,
            cards: Vec::new(),
            total_uncovered: 0,
            total_covered: 0,
        }
    }

    pub fn card_for(&self, teacher: &TeacherId) -> Option<&Card> {
        self.cards.iter().find(|c| &c.teacher_id == teacher)
    }
}
