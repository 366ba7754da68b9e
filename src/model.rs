use crate::parity::Parity;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Teacher
    TeacherId
);
string_id!(
    /// Identifiant fort pour Period
    PeriodId
);
string_id!(
    /// Identifiant fort pour TimetableSlot
    SlotId
);
string_id!(
    /// Identifiant fort pour SickReport
    SickReportId
);
string_id!(
    /// Identifiant fort pour ReliefAssignment
    AssignmentId
);

/// Catégorie d'enseignant.
///
/// Un `PermanentRelief` n'a pas d'emploi du temps personnel : il n'existe que
/// pour remplacer, mais reste un candidat comme les autres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeacherKind {
    #[default]
    Regular,
    PermanentRelief,
}

impl fmt::Display for TeacherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TeacherKind::Regular => "REGULAR",
            TeacherKind::PermanentRelief => "PERMANENT_RELIEF",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub kind: TeacherKind,
}

impl Teacher {
    pub fn new<N: Into<String>>(name: N, kind: TeacherKind) -> Self {
        Self {
            id: TeacherId::random(),
            name: name.into(),
            kind,
        }
    }
}

/// Créneau horaire numéroté, partagé par tous les enseignants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub ordinal: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Period {
    /// Crée une période en validant que `end > start`.
    pub fn new(ordinal: u8, start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if end <= start {
            return Err("period end must be strictly after start".to_string());
        }
        Ok(Self {
            id: PeriodId::random(),
            ordinal,
            start,
            end,
        })
    }

    /// Libellé `HH:MM–HH:MM`.
    pub fn time_range(&self) -> String {
        format!("{}–{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Étiquette de rotation d'un créneau d'emploi du temps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeekTag {
    #[default]
    All,
    Odd,
    Even,
}

impl WeekTag {
    /// Le créneau s'applique-t-il pendant une semaine de cette parité ?
    pub fn applies_to(self, parity: Parity) -> bool {
        match self {
            WeekTag::All => true,
            WeekTag::Odd => parity == Parity::Odd,
            WeekTag::Even => parity == Parity::Even,
        }
    }
}

impl fmt::Display for WeekTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeekTag::All => "ALL",
            WeekTag::Odd => "ODD",
            WeekTag::Even => "EVEN",
        })
    }
}

impl std::str::FromStr for WeekTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(WeekTag::All),
            other => other.parse::<Parity>().map(WeekTag::from),
        }
    }
}

impl From<Parity> for WeekTag {
    fn from(p: Parity) -> Self {
        match p {
            Parity::Odd => WeekTag::Odd,
            Parity::Even => WeekTag::Even,
        }
    }
}

/// Cours d'un enseignant : (jour, période, étiquette) → (classe, matière).
///
/// `day` va de 1 (lundi) à 5 (vendredi).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSlot {
    pub id: SlotId,
    pub teacher_id: TeacherId,
    pub day: u8,
    pub period_id: PeriodId,
    #[serde(default)]
    pub tag: WeekTag,
    pub class_name: String,
    pub subject: String,
}

impl TimetableSlot {
    pub fn new<C: Into<String>, S: Into<String>>(
        teacher_id: TeacherId,
        day: u8,
        period_id: PeriodId,
        tag: WeekTag,
        class_name: C,
        subject: S,
    ) -> Result<Self, String> {
        if !(1..=5).contains(&day) {
            return Err("day must be between 1 (Monday) and 5 (Friday)".to_string());
        }
        Ok(Self {
            id: SlotId::random(),
            teacher_id,
            day,
            period_id,
            tag,
            class_name: class_name.into(),
            subject: subject.into(),
        })
    }
}

/// Déclaration d'absence, intervalle de dates inclusif [start, end].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SickReport {
    pub id: SickReportId,
    pub teacher_id: TeacherId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SickReport {
    pub fn new(teacher_id: TeacherId, start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if end < start {
            return Err("sick report end must not precede start".to_string());
        }
        Ok(Self {
            id: SickReportId::random(),
            teacher_id,
            start,
            end,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Remplacement validé d'un créneau précis, pour une date précise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefAssignment {
    pub id: AssignmentId,
    pub sick_report_id: SickReportId,
    pub slot_id: SlotId,
    pub covering_teacher_id: TeacherId,
    pub date: NaiveDate,
}

/// Établissement complet : un seul document JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct School {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub slots: Vec<TimetableSlot>,
    #[serde(default)]
    pub sick_reports: Vec<SickReport>,
    #[serde(default)]
    pub assignments: Vec<ReliefAssignment>,
}

impl School {
    pub fn find_teacher(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.iter().find(|t| &t.id == id)
    }
    pub fn find_teacher_by_name<'a>(&'a self, name: &str) -> Option<&'a Teacher> {
        self.teachers.iter().find(|t| t.name == name)
    }
    pub fn find_period(&self, id: &PeriodId) -> Option<&Period> {
        self.periods.iter().find(|p| &p.id == id)
    }
    pub fn find_period_by_ordinal(&self, ordinal: u8) -> Option<&Period> {
        self.periods.iter().find(|p| p.ordinal == ordinal)
    }
    pub fn find_slot(&self, id: &SlotId) -> Option<&TimetableSlot> {
        self.slots.iter().find(|s| &s.id == id)
    }
    pub fn find_sick_report(&self, id: &SickReportId) -> Option<&SickReport> {
        self.sick_reports.iter().find(|r| &r.id == id)
    }
    pub fn find_assignment(&self, id: &AssignmentId) -> Option<&ReliefAssignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }
}
