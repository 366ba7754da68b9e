#![forbid(unsafe_code)]
//! Relief — moteur de remplacement des enseignants absents (sans BD).
//!
//! - Stockage fichier (JSON) ; exports JSON/CSV.
//! - Emplois du temps en alternance semaine paire/impaire (semaine ISO).
//! - Calcul des créneaux à couvrir et des remplaçants disponibles.
//! - Registre des remplacements sans double réservation.

mod logging;

pub mod io;
pub mod model;
pub mod parity;
pub mod relief;
pub mod storage;
pub mod summary;

pub use model::{
    AssignmentId, Period, PeriodId, ReliefAssignment, School, SickReport, SickReportId, SlotId,
    Teacher, TeacherId, TeacherKind, TimetableSlot, WeekTag,
};
pub use parity::{iso_week_number, week_parity, Parity};
pub use relief::{
    resolve, Candidate, Card, ConflictKind, Dashboard, DeskOptions, NewAssignment, PeriodOutcome,
    ReliefDesk, ReliefError, SlotOutcome, SlotSpec, TimetableEntry, TimetableIndex,
};
pub use storage::{JsonStorage, MemoryStorage, Storage};
pub use summary::{SummaryRenderer, TextSummary};
