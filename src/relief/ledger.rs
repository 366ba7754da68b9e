use super::types::{ConflictKind, EntityKind, NewAssignment, ReliefError};
use super::util;
use crate::logging::log_info;
use crate::model::{AssignmentId, PeriodId, ReliefAssignment, School, TeacherId};
use chrono::NaiveDate;

/// Double réservation détectée dans des données existantes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleBooking {
    pub teacher: TeacherId,
    pub date: NaiveDate,
    pub period: PeriodId,
    pub first: AssignmentId,
    pub second: AssignmentId,
}

/// Enregistre un remplacement après vérification des conflits.
///
/// Vérification et insertion ne sont atomiques que si l'appelant détient un
/// accès exclusif au `School` (cf. `ReliefDesk`).
pub(super) fn create(school: &mut School, req: NewAssignment) -> Result<ReliefAssignment, ReliefError> {
    let report = school
        .find_sick_report(&req.sick_report_id)
        .ok_or_else(|| ReliefError::not_found(EntityKind::SickReport, &req.sick_report_id))?;
    let slot = school
        .find_slot(&req.slot_id)
        .ok_or_else(|| ReliefError::not_found(EntityKind::Slot, &req.slot_id))?;
    if school.find_teacher(&req.covering_teacher_id).is_none() {
        return Err(ReliefError::not_found(
            EntityKind::Teacher,
            &req.covering_teacher_id,
        ));
    }

    if slot.teacher_id != report.teacher_id {
        return Err(ReliefError::InvalidAssignment(
            "slot does not belong to the absent teacher",
        ));
    }
    if !report.covers(req.date) {
        return Err(ReliefError::InvalidAssignment(
            "date is outside the sick report",
        ));
    }
    if util::school_day(req.date) != Some(slot.day) {
        return Err(ReliefError::InvalidAssignment(
            "slot is not scheduled on that weekday",
        ));
    }
    if req.covering_teacher_id == slot.teacher_id {
        return Err(ReliefError::InvalidAssignment(
            "absent teacher cannot cover their own class",
        ));
    }

    if let Some(existing) = school
        .assignments
        .iter()
        .find(|a| a.date == req.date && a.slot_id == req.slot_id)
    {
        return Err(ReliefError::Conflict(ConflictKind::SlotCovered {
            slot: req.slot_id.clone(),
            date: req.date,
            existing: existing.id.clone(),
        }));
    }

    let period = slot.period_id.clone();
    if let Some(existing) = commitment_at(school, &req.covering_teacher_id, req.date, &period) {
        return Err(ReliefError::Conflict(ConflictKind::TeacherBusy {
            teacher: req.covering_teacher_id.clone(),
            date: req.date,
            period,
            existing: existing.id.clone(),
        }));
    }

    let assignment = ReliefAssignment {
        id: AssignmentId::random(),
        sick_report_id: req.sick_report_id,
        slot_id: req.slot_id,
        covering_teacher_id: req.covering_teacher_id,
        date: req.date,
    };
    log_info!(
        "assignment {}: {} covers slot {} on {}",
        assignment.id,
        assignment.covering_teacher_id,
        assignment.slot_id,
        assignment.date
    );
    school.assignments.push(assignment.clone());
    Ok(assignment)
}

/// Annule un remplacement ; le créneau redevient non couvert.
pub(super) fn delete(school: &mut School, id: &AssignmentId) -> Result<ReliefAssignment, ReliefError> {
    let pos = school
        .assignments
        .iter()
        .position(|a| &a.id == id)
        .ok_or_else(|| ReliefError::not_found(EntityKind::Assignment, id))?;
    let removed = school.assignments.remove(pos);
    log_info!("assignment {} removed", removed.id);
    Ok(removed)
}

pub fn assignments_on(school: &School, date: NaiveDate) -> Vec<&ReliefAssignment> {
    school.assignments.iter().filter(|a| a.date == date).collect()
}

/// Remplacement déjà tenu par `teacher` à cette période, ce jour-là.
pub fn commitment_at<'a>(
    school: &'a School,
    teacher: &TeacherId,
    date: NaiveDate,
    period: &PeriodId,
) -> Option<&'a ReliefAssignment> {
    school.assignments.iter().find(|a| {
        &a.covering_teacher_id == teacher
            && a.date == date
            && school
                .find_slot(&a.slot_id)
                .is_some_and(|s| &s.period_id == period)
    })
}

/// Parcourt tous les remplacements et signale chaque paire en double.
pub fn detect_double_bookings(school: &School) -> Vec<DoubleBooking> {
    let mut out = Vec::new();
    let keyed: Vec<(&ReliefAssignment, Option<&PeriodId>)> = school
        .assignments
        .iter()
        .map(|a| (a, school.find_slot(&a.slot_id).map(|s| &s.period_id)))
        .collect();

    for (idx, (a, pa)) in keyed.iter().enumerate() {
        let Some(pa) = pa else { continue };
        for (b, pb) in keyed.iter().skip(idx + 1) {
            if a.covering_teacher_id == b.covering_teacher_id
                && a.date == b.date
                && pb.as_ref() == Some(pa)
            {
                out.push(DoubleBooking {
                    teacher: a.covering_teacher_id.clone(),
                    date: a.date,
                    period: (*pa).clone(),
                    first: a.id.clone(),
                    second: b.id.clone(),
                });
            }
        }
    }

    out
}
