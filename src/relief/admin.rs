use super::ledger;
use super::types::{ConflictKind, EntityKind, ReliefError, SlotSpec};
use crate::logging::{log_debug, log_info};
use crate::model::{
    Period, PeriodId, School, SickReport, SlotId, Teacher, TeacherId, TeacherKind, TimetableSlot,
    WeekTag,
};
use chrono::{Days, NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};

pub(super) fn add_teacher(
    school: &mut School,
    name: &str,
    kind: TeacherKind,
) -> Result<Teacher, ReliefError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ReliefError::InvalidTeacher("name is required"));
    }
    let teacher = Teacher::new(name, kind);
    school.teachers.push(teacher.clone());
    Ok(teacher)
}

/// Supprime un enseignant avec ses cours, ses absences et tous les
/// remplacements qui le concernent.
pub(super) fn remove_teacher(school: &mut School, id: &TeacherId) -> Result<Teacher, ReliefError> {
    let pos = school
        .teachers
        .iter()
        .position(|t| &t.id == id)
        .ok_or_else(|| ReliefError::not_found(EntityKind::Teacher, id))?;
    let teacher = school.teachers.remove(pos);

    let gone_slots: HashSet<SlotId> = school
        .slots
        .iter()
        .filter(|s| &s.teacher_id == id)
        .map(|s| s.id.clone())
        .collect();
    school.slots.retain(|s| &s.teacher_id != id);

    let gone_reports: HashSet<_> = school
        .sick_reports
        .iter()
        .filter(|r| &r.teacher_id == id)
        .map(|r| r.id.clone())
        .collect();
    school.sick_reports.retain(|r| &r.teacher_id != id);

    let before = school.assignments.len();
    school.assignments.retain(|a| {
        &a.covering_teacher_id != id
            && !gone_slots.contains(&a.slot_id)
            && !gone_reports.contains(&a.sick_report_id)
    });
    log_info!(
        "teacher {} removed with {} slot(s), {} report(s), {} assignment(s)",
        teacher.id,
        gone_slots.len(),
        gone_reports.len(),
        before - school.assignments.len()
    );
    Ok(teacher)
}

pub(super) fn add_period(
    school: &mut School,
    ordinal: u8,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<Period, ReliefError> {
    if school.find_period_by_ordinal(ordinal).is_some() {
        return Err(ReliefError::DuplicatePeriod(ordinal));
    }
    let period = Period::new(ordinal, start, end).map_err(ReliefError::InvalidPeriod)?;
    school.periods.push(period.clone());
    school.periods.sort_by_key(|p| p.ordinal);
    Ok(period)
}

pub(super) fn remove_period(school: &mut School, id: &PeriodId) -> Result<Period, ReliefError> {
    let pos = school
        .periods
        .iter()
        .position(|p| &p.id == id)
        .ok_or_else(|| ReliefError::not_found(EntityKind::Period, id))?;
    let period = school.periods.remove(pos);

    let gone_slots: HashSet<SlotId> = school
        .slots
        .iter()
        .filter(|s| &s.period_id == id)
        .map(|s| s.id.clone())
        .collect();
    school.slots.retain(|s| &s.period_id != id);
    school
        .assignments
        .retain(|a| !gone_slots.contains(&a.slot_id));
    Ok(period)
}

/// Crée ou met à jour le cours identifié par (enseignant, jour, période, étiquette).
///
/// `All` et `Odd`/`Even` s'excluent pour un même (enseignant, jour, période).
pub(super) fn set_slot(school: &mut School, spec: SlotSpec) -> Result<TimetableSlot, ReliefError> {
    if school.find_teacher(&spec.teacher_id).is_none() {
        return Err(ReliefError::not_found(EntityKind::Teacher, &spec.teacher_id));
    }
    if school.find_period(&spec.period_id).is_none() {
        return Err(ReliefError::not_found(EntityKind::Period, &spec.period_id));
    }
    let class_name = spec.class_name.trim();
    let subject = spec.subject.trim();
    if class_name.is_empty() || subject.is_empty() {
        return Err(ReliefError::InvalidSlot(
            "class name and subject are required".to_string(),
        ));
    }

    let same_place = |s: &&TimetableSlot| {
        s.teacher_id == spec.teacher_id && s.day == spec.day && s.period_id == spec.period_id
    };
    if let Some(clash) = school
        .slots
        .iter()
        .filter(same_place)
        .find(|s| tags_clash(s.tag, spec.tag))
    {
        return Err(ReliefError::TagClash {
            teacher: spec.teacher_id.clone(),
            day: spec.day,
            period: spec.period_id.clone(),
            existing: clash.tag,
            requested: spec.tag,
        });
    }

    if let Some(existing) = school
        .slots
        .iter_mut()
        .find(|s| same_place(&&**s) && s.tag == spec.tag)
    {
        existing.class_name = class_name.to_string();
        existing.subject = subject.to_string();
        log_debug!("slot {} updated", existing.id);
        return Ok(existing.clone());
    }

    let slot = TimetableSlot::new(
        spec.teacher_id.clone(),
        spec.day,
        spec.period_id.clone(),
        spec.tag,
        class_name,
        subject,
    )
    .map_err(ReliefError::InvalidSlot)?;
    school.slots.push(slot.clone());
    Ok(slot)
}

pub(super) fn remove_slot(school: &mut School, id: &SlotId) -> Result<TimetableSlot, ReliefError> {
    let pos = school
        .slots
        .iter()
        .position(|s| &s.id == id)
        .ok_or_else(|| ReliefError::not_found(EntityKind::Slot, id))?;
    let slot = school.slots.remove(pos);
    school.assignments.retain(|a| &a.slot_id != id);
    Ok(slot)
}

/// Déclaration d'absence sur `number_of_days` jours consécutifs à partir de `start`.
pub(super) fn report_sick(
    school: &mut School,
    teacher_id: &TeacherId,
    start: NaiveDate,
    number_of_days: u32,
    max_days: u32,
) -> Result<SickReport, ReliefError> {
    if number_of_days == 0 || number_of_days > max_days {
        return Err(ReliefError::InvalidSickReport(
            "number of days is out of range",
        ));
    }
    if school.find_teacher(teacher_id).is_none() {
        return Err(ReliefError::not_found(EntityKind::Teacher, teacher_id));
    }
    let end = start
        .checked_add_days(Days::new(u64::from(number_of_days - 1)))
        .ok_or(ReliefError::InvalidSickReport("end date out of range"))?;
    let report = SickReport::new(teacher_id.clone(), start, end)
        .map_err(|_| ReliefError::InvalidSickReport("end precedes start"))?;
    log_info!("teacher {teacher_id} reported sick from {start} to {end}");
    school.sick_reports.push(report.clone());
    Ok(report)
}

fn tags_clash(a: WeekTag, b: WeekTag) -> bool {
    a != b && (a == WeekTag::All || b == WeekTag::All)
}

/// Vérifie la cohérence d'un `School` chargé depuis un support externe.
pub fn validate(school: &School) -> Result<(), ReliefError> {
    let mut ordinals = HashSet::new();
    for p in &school.periods {
        if !ordinals.insert(p.ordinal) {
            return Err(ReliefError::DuplicatePeriod(p.ordinal));
        }
        if p.end <= p.start {
            return Err(ReliefError::InvalidPeriod(format!(
                "period {} ends before it starts",
                p.ordinal
            )));
        }
    }

    let mut keys = HashSet::new();
    for s in &school.slots {
        if school.find_teacher(&s.teacher_id).is_none() {
            return Err(ReliefError::not_found(EntityKind::Teacher, &s.teacher_id));
        }
        if school.find_period(&s.period_id).is_none() {
            return Err(ReliefError::not_found(EntityKind::Period, &s.period_id));
        }
        if !(1..=5).contains(&s.day) {
            return Err(ReliefError::InvalidSlot(format!(
                "slot {} has day {} outside 1..=5",
                s.id, s.day
            )));
        }
        if !keys.insert((&s.teacher_id, s.day, &s.period_id, s.tag)) {
            return Err(ReliefError::InvalidSlot(format!(
                "slot {} duplicates an existing (teacher, day, period, tag)",
                s.id
            )));
        }
    }
    for s in &school.slots {
        if let Some(other) = school.slots.iter().find(|o| {
            o.teacher_id == s.teacher_id
                && o.day == s.day
                && o.period_id == s.period_id
                && tags_clash(o.tag, s.tag)
        }) {
            return Err(ReliefError::TagClash {
                teacher: s.teacher_id.clone(),
                day: s.day,
                period: s.period_id.clone(),
                existing: other.tag,
                requested: s.tag,
            });
        }
    }

    for r in &school.sick_reports {
        if school.find_teacher(&r.teacher_id).is_none() {
            return Err(ReliefError::not_found(EntityKind::Teacher, &r.teacher_id));
        }
        if r.end < r.start {
            return Err(ReliefError::InvalidSickReport("end precedes start"));
        }
    }

    for a in &school.assignments {
        if school.find_sick_report(&a.sick_report_id).is_none() {
            return Err(ReliefError::not_found(EntityKind::SickReport, &a.sick_report_id));
        }
        if school.find_slot(&a.slot_id).is_none() {
            return Err(ReliefError::not_found(EntityKind::Slot, &a.slot_id));
        }
        if school.find_teacher(&a.covering_teacher_id).is_none() {
            return Err(ReliefError::not_found(EntityKind::Teacher, &a.covering_teacher_id));
        }
    }
    let mut covered = HashMap::new();
    for a in &school.assignments {
        if let Some(existing) = covered.insert((&a.slot_id, a.date), &a.id) {
            return Err(ReliefError::Conflict(ConflictKind::SlotCovered {
                slot: a.slot_id.clone(),
                date: a.date,
                existing: existing.clone(),
            }));
        }
    }
    if let Some(double) = ledger::detect_double_bookings(school).into_iter().next() {
        return Err(ReliefError::Conflict(ConflictKind::TeacherBusy {
            teacher: double.teacher,
            date: double.date,
            period: double.period,
            existing: double.first,
        }));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn base() -> (School, TeacherId, PeriodId) {
        let mut school = School::default();
        let tan = add_teacher(&mut school, "  Tan  ", TeacherKind::Regular).unwrap();
        let p1 = add_period(&mut school, 1, t(7, 30), t(8, 20)).unwrap();
        (school, tan.id, p1.id)
    }

    fn spec(teacher: &TeacherId, period: &PeriodId, tag: WeekTag, class: &str) -> SlotSpec {
        SlotSpec {
            teacher_id: teacher.clone(),
            day: 1,
            period_id: period.clone(),
            tag,
            class_name: class.to_string(),
            subject: "Math".to_string(),
        }
    }

    #[test]
    fn teacher_name_is_trimmed_and_required() {
        let (school, tan, _) = base();
        assert_eq!(school.find_teacher(&tan).unwrap().name, "Tan");
        let mut school = school;
        assert!(matches!(
            add_teacher(&mut school, "   ", TeacherKind::Regular),
            Err(ReliefError::InvalidTeacher(_))
        ));
    }

    #[test]
    fn period_ordinals_are_unique() {
        let (mut school, _, _) = base();
        assert!(matches!(
            add_period(&mut school, 1, t(9, 0), t(9, 50)),
            Err(ReliefError::DuplicatePeriod(1))
        ));
        assert!(matches!(
            add_period(&mut school, 2, t(9, 0), t(8, 0)),
            Err(ReliefError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn set_slot_upserts_on_full_key() {
        let (mut school, tan, p1) = base();
        let first = set_slot(&mut school, spec(&tan, &p1, WeekTag::Odd, "3A")).unwrap();
        let again = set_slot(&mut school, spec(&tan, &p1, WeekTag::Odd, "3C")).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(school.slots.len(), 1);
        assert_eq!(school.slots[0].class_name, "3C");

        set_slot(&mut school, spec(&tan, &p1, WeekTag::Even, "3B")).unwrap();
        assert_eq!(school.slots.len(), 2);
    }

    #[test]
    fn all_tag_excludes_odd_even_for_same_place() {
        let (mut school, tan, p1) = base();
        set_slot(&mut school, spec(&tan, &p1, WeekTag::Odd, "3A")).unwrap();
        let err = set_slot(&mut school, spec(&tan, &p1, WeekTag::All, "3A")).unwrap_err();
        assert!(matches!(
            err,
            ReliefError::TagClash {
                existing: WeekTag::Odd,
                requested: WeekTag::All,
                ..
            }
        ));
        assert_eq!(school.slots.len(), 1);
    }

    #[test]
    fn removing_teacher_cascades() {
        let (mut school, tan, p1) = base();
        let lim = add_teacher(&mut school, "Lim", TeacherKind::Regular).unwrap();
        let slot = set_slot(&mut school, spec(&tan, &p1, WeekTag::All, "3A")).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let report = report_sick(&mut school, &tan, monday, 1, 14).unwrap();
        school.assignments.push(crate::model::ReliefAssignment {
            id: crate::model::AssignmentId::random(),
            sick_report_id: report.id,
            slot_id: slot.id,
            covering_teacher_id: lim.id.clone(),
            date: monday,
        });
        validate(&school).unwrap();

        remove_teacher(&mut school, &tan).unwrap();
        assert!(school.slots.is_empty());
        assert!(school.sick_reports.is_empty());
        assert!(school.assignments.is_empty());
        assert_eq!(school.teachers.len(), 1);
        validate(&school).unwrap();
    }

    #[test]
    fn removing_period_or_slot_drops_assignments() {
        let (mut school, tan, p1) = base();
        let p2 = add_period(&mut school, 2, t(8, 20), t(9, 10)).unwrap();
        let lim = add_teacher(&mut school, "Lim", TeacherKind::Regular).unwrap();
        let s1 = set_slot(&mut school, spec(&tan, &p1, WeekTag::All, "3A")).unwrap();
        let s2 = set_slot(&mut school, spec(&tan, &p2.id, WeekTag::All, "3B")).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let report = report_sick(&mut school, &tan, monday, 1, 14).unwrap();
        for slot in [&s1, &s2] {
            school.assignments.push(crate::model::ReliefAssignment {
                id: crate::model::AssignmentId::random(),
                sick_report_id: report.id.clone(),
                slot_id: slot.id.clone(),
                covering_teacher_id: lim.id.clone(),
                date: monday,
            });
        }

        remove_period(&mut school, &p1).unwrap();
        assert_eq!(school.slots.len(), 1);
        assert_eq!(school.assignments.len(), 1);

        remove_slot(&mut school, &s2.id).unwrap();
        assert!(school.slots.is_empty());
        assert!(school.assignments.is_empty());
        assert!(remove_slot(&mut school, &s2.id).unwrap_err().is_not_found());
        validate(&school).unwrap();
    }

    #[test]
    fn sick_report_length_is_bounded() {
        let (mut school, tan, _) = base();
        let start = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert!(report_sick(&mut school, &tan, start, 0, 14).is_err());
        assert!(report_sick(&mut school, &tan, start, 15, 14).is_err());
        let r = report_sick(&mut school, &tan, start, 3, 14).unwrap();
        assert_eq!(r.end, NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert!(report_sick(&mut school, &TeacherId::new("x"), start, 1, 14)
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            report_sick(&mut school, &tan, NaiveDate::MAX, 2, 14),
            Err(ReliefError::InvalidSickReport("end date out of range"))
        ));
        assert_eq!(school.sick_reports.len(), 1);
    }

    #[test]
    fn validate_rejects_slot_covered_twice_in_loaded_data() {
        let (mut school, tan, p1) = base();
        let lim = add_teacher(&mut school, "Lim", TeacherKind::Regular).unwrap();
        let kumar = add_teacher(&mut school, "Kumar", TeacherKind::PermanentRelief).unwrap();
        let slot = set_slot(&mut school, spec(&tan, &p1, WeekTag::All, "3A")).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let report = report_sick(&mut school, &tan, monday, 1, 14).unwrap();
        for who in [&lim, &kumar] {
            school.assignments.push(crate::model::ReliefAssignment {
                id: crate::model::AssignmentId::random(),
                sick_report_id: report.id.clone(),
                slot_id: slot.id.clone(),
                covering_teacher_id: who.id.clone(),
                date: monday,
            });
        }
        let first = school.assignments[0].id.clone();
        match validate(&school) {
            Err(ReliefError::Conflict(ConflictKind::SlotCovered { existing, .. })) => {
                assert_eq!(existing, first)
            }
            other => panic!("expected SlotCovered, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_tag_clash_in_loaded_data() {
        let (mut school, tan, p1) = base();
        for tag in [WeekTag::All, WeekTag::Even] {
            school
                .slots
                .push(TimetableSlot::new(tan.clone(), 2, p1.clone(), tag, "3A", "Math").unwrap());
        }
        assert!(matches!(
            validate(&school),
            Err(ReliefError::TagClash { .. })
        ));
    }
}
