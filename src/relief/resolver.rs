use super::index::TimetableIndex;
use super::types::{Candidate, Card, Dashboard, PeriodOutcome, SlotOutcome};
use super::util;
use crate::logging::log_debug;
use crate::model::{PeriodId, ReliefAssignment, School, SickReportId, SlotId, Teacher, TeacherId};
use crate::parity::{week_parity, Parity};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Calcule les créneaux à couvrir et les remplaçants possibles pour `date`.
///
/// Fonction pure sur un `School` emprunté : aucune écriture, aucun état
/// conservé. Deux appels sans mutation intermédiaire donnent le même résultat.
pub fn resolve(school: &School, date: NaiveDate, parity_override: Option<Parity>) -> Dashboard {
    let Some(day) = util::school_day(date) else {
        log_debug!("{date} is not a school day");
        return Dashboard::non_school_day(date);
    };
    let parity = parity_override.unwrap_or_else(|| week_parity(date));
    let index = TimetableIndex::build(school, day, parity);

    // Un enseignant peut avoir plusieurs rapports qui se chevauchent : une seule
    // fiche, placée selon le premier rapport rencontré.
    let mut absent: Vec<(&TeacherId, Vec<&SickReportId>)> = Vec::new();
    for report in school.sick_reports.iter().filter(|r| r.covers(date)) {
        match absent.iter_mut().find(|(t, _)| *t == &report.teacher_id) {
            Some((_, ids)) => ids.push(&report.id),
            None => absent.push((&report.teacher_id, vec![&report.id])),
        }
    }
    let sick: HashSet<&TeacherId> = absent.iter().map(|(t, _)| *t).collect();

    let slot_periods: HashMap<&SlotId, &PeriodId> =
        school.slots.iter().map(|s| (&s.id, &s.period_id)).collect();
    let mut by_slot: HashMap<&SlotId, &ReliefAssignment> = HashMap::new();
    let mut covering: HashMap<&TeacherId, HashSet<&PeriodId>> = HashMap::new();
    for assignment in school.assignments.iter().filter(|a| a.date == date) {
        by_slot.entry(&assignment.slot_id).or_insert(assignment);
        if let Some(period) = slot_periods.get(&assignment.slot_id) {
            covering
                .entry(&assignment.covering_teacher_id)
                .or_default()
                .insert(*period);
        }
    }

    let mut roster: Vec<&Teacher> = school.teachers.iter().collect();
    roster.sort_by(|a, b| util::by_display_name(a, b));
    let names: HashMap<&TeacherId, &str> = school
        .teachers
        .iter()
        .map(|t| (&t.id, t.name.as_str()))
        .collect();
    let name_of = |id: &TeacherId| -> String {
        names
            .get(id)
            .map(|n| n.to_string())
            .unwrap_or_else(|| id.to_string())
    };

    let mut cards = Vec::new();
    for (absent_id, report_ids) in &absent {
        let absent_id: &TeacherId = absent_id;
        let slots = index.slots_for(absent_id);
        if slots.is_empty() {
            log_debug!("{absent_id} has no lessons on day {day} ({parity}), no card");
            continue;
        }

        let periods = slots
            .iter()
            .map(|entry| {
                let period_id = &entry.period.id;
                let outcome = match by_slot.get(&entry.slot.id) {
                    Some(assignment) => SlotOutcome::Covered {
                        assignment_id: assignment.id.clone(),
                        covering_teacher_id: assignment.covering_teacher_id.clone(),
                        covering_teacher_name: name_of(&assignment.covering_teacher_id),
                    },
                    None => SlotOutcome::Uncovered {
                        candidates: roster
                            .iter()
                            .filter(|c| &c.id != absent_id)
                            .filter(|c| !sick.contains(&c.id))
                            .filter(|c| !index.is_busy(&c.id, period_id))
                            .filter(|c| {
                                !covering
                                    .get(&c.id)
                                    .is_some_and(|periods| periods.contains(period_id))
                            })
                            .map(|c| Candidate::from(*c))
                            .collect(),
                    },
                };
                PeriodOutcome {
                    slot_id: entry.slot.id.clone(),
                    period_id: period_id.clone(),
                    period_ordinal: entry.period.ordinal,
                    start_time: entry.period.start,
                    end_time: entry.period.end,
                    class_name: entry.slot.class_name.clone(),
                    subject: entry.slot.subject.clone(),
                    outcome,
                }
            })
            .collect();

        cards.push(Card {
            teacher_id: absent_id.clone(),
            teacher_name: name_of(absent_id),
            sick_report_id: report_ids[0].clone(),
            sick_report_ids: report_ids.iter().map(|id| (*id).clone()).collect(),
            periods,
        });
    }

    let total_uncovered: usize = cards.iter().map(Card::uncovered).sum();
    let total_covered: usize = cards.iter().map(Card::covered).sum();
    log_debug!(
        "dashboard {date} ({parity}): {} card(s), {total_uncovered} uncovered, {total_covered} covered",
        cards.len()
    );

    Dashboard {
        date,
        is_weekend: false,
        week_type: Some(parity),
        cards,
        total_uncovered,
        total_covered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Period, SickReport, TeacherKind, TimetableSlot, WeekTag};
    use chrono::NaiveTime;

    fn monday() -> NaiveDate {
        // semaine ISO 11 : impaire
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    struct Fixture {
        school: School,
        tan: TeacherId,
        lim: TeacherId,
        kumar: TeacherId,
        p1: PeriodId,
    }

    fn fixture() -> Fixture {
        let mut school = School::default();
        let tan = Teacher::new("Tan", TeacherKind::Regular);
        let lim = Teacher::new("Lim", TeacherKind::Regular);
        let kumar = Teacher::new("Kumar", TeacherKind::PermanentRelief);
        let p1 = Period::new(
            1,
            NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(8, 20, 0).unwrap(),
        )
        .unwrap();
        school.slots.push(
            TimetableSlot::new(tan.id.clone(), 1, p1.id.clone(), WeekTag::All, "3A", "Math")
                .unwrap(),
        );
        school.slots.push(
            TimetableSlot::new(lim.id.clone(), 1, p1.id.clone(), WeekTag::Even, "3B", "English")
                .unwrap(),
        );
        let (tan_id, lim_id, kumar_id, p1_id) =
            (tan.id.clone(), lim.id.clone(), kumar.id.clone(), p1.id.clone());
        school.teachers.extend([tan, lim, kumar]);
        school.periods.push(p1);
        Fixture {
            school,
            tan: tan_id,
            lim: lim_id,
            kumar: kumar_id,
            p1: p1_id,
        }
    }

    #[test]
    fn weekend_short_circuits() {
        let fx = fixture();
        let saturday = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let d = resolve(&fx.school, saturday, None);
        assert!(d.is_weekend);
        assert_eq!(d.week_type, None);
        assert!(d.cards.is_empty());
        assert_eq!((d.total_covered, d.total_uncovered), (0, 0));
    }

    #[test]
    fn even_only_lesson_does_not_block_on_odd_week() {
        let mut fx = fixture();
        fx.school
            .sick_reports
            .push(SickReport::new(fx.tan.clone(), monday(), monday()).unwrap());

        let d = resolve(&fx.school, monday(), None);
        assert_eq!(d.week_type, Some(Parity::Odd));
        let card = d.card_for(&fx.tan).unwrap();
        let ids: Vec<_> = card.periods[0].candidates().iter().map(|c| &c.id).collect();
        assert_eq!(ids, [&fx.kumar, &fx.lim]);

        let forced = resolve(&fx.school, monday(), Some(Parity::Even));
        let card = forced.card_for(&fx.tan).unwrap();
        let ids: Vec<_> = card.periods[0].candidates().iter().map(|c| &c.id).collect();
        assert_eq!(ids, [&fx.kumar]);
    }

    #[test]
    fn overlapping_reports_merge_into_one_card() {
        let mut fx = fixture();
        let first = SickReport::new(fx.tan.clone(), monday(), monday()).unwrap();
        let second = SickReport::new(
            fx.tan.clone(),
            monday() - chrono::Duration::days(3),
            monday() + chrono::Duration::days(1),
        )
        .unwrap();
        let first_id = first.id.clone();
        fx.school.sick_reports.extend([first, second]);

        let d = resolve(&fx.school, monday(), None);
        assert_eq!(d.cards.len(), 1);
        assert_eq!(d.cards[0].sick_report_id, first_id);
        assert_eq!(d.cards[0].sick_report_ids.len(), 2);
        assert_eq!(d.total_uncovered, 1);
    }

    #[test]
    fn sick_teacher_without_lessons_gets_no_card() {
        let mut fx = fixture();
        fx.school
            .sick_reports
            .push(SickReport::new(fx.kumar.clone(), monday(), monday()).unwrap());
        let d = resolve(&fx.school, monday(), None);
        assert!(!d.is_weekend);
        assert!(d.cards.is_empty());
        assert_eq!(d.total_uncovered, 0);
    }

    #[test]
    fn sick_teachers_are_never_candidates() {
        let mut fx = fixture();
        fx.school
            .sick_reports
            .push(SickReport::new(fx.tan.clone(), monday(), monday()).unwrap());
        fx.school
            .sick_reports
            .push(SickReport::new(fx.kumar.clone(), monday(), monday()).unwrap());
        let d = resolve(&fx.school, monday(), None);
        let card = d.card_for(&fx.tan).unwrap();
        assert!(card.periods[0].candidates().iter().all(|c| c.id != fx.kumar));
        assert_eq!(card.periods[0].period_id, fx.p1);
    }
}
