use super::types::TimetableEntry;
use super::util;
use crate::model::{Period, School, Teacher, TeacherId, WeekTag};

/// Enseignants par nom (sans casse).
pub fn teachers_by_name(school: &School) -> Vec<&Teacher> {
    let mut teachers: Vec<&Teacher> = school.teachers.iter().collect();
    teachers.sort_by(|a, b| util::by_display_name(a, b));
    teachers
}

pub fn periods_in_order(school: &School) -> Vec<&Period> {
    let mut periods: Vec<&Period> = school.periods.iter().collect();
    periods.sort_by_key(|p| p.ordinal);
    periods
}

/// Emploi du temps d'un enseignant, trié par période puis par jour.
///
/// `tag` filtre sur l'étiquette exacte : `Some(Odd)` ne renvoie pas les
/// cours `All`.
pub fn timetable_for(
    school: &School,
    teacher: &TeacherId,
    tag: Option<WeekTag>,
) -> Vec<TimetableEntry> {
    let mut entries: Vec<TimetableEntry> = school
        .slots
        .iter()
        .filter(|s| &s.teacher_id == teacher)
        .filter(|s| tag.map_or(true, |t| s.tag == t))
        .filter_map(|s| {
            school.find_period(&s.period_id).map(|p| TimetableEntry {
                slot: s.clone(),
                period: p.clone(),
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        a.period
            .ordinal
            .cmp(&b.period.ordinal)
            .then_with(|| a.slot.day.cmp(&b.slot.day))
            .then_with(|| a.slot.id.cmp(&b.slot.id))
    });
    entries
}
