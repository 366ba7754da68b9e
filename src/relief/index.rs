use crate::logging::log_warn;
use crate::model::{Period, PeriodId, School, TeacherId, TimetableSlot};
use crate::parity::Parity;
use std::collections::{HashMap, HashSet};

/// Cours indexé avec sa période résolue.
#[derive(Debug, Clone, Copy)]
pub struct IndexedSlot<'a> {
    pub slot: &'a TimetableSlot,
    pub period: &'a Period,
}

/// Tables de recherche pour un jour et une parité donnés.
///
/// Reconstruit à chaque calcul : l'emploi du temps peut changer entre deux
/// requêtes, rien n'est conservé d'un appel à l'autre.
#[derive(Debug)]
pub struct TimetableIndex<'a> {
    day: u8,
    parity: Parity,
    by_teacher: HashMap<&'a TeacherId, Vec<IndexedSlot<'a>>>,
    busy: HashMap<&'a TeacherId, HashSet<&'a PeriodId>>,
}

impl<'a> TimetableIndex<'a> {
    pub fn build(school: &'a School, day: u8, parity: Parity) -> Self {
        let periods: HashMap<&PeriodId, &Period> =
            school.periods.iter().map(|p| (&p.id, p)).collect();
        let teachers: HashSet<&TeacherId> = school.teachers.iter().map(|t| &t.id).collect();

        let mut by_teacher: HashMap<&TeacherId, Vec<IndexedSlot<'a>>> = HashMap::new();
        let mut busy: HashMap<&TeacherId, HashSet<&PeriodId>> = HashMap::new();

        for slot in school
            .slots
            .iter()
            .filter(|s| s.day == day && s.tag.applies_to(parity))
        {
            let Some(period) = periods.get(&slot.period_id).copied() else {
                log_warn!("slot {} references unknown period {}", slot.id, slot.period_id);
                continue;
            };
            if !teachers.contains(&slot.teacher_id) {
                log_warn!("slot {} references unknown teacher {}", slot.id, slot.teacher_id);
                continue;
            }
            by_teacher
                .entry(&slot.teacher_id)
                .or_default()
                .push(IndexedSlot { slot, period });
            busy.entry(&slot.teacher_id)
                .or_default()
                .insert(&slot.period_id);
        }

        for slots in by_teacher.values_mut() {
            slots.sort_by(|a, b| {
                a.period
                    .ordinal
                    .cmp(&b.period.ordinal)
                    .then_with(|| a.slot.id.cmp(&b.slot.id))
            });
        }

        Self {
            day,
            parity,
            by_teacher,
            busy,
        }
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// Cours de l'enseignant ce jour-là, par numéro de période croissant.
    pub fn slots_for(&self, teacher: &TeacherId) -> &[IndexedSlot<'a>] {
        self.by_teacher
            .get(teacher)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn busy_periods(&self, teacher: &TeacherId) -> Option<&HashSet<&'a PeriodId>> {
        self.busy.get(teacher)
    }

    pub fn is_busy(&self, teacher: &TeacherId, period: &PeriodId) -> bool {
        self.busy
            .get(teacher)
            .is_some_and(|periods| periods.contains(period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Teacher, TeacherKind, WeekTag};
    use chrono::NaiveTime;

    fn period(school: &mut School, ordinal: u8, h: u32) -> PeriodId {
        let p = Period::new(
            ordinal,
            NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(h, 50, 0).unwrap(),
        )
        .unwrap();
        let id = p.id.clone();
        school.periods.push(p);
        id
    }

    fn slot(school: &mut School, t: &TeacherId, day: u8, p: &PeriodId, tag: WeekTag, class: &str) {
        let s = TimetableSlot::new(t.clone(), day, p.clone(), tag, class, "Math").unwrap();
        school.slots.push(s);
    }

    #[test]
    fn filters_by_day_and_parity() {
        let mut school = School::default();
        let tan = Teacher::new("Tan", TeacherKind::Regular);
        let p1 = period(&mut school, 1, 8);
        let p2 = period(&mut school, 2, 9);
        let p3 = period(&mut school, 3, 10);
        slot(&mut school, &tan.id, 1, &p3, WeekTag::Odd, "odd");
        slot(&mut school, &tan.id, 1, &p1, WeekTag::All, "all");
        slot(&mut school, &tan.id, 1, &p2, WeekTag::Even, "even");
        slot(&mut school, &tan.id, 2, &p1, WeekTag::All, "tuesday");
        school.teachers.push(tan.clone());

        let odd = TimetableIndex::build(&school, 1, Parity::Odd);
        let classes: Vec<_> = odd
            .slots_for(&tan.id)
            .iter()
            .map(|s| s.slot.class_name.as_str())
            .collect();
        assert_eq!(classes, ["all", "odd"]);
        assert!(odd.is_busy(&tan.id, &p1));
        assert!(!odd.is_busy(&tan.id, &p2));

        let even = TimetableIndex::build(&school, 1, Parity::Even);
        let classes: Vec<_> = even
            .slots_for(&tan.id)
            .iter()
            .map(|s| s.slot.class_name.as_str())
            .collect();
        assert_eq!(classes, ["all", "even"]);
        assert_eq!(even.busy_periods(&tan.id).map(|b| b.len()), Some(2));
    }

    #[test]
    fn skips_slots_with_dangling_references() {
        let mut school = School::default();
        let tan = Teacher::new("Tan", TeacherKind::Regular);
        let ghost = TeacherId::new("ghost");
        let p1 = period(&mut school, 1, 8);
        slot(&mut school, &ghost, 1, &p1, WeekTag::All, "orphan");
        slot(&mut school, &tan.id, 1, &PeriodId::new("gone"), WeekTag::All, "no period");
        slot(&mut school, &tan.id, 1, &p1, WeekTag::All, "3A");
        school.teachers.push(tan.clone());

        let index = TimetableIndex::build(&school, 1, Parity::Odd);
        assert!(index.slots_for(&ghost).is_empty());
        assert!(!index.is_busy(&ghost, &p1));
        let classes: Vec<_> = index
            .slots_for(&tan.id)
            .iter()
            .map(|s| s.slot.class_name.as_str())
            .collect();
        assert_eq!(classes, ["3A"]);
    }

    #[test]
    fn unknown_teacher_has_no_slots() {
        let school = School::default();
        let index = TimetableIndex::build(&school, 3, Parity::Even);
        assert!(index.slots_for(&TeacherId::new("ghost")).is_empty());
        assert!(index.busy_periods(&TeacherId::new("ghost")).is_none());
        assert_eq!(index.day(), 3);
        assert_eq!(index.parity(), Parity::Even);
    }
}
