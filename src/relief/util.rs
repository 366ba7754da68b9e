use crate::model::Teacher;
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;

/// Jour d'emploi du temps (1 = lundi … 5 = vendredi), `None` le week-end.
pub fn school_day(date: NaiveDate) -> Option<u8> {
    match date.weekday().number_from_monday() {
        d @ 1..=5 => u8::try_from(d).ok(),
        _ => None,
    }
}

/// Ordre d'affichage : nom sans casse, puis nom exact, puis id (stable).
pub(super) fn by_display_name(a: &Teacher, b: &Teacher) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}
