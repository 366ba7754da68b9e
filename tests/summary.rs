#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime};
use relief::{
    model::TeacherKind, DeskOptions, MemoryStorage, NewAssignment, ReliefDesk, SlotSpec,
    SummaryRenderer, TextSummary, WeekTag,
};

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[test]
fn summary_groups_by_covering_teacher() {
    let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let desk = ReliefDesk::open(MemoryStorage::default(), DeskOptions::default()).unwrap();
    let p1 = desk.add_period(1, hm(7, 30), hm(8, 20)).unwrap();
    let p3 = desk.add_period(3, hm(9, 30), hm(10, 20)).unwrap();
    let tan = desk.add_teacher("Mr Tan Wei Ming", TeacherKind::Regular).unwrap();
    let priya = desk.add_teacher("Ms Priya Nair", TeacherKind::Regular).unwrap();
    let lim = desk.add_teacher("Ms Lim Siew Hua", TeacherKind::Regular).unwrap();
    let kumar = desk
        .add_teacher("Mr Kumar Rajan", TeacherKind::PermanentRelief)
        .unwrap();

    let lesson = |teacher: &relief::TeacherId, period: &relief::PeriodId, class: &str, subject: &str| {
        desk.set_slot(SlotSpec {
            teacher_id: teacher.clone(),
            day: 1,
            period_id: period.clone(),
            tag: WeekTag::All,
            class_name: class.into(),
            subject: subject.into(),
        })
        .unwrap()
    };
    lesson(&tan.id, &p1.id, "3A", "Math");
    let tan_p3 = lesson(&tan.id, &p3.id, "4A", "Math");
    let priya_p1 = lesson(&priya.id, &p1.id, "4A", "History");

    let tan_report = desk.report_sick(&tan.id, monday, 2).unwrap();
    let priya_report = desk.report_sick(&priya.id, monday, 1).unwrap();
    for (report, slot, who) in [
        (&tan_report.id, &tan_p3.id, &lim.id),
        (&priya_report.id, &priya_p1.id, &kumar.id),
    ] {
        desk.create_assignment(NewAssignment {
            sick_report_id: report.clone(),
            slot_id: slot.clone(),
            covering_teacher_id: who.clone(),
            date: monday,
        })
        .unwrap();
    }

    let text = TextSummary.render(&desk.dashboard(monday, None).unwrap());
    insta::assert_snapshot!(text, @r"
    RELIEF SUMMARY — Monday, 9 March 2026

    ABSENT:
    • Mr Tan Wei Ming
    • Ms Priya Nair

    RELIEF ASSIGNMENTS:

    MR KUMAR RAJAN
    • 07:30–08:20 → 4A History (replacing Ms Priya Nair)

    MS LIM SIEW HUA
    • 09:30–10:20 → 4A Math (replacing Mr Tan Wei Ming)

    UNCOVERED:
    • 07:30–08:20 → 3A Math (Mr Tan Wei Ming) — no relief assigned
    ");
}

#[test]
fn summary_is_empty_without_absentees() {
    let desk = ReliefDesk::open(MemoryStorage::default(), DeskOptions::default()).unwrap();
    let monday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let saturday = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    assert_eq!(TextSummary.render(&desk.dashboard(monday, None).unwrap()), "");
    assert_eq!(TextSummary.render(&desk.dashboard(saturday, None).unwrap()), "");
}
