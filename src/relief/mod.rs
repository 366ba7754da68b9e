mod admin;
mod cache;
mod index;
mod ledger;
mod resolver;
mod roster;
mod types;
mod util;

pub use admin::validate;
pub use index::{IndexedSlot, TimetableIndex};
pub use ledger::{assignments_on, commitment_at, detect_double_bookings, DoubleBooking};
pub use resolver::resolve;
pub use roster::{periods_in_order, teachers_by_name, timetable_for};
pub use types::{
    Candidate, Card, ConflictKind, Dashboard, DeskOptions, EntityKind, NewAssignment,
    PeriodOutcome, ReliefError, SlotOutcome, SlotSpec, TimetableEntry,
};
pub use util::school_day;

use crate::logging::{log_debug, log_warn};
use crate::model::{
    AssignmentId, Period, PeriodId, ReliefAssignment, School, SickReport, SlotId, Teacher,
    TeacherId, TeacherKind, TimetableSlot, WeekTag,
};
use crate::parity::Parity;
use crate::storage::Storage;
use cache::DashboardCache;
use chrono::{NaiveDate, NaiveTime};
use std::sync::{Mutex, RwLock};

/// Bureau des remplacements : l'établissement courant derrière un verrou,
/// persisté à chaque mutation.
///
/// Les lectures (tableau de bord) prennent le verrou partagé et recalculent
/// tout. Chaque mutation prend le verrou exclusif puis celui du support,
/// relit le support, vérifie, applique et sauvegarde avant de les relâcher :
/// deux bureaux ouverts sur le même fichier ne s'écrasent jamais. Si la
/// sauvegarde échoue, l'état précédent est restauré.
pub struct ReliefDesk<S: Storage> {
    school: RwLock<School>,
    storage: S,
    opts: DeskOptions,
    cache: Mutex<DashboardCache>,
}

impl<S: Storage> ReliefDesk<S> {
    /// Charge et valide l'établissement depuis `storage`.
    pub fn open(storage: S, opts: DeskOptions) -> Result<Self, ReliefError> {
        let school = storage.load()?;
        validate(&school)?;
        Ok(Self {
            school: RwLock::new(school),
            storage,
            opts,
            cache: Mutex::new(DashboardCache::default()),
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Copie de l'état courant.
    pub fn snapshot(&self) -> Result<School, ReliefError> {
        let guard = self.school.read().map_err(|_| ReliefError::Poisoned)?;
        Ok(guard.clone())
    }

    /// Tableau de bord du jour : fiches des absents, créneaux couverts ou non,
    /// candidats. `parity` force la parité de semaine.
    pub fn dashboard(
        &self,
        date: NaiveDate,
        parity: Option<Parity>,
    ) -> Result<Dashboard, ReliefError> {
        let guard = self.school.read().map_err(|_| ReliefError::Poisoned)?;

        let revision = {
            let cache = self.cache.lock().map_err(|_| ReliefError::Poisoned)?;
            if self.opts.cache_dashboards {
                if let Some(hit) = cache.get(date, parity) {
                    log_debug!("dashboard {date} served from cache");
                    return Ok(hit.clone());
                }
            }
            cache.revision()
        };

        let dashboard = resolve(&guard, date, parity);

        if self.opts.cache_dashboards {
            let mut cache = self.cache.lock().map_err(|_| ReliefError::Poisoned)?;
            cache.put(revision, dashboard.clone(), parity);
        }
        Ok(dashboard)
    }

    /// Affecte un remplaçant ; `ReliefError::Conflict` si le remplaçant est
    /// déjà pris à cette période ou si le créneau est déjà couvert.
    pub fn create_assignment(&self, req: NewAssignment) -> Result<ReliefAssignment, ReliefError> {
        self.mutate(|school| ledger::create(school, req))
    }

    pub fn delete_assignment(&self, id: &AssignmentId) -> Result<ReliefAssignment, ReliefError> {
        self.mutate(|school| ledger::delete(school, id))
    }

    /// Enseignants triés par nom.
    pub fn teachers(&self) -> Result<Vec<Teacher>, ReliefError> {
        let guard = self.school.read().map_err(|_| ReliefError::Poisoned)?;
        Ok(teachers_by_name(&guard).into_iter().cloned().collect())
    }

    /// Périodes par numéro croissant.
    pub fn periods(&self) -> Result<Vec<Period>, ReliefError> {
        let guard = self.school.read().map_err(|_| ReliefError::Poisoned)?;
        Ok(periods_in_order(&guard).into_iter().cloned().collect())
    }

    /// Cours d'un enseignant, éventuellement limités à une étiquette.
    pub fn timetable(
        &self,
        teacher: &TeacherId,
        tag: Option<WeekTag>,
    ) -> Result<Vec<TimetableEntry>, ReliefError> {
        let guard = self.school.read().map_err(|_| ReliefError::Poisoned)?;
        if guard.find_teacher(teacher).is_none() {
            return Err(ReliefError::not_found(EntityKind::Teacher, teacher));
        }
        Ok(timetable_for(&guard, teacher, tag))
    }

    pub fn add_teacher(&self, name: &str, kind: TeacherKind) -> Result<Teacher, ReliefError> {
        self.mutate(|school| admin::add_teacher(school, name, kind))
    }

    pub fn remove_teacher(&self, id: &TeacherId) -> Result<Teacher, ReliefError> {
        self.mutate(|school| admin::remove_teacher(school, id))
    }

    pub fn add_period(
        &self,
        ordinal: u8,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Period, ReliefError> {
        self.mutate(|school| admin::add_period(school, ordinal, start, end))
    }

    pub fn remove_period(&self, id: &PeriodId) -> Result<Period, ReliefError> {
        self.mutate(|school| admin::remove_period(school, id))
    }

    pub fn set_slot(&self, spec: SlotSpec) -> Result<TimetableSlot, ReliefError> {
        self.mutate(|school| admin::set_slot(school, spec))
    }

    pub fn remove_slot(&self, id: &SlotId) -> Result<TimetableSlot, ReliefError> {
        self.mutate(|school| admin::remove_slot(school, id))
    }

    pub fn report_sick(
        &self,
        teacher: &TeacherId,
        start: NaiveDate,
        number_of_days: u32,
    ) -> Result<SickReport, ReliefError> {
        let max = self.opts.max_sick_days;
        self.mutate(|school| {
            admin::report_sick(school, teacher, start, number_of_days, max)
        })
    }

    /// Relire, vérifier, appliquer, sauvegarder : tout sous le verrou
    /// exclusif et celui du support.
    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut School) -> Result<T, ReliefError>,
    ) -> Result<T, ReliefError> {
        let mut guard = self.school.write().map_err(|_| ReliefError::Poisoned)?;
        let outcome = self
            .storage
            .exclusive(|| transact(&self.storage, &mut guard, apply));

        // l'état a pu être relu depuis le support même en cas d'échec
        let mut cache = self.cache.lock().map_err(|_| ReliefError::Poisoned)?;
        cache.bump();
        outcome?
    }
}

fn transact<S: Storage, T>(
    storage: &S,
    school: &mut School,
    apply: impl FnOnce(&mut School) -> Result<T, ReliefError>,
) -> Result<T, ReliefError> {
    let latest = storage.load()?;
    if latest != *school {
        validate(&latest)?;
        log_debug!("store changed since last read, reloaded");
        *school = latest;
    }
    let before = school.clone();

    let out = match apply(school) {
        Ok(out) => out,
        Err(e) => {
            *school = before;
            return Err(e);
        }
    };

    if let Err(e) = storage.save(school) {
        log_warn!("save failed, mutation rolled back: {e:#}");
        *school = before;
        return Err(ReliefError::Other(e));
    }
    Ok(out)
}
