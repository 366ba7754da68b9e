use super::types::Dashboard;
use crate::parity::Parity;
use chrono::NaiveDate;
use std::collections::HashMap;

type Key = (NaiveDate, Option<Parity>);

/// Tableaux de bord déjà calculés, estampillés par numéro de révision.
///
/// Toute mutation du `School` incrémente la révision : une entrée n'est
/// servie que si elle a été calculée à la révision courante.
#[derive(Debug, Default)]
pub(super) struct DashboardCache {
    revision: u64,
    entries: HashMap<Key, (u64, Dashboard)>,
}

impl DashboardCache {
    pub(super) fn revision(&self) -> u64 {
        self.revision
    }

    pub(super) fn get(&self, date: NaiveDate, parity: Option<Parity>) -> Option<&Dashboard> {
        self.entries
            .get(&(date, parity))
            .filter(|(rev, _)| *rev == self.revision)
            .map(|(_, d)| d)
    }

    pub(super) fn put(&mut self, revision: u64, dashboard: Dashboard, parity: Option<Parity>) {
        if revision == self.revision {
            self.entries
                .insert((dashboard.date, parity), (revision, dashboard));
        }
    }

    /// Nouvelle révision : toutes les entrées sont périmées.
    pub(super) fn bump(&mut self) {
        self.revision += 1;
        self.entries.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
