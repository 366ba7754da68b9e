//! Parité de semaine (ISO-8601) pour les emplois du temps en alternance.
//!
//! La semaine 1 est celle qui contient le premier jeudi de l'année ; les
//! semaines commencent le lundi. Semaine impaire → `Odd`, paire → `Even`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Parity {
    Odd,
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Parity::Odd => "ODD",
            Parity::Even => "EVEN",
        })
    }
}

impl FromStr for Parity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "odd" | "impaire" => Ok(Parity::Odd),
            "even" | "paire" => Ok(Parity::Even),
            other => Err(format!("expected odd or even, got {other:?}")),
        }
    }
}

/// Numéro de semaine ISO-8601 (1..=53).
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

/// Parité de la semaine ISO contenant `date`.
pub fn week_parity(date: NaiveDate) -> Parity {
    if iso_week_number(date) % 2 == 1 {
        Parity::Odd
    } else {
        Parity::Even
    }
}
