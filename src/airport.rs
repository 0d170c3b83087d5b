//! Airport reference data lookup (ambient)
//!
//! A small injection seam so the core never hard-codes an airport table:
//! callers supply their own `AirportLookup` (a database-backed one, a
//! static table loaded from a file, or — in tests — a fixed map).

use std::collections::HashMap;

use crate::error::AnalysisError;
use crate::types::Airport;

pub trait AirportLookup {
    fn lookup(&self, code: &str) -> Result<&Airport, AnalysisError>;
}

/// An in-memory airport table, keyed by IATA/ICAO code.
#[derive(Debug, Clone, Default)]
pub struct StaticAirportTable {
    airports: HashMap<String, Airport>,
}

impl StaticAirportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, airport: Airport) {
        self.airports.insert(airport.code.clone(), airport);
    }

    pub fn from_iter<I: IntoIterator<Item = Airport>>(airports: I) -> Self {
        let mut table = Self::new();
        for airport in airports {
            table.insert(airport);
        }
        table
    }
}

impl AirportLookup for StaticAirportTable {
    fn lookup(&self, code: &str) -> Result<&Airport, AnalysisError> {
        self.airports
            .get(code)
            .ok_or_else(|| AnalysisError::UnknownAirport(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: &str, tz: &str) -> Airport {
        Airport {
            code: code.to_string(),
            timezone: tz.to_string(),
            lat: 0.0,
            lon: 0.0,
        }
    }

    #[test]
    fn lookup_returns_inserted_airport() {
        let table = StaticAirportTable::from_iter([sample("DOH", "Asia/Qatar")]);
        let found = table.lookup("DOH").unwrap();
        assert_eq!(found.timezone, "Asia/Qatar");
    }

    #[test]
    fn lookup_missing_code_is_an_error() {
        let table = StaticAirportTable::new();
        assert!(table.lookup("ZZZ").is_err());
    }
}
