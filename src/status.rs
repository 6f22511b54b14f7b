use std::fmt;
use std::time::Duration;

use num_bigint::BigUint;

use crate::suitability::Suitability;

/// One pool entry as reported to UI layers.
#[derive(Debug, Clone)]
pub struct BestEntry {
    pub suitability: Suitability,
    pub repr: String,
    /// Textual form of the match-position set.
    pub match_positions: String,
}

/// Progress snapshot of a running (or paused) search.
///
/// All fields are computed under the driver mutex, so a snapshot is
/// internally consistent. `remaining_estimate` is absent until the search
/// has made measurable progress.
#[derive(Debug, Clone)]
pub struct Status {
    pub serial_number: BigUint,
    pub max_serial_number: BigUint,
    /// Fraction of the serial-number space behind the cursor, in `0.0..=1.0`.
    pub done_fraction: f64,
    pub elapsed: Duration,
    pub remaining_estimate: Option<Duration>,
    pub iterations_per_second: u64,
    pub serials_per_second: BigUint,
    pub iteration_count: u64,
    pub current_repr: String,
    pub best_entries: Vec<BestEntry>,
}

fn hms(d: Duration) -> String {
    let s = d.as_secs();
    format!("{}:{:02}:{:02}", s / 3600, (s / 60) % 60, s % 60)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "iteration {}; func sn {} from max {}; progress {:.3}%; speed {} ips; elapsed {}; remaining {}; function {}",
            self.iteration_count,
            self.serial_number,
            self.max_serial_number,
            self.done_fraction * 100.0,
            self.iterations_per_second,
            hms(self.elapsed),
            self.remaining_estimate.map_or_else(|| "?".to_string(), hms),
            self.current_repr,
        )?;
        writeln!(
            f,
            "|  dist  | lvl | fnc | fnu | {:48}| coincidences",
            "function"
        )?;
        for best in &self.best_entries {
            writeln!(
                f,
                "| {:6} | {:3} | {:3} | {:3} | {:48}| {}",
                best.suitability.distance,
                best.suitability.max_level,
                best.suitability.functions_count,
                best.suitability.functions_unique,
                best.repr,
                best.match_positions,
            )?;
        }
        Ok(())
    }
}
