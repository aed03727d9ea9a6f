//! Formatting shared by every provider, so snapshots look the same no matter
//! which source produced them.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::{America::Guayaquil, Tz};

/// Timezone every `lastUpdated` value is rendered in.
pub const DISPLAY_TIMEZONE: Tz = Guayaquil;

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Render a timestamp as `16 de octubre de 2026, 3:45 p. m.` in [`DISPLAY_TIMEZONE`].
///
/// The day period uses a no-break space (`p.\u{a0}m.`), as es-ES locale output does.
pub fn format_last_updated(at: DateTime<Utc>) -> String {
    let local = at.with_timezone(&DISPLAY_TIMEZONE);
    let (is_pm, hour) = local.hour12();
    let month = MONTHS_ES[local.month0() as usize];

    format!(
        "{} de {} de {}, {}:{:02} {}",
        local.day(),
        month,
        local.year(),
        hour,
        local.minute(),
        if is_pm { "p.\u{a0}m." } else { "a.\u{a0}m." },
    )
}

/// Round to the nearest integer with halves going towards +∞ (-2.5 → -2).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Print whole numbers without a fractional part, everything else as-is.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn format_temperature(celsius: impl std::fmt::Display) -> String {
    format!("{celsius}°C")
}

pub fn format_humidity(percent: impl std::fmt::Display) -> String {
    format!("{percent}%")
}

pub fn format_wind_kmh(kmh: impl std::fmt::Display) -> String {
    format!("{kmh} km/h")
}
