//! Dashboard clock text

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

/// Clock readout. The colons blink: they are blanked on even seconds.
pub fn clock_text<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let separator = if now.second() % 2 == 0 { ' ' } else { ':' };
    format!(
        "{:02} {sep} {:02} {sep} {:02}",
        now.hour(),
        now.minute(),
        now.second(),
        sep = separator
    )
}

/// Date shown next to the clock (`MM/dd`)
pub fn date_text<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    format!("{:02}/{:02}", now.month(), now.day())
}

/// Current local time and date
pub fn now_texts() -> (String, String) {
    let now = Local::now();
    (clock_text(&now), date_text(&now))
}
