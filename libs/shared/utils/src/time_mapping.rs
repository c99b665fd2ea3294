//! Translation between the 12-hour display form ("02:30 PM") and the 24-hour
//! canonical form ("14:30") of every time on the 30-minute grid.
//!
//! Only the 48 grid points are representable. Lookups are exact string
//! matches; anything else is a soft miss (`None`).

use std::fmt;

/// Spacing of the grid in minutes.
pub const SLOT_MINUTES: u32 = 30;
/// Number of grid points in a day.
pub const GRID_LEN: usize = 48;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// (display, canonical) pairs in chronological order.
static TIME_MAP: [(&str, &str); GRID_LEN] = [
    ("12:00 AM", "00:00"),
    ("12:30 AM", "00:30"),
    ("01:00 AM", "01:00"),
    ("01:30 AM", "01:30"),
    ("02:00 AM", "02:00"),
    ("02:30 AM", "02:30"),
    ("03:00 AM", "03:00"),
    ("03:30 AM", "03:30"),
    ("04:00 AM", "04:00"),
    ("04:30 AM", "04:30"),
    ("05:00 AM", "05:00"),
    ("05:30 AM", "05:30"),
    ("06:00 AM", "06:00"),
    ("06:30 AM", "06:30"),
    ("07:00 AM", "07:00"),
    ("07:30 AM", "07:30"),
    ("08:00 AM", "08:00"),
    ("08:30 AM", "08:30"),
    ("09:00 AM", "09:00"),
    ("09:30 AM", "09:30"),
    ("10:00 AM", "10:00"),
    ("10:30 AM", "10:30"),
    ("11:00 AM", "11:00"),
    ("11:30 AM", "11:30"),
    ("12:00 PM", "12:00"),
    ("12:30 PM", "12:30"),
    ("01:00 PM", "13:00"),
    ("01:30 PM", "13:30"),
    ("02:00 PM", "14:00"),
    ("02:30 PM", "14:30"),
    ("03:00 PM", "15:00"),
    ("03:30 PM", "15:30"),
    ("04:00 PM", "16:00"),
    ("04:30 PM", "16:30"),
    ("05:00 PM", "17:00"),
    ("05:30 PM", "17:30"),
    ("06:00 PM", "18:00"),
    ("06:30 PM", "18:30"),
    ("07:00 PM", "19:00"),
    ("07:30 PM", "19:30"),
    ("08:00 PM", "20:00"),
    ("08:30 PM", "20:30"),
    ("09:00 PM", "21:00"),
    ("09:30 PM", "21:30"),
    ("10:00 PM", "22:00"),
    ("10:30 PM", "22:30"),
    ("11:00 PM", "23:00"),
    ("11:30 PM", "23:30"),
];

/// Converts a display time to its canonical form, e.g. `"02:30 PM"` to `"14:30"`.
pub fn to_24_hour(time_12h: &str) -> Option<&'static str> {
    GridTime::from_12_hour(time_12h).map(GridTime::canonical)
}

/// Converts a canonical time to its display form, e.g. `"14:30"` to `"02:30 PM"`.
pub fn to_12_hour(time_24h: &str) -> Option<&'static str> {
    GridTime::from_24_hour(time_24h).map(GridTime::display)
}

/// All display times, starting at "12:00 AM".
pub fn all_12_hour_times() -> impl ExactSizeIterator<Item = &'static str> {
    TIME_MAP.iter().map(|(display, _)| *display)
}

/// All canonical times, starting at "00:00".
pub fn all_24_hour_times() -> impl ExactSizeIterator<Item = &'static str> {
    TIME_MAP.iter().map(|(_, canonical)| *canonical)
}

/// One point on the 30-minute grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridTime(u8);

impl GridTime {
    pub fn from_index(index: usize) -> Option<Self> {
        (index < GRID_LEN).then(|| GridTime(index as u8))
    }

    /// Grid point at `minutes` past midnight, if it lies exactly on the grid.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes >= MINUTES_PER_DAY || minutes % SLOT_MINUTES != 0 {
            return None;
        }
        Self::from_index((minutes / SLOT_MINUTES) as usize)
    }

    pub fn from_24_hour(time_24h: &str) -> Option<Self> {
        TIME_MAP
            .iter()
            .position(|(_, canonical)| *canonical == time_24h)
            .and_then(Self::from_index)
    }

    pub fn from_12_hour(time_12h: &str) -> Option<Self> {
        TIME_MAP
            .iter()
            .position(|(display, _)| *display == time_12h)
            .and_then(Self::from_index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn minutes(self) -> u32 {
        self.0 as u32 * SLOT_MINUTES
    }

    pub fn canonical(self) -> &'static str {
        TIME_MAP[self.index()].1
    }

    pub fn display(self) -> &'static str {
        TIME_MAP[self.index()].0
    }
}

impl fmt::Display for GridTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}
