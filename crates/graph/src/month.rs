use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// A calendar month, the granularity every graph is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    /// The month a date falls into.
    pub fn containing(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    /// The previous calendar month, rolling over year boundaries.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month is always in 1..=12")
    }

    pub fn last_day(self) -> NaiveDate {
        let next = if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        };
        next.first_day().pred_opt().expect("first day of a month has a predecessor")
    }

    pub fn days(self) -> u32 {
        self.last_day().day()
    }

    /// Midnight UTC on the first day.
    pub fn start(self) -> DateTime<Utc> {
        self.first_day()
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_utc()
    }

    /// The last representable second of the last day.
    pub fn end(self) -> DateTime<Utc> {
        self.last_day()
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 exists")
            .and_utc()
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The `count` calendar months ending at `latest`, oldest first.
pub fn months_back(count: u32, latest: Month) -> Vec<Month> {
    let mut months = vec![latest];
    let mut current = latest;
    for _ in 1..count {
        current = current.previous();
        months.push(current);
    }
    months.reverse();
    months
}
