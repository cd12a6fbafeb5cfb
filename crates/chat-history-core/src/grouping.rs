//! Recency buckets for the conversation list.
//!
//! Boundaries are aligned on midnight in the caller's time zone:
//!
//! ```text
//! Older | Last 30 days | Last 7 days | Yesterday | Today
//!       ^              ^             ^           ^
//!   today - 1 month  today - 7d  today - 1d    today 00:00
//! ```
//!
//! A conversation without a usable `updated_at` lands in `Older`.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Conversation;

/// One of the five fixed recency groups, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
    Older,
}

impl Bucket {
    /// All buckets in display order.
    pub const ALL: [Bucket; 5] = [
        Bucket::Today,
        Bucket::Yesterday,
        Bucket::LastWeek,
        Bucket::LastMonth,
        Bucket::Older,
    ];

    /// Section header shown above the bucket.
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Today => "Aujourd'hui",
            Bucket::Yesterday => "Hier",
            Bucket::LastWeek => "7 derniers jours",
            Bucket::LastMonth => "30 derniers jours",
            Bucket::Older => "Plus ancien",
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Midnight-aligned instants separating the buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketBoundaries {
    pub today: DateTime<Utc>,
    pub yesterday: DateTime<Utc>,
    pub last_week: DateTime<Utc>,
    pub last_month: DateTime<Utc>,
}

impl BucketBoundaries {
    /// Compute the boundaries for the calendar day containing `now`.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let date = now.date_naive();

        let yesterday = date - Duration::days(1);
        let last_week = date - Duration::days(7);
        let last_month = date.checked_sub_months(Months::new(1)).unwrap_or(last_week);

        Self {
            today: local_midnight(&tz, date),
            yesterday: local_midnight(&tz, yesterday),
            last_week: local_midnight(&tz, last_week),
            last_month: local_midnight(&tz, last_month),
        }
    }

    /// Bucket for a single timestamp.
    pub fn classify(&self, updated_at: Option<DateTime<Utc>>) -> Bucket {
        let Some(t) = updated_at else {
            return Bucket::Older;
        };

        if t >= self.today {
            Bucket::Today
        } else if t >= self.yesterday {
            Bucket::Yesterday
        } else if t >= self.last_week {
            Bucket::LastWeek
        } else if t >= self.last_month {
            Bucket::LastMonth
        } else {
            Bucket::Older
        }
    }
}

/// First instant of `date` in `tz`.
///
/// When midnight falls in a DST gap the first valid instant after it is used.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight: NaiveDateTime = date.and_time(chrono::NaiveTime::MIN);
    (0..=2)
        .find_map(|hours| {
            tz.from_local_datetime(&(midnight + Duration::hours(hours)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Partition conversations into recency buckets.
///
/// Buckets come back in [`Bucket::ALL`] order, empty ones omitted. Items keep
/// the order they had in `conversations`.
pub fn group_by_date<'a, Tz: TimeZone>(
    conversations: &'a [Conversation],
    now: &DateTime<Tz>,
) -> Vec<(Bucket, Vec<&'a Conversation>)> {
    let boundaries = BucketBoundaries::at(now);
    let mut groups: Vec<(Bucket, Vec<&'a Conversation>)> =
        Bucket::ALL.iter().map(|b| (*b, Vec::new())).collect();

    for conv in conversations {
        let bucket = boundaries.classify(conv.updated_at);
        // Bucket::ALL is indexed by declaration order
        groups[bucket as usize].1.push(conv);
    }

    groups.retain(|(_, convs)| !convs.is_empty());
    groups
}
