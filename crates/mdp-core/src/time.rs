//! Market-local calendar time.

use chrono::NaiveDate;
use chrono_tz::Asia::Ho_Chi_Minh;

/// Today's date on the Vietnamese market calendar.
///
/// Universe snapshots are keyed by this date; using UTC would roll the key
/// over at 07:00 local and split one trading day across two cache entries.
pub fn today_vn() -> NaiveDate {
    chrono::Utc::now().with_timezone(&Ho_Chi_Minh).date_naive()
}
