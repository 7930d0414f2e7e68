use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use url::Url;

use super::Query;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parameters of one `GET /instruments/historical/{token}/{interval}` call.
///
/// `from` and `to` are exchange-local wall-clock times; both bounds are
/// inclusive on the server side.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoricalQuery {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    /// Stitch expired futures contracts into one series.
    pub continuous: bool,
    /// Include open interest as a seventh candle column.
    pub oi: bool,
}

impl HistoricalQuery {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self {
            from,
            to,
            continuous: false,
            oi: false,
        }
    }

    /// Covers whole calendar days: `from` at midnight through the last second of `to`.
    ///
    /// The date span (`to - from` in days) is unchanged by the time of day, so
    /// a chunk sized to an interval's `max_days` stays within it.
    pub fn for_dates(from: NaiveDate, to: NaiveDate) -> Self {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self::new(from.and_time(NaiveTime::MIN), to.and_time(end_of_day))
    }

    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    pub fn with_oi(mut self, oi: bool) -> Self {
        self.oi = oi;
        self
    }
}

impl Query for HistoricalQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("from", &self.from.format(DATETIME_FORMAT).to_string())
            .append_pair("to", &self.to.format(DATETIME_FORMAT).to_string());
        if self.continuous {
            url.query_pairs_mut().append_pair("continuous", "1");
        }
        if self.oi {
            url.query_pairs_mut().append_pair("oi", "1");
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn for_dates_spans_whole_days() {
        let q = HistoricalQuery::for_dates(date(2023, 1, 1), date(2023, 1, 31));
        assert_eq!(q.from.to_string(), "2023-01-01 00:00:00");
        assert_eq!(q.to.to_string(), "2023-01-31 23:59:59");
        assert!(!q.continuous);
        assert!(!q.oi);
    }

    #[test]
    fn for_dates_keeps_the_date_span_of_a_full_chunk() {
        let q = HistoricalQuery::for_dates(date(2023, 1, 1), date(2023, 3, 2));
        assert_eq!((q.to.date() - q.from.date()).num_days(), 60);
        assert_eq!((q.to - q.from).num_days(), 60);
        assert_eq!(q.to.to_string(), "2023-03-02 23:59:59");
    }

    #[test]
    fn url_carries_from_and_to() {
        let url = Url::parse("https://example.com/instruments/historical/1/day").unwrap();
        let url = HistoricalQuery::for_dates(date(2023, 1, 1), date(2023, 1, 2)).add_to_url(&url);
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("from".to_string(), "2023-01-01 00:00:00".to_string()),
                ("to".to_string(), "2023-01-02 23:59:59".to_string()),
            ]
        );
    }

    #[test]
    fn optional_flags_only_when_set() {
        let url = Url::parse("https://example.com/x").unwrap();
        let url = HistoricalQuery::for_dates(date(2023, 1, 1), date(2023, 1, 2))
            .with_continuous(true)
            .with_oi(true)
            .add_to_url(&url);
        let query = url.query().unwrap();
        assert!(query.contains("continuous=1"));
        assert!(query.contains("oi=1"));
    }
}
