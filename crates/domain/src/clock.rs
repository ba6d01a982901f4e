//! # 時刻
//!
//! 通知の `email_sent_at` と招待の有効期限はすべて [`Clock`] から得た時刻で決める。

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// OS の時刻
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 手動で進める時計（テスト用）
///
/// 招待の期限切れのように「時間が経った後」の振る舞いを確かめるときは
/// [`FixedClock::advance`] で進める。
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_進めるまで時刻は変わらない() {
        let clock = FixedClock::new(epoch());

        assert_eq!(clock.now(), epoch());
        assert_eq!(clock.now(), epoch());
    }

    #[test]
    fn test_進めた分だけ時刻が進む() {
        let clock = FixedClock::new(epoch());

        clock.advance(Duration::days(7));
        clock.advance(Duration::hours(1));

        assert_eq!(clock.now(), epoch() + Duration::days(7) + Duration::hours(1));
    }

    #[test]
    fn test_システム時刻は単調に読める() {
        let first = SystemClock.now();
        assert!(SystemClock.now() >= first);
    }
}
