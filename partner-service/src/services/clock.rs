use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::{Arc, Mutex};

/// Source of "now" and "today" for contract-window decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date at the configured business offset.
    fn today(&self) -> NaiveDate;
}

/// Wall clock pinned to a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset_hours: i32) -> Result<Self, anyhow::Error> {
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| anyhow::anyhow!("Invalid UTC offset: {} hours", offset_hours))?;
        Ok(Self { offset })
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    inner: Arc<Mutex<(DateTime<Utc>, NaiveDate)>>,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        let now = today.and_hms_opt(9, 0, 0).unwrap_or_default().and_utc();
        Self {
            inner: Arc::new(Mutex::new((now, today))),
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        let now = today.and_hms_opt(9, 0, 0).unwrap_or_default().and_utc();
        if let Ok(mut guard) = self.inner.lock() {
            *guard = (now, today);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.inner
            .lock()
            .map(|guard| guard.0)
            .unwrap_or_else(|poisoned| poisoned.into_inner().0)
    }

    fn today(&self) -> NaiveDate {
        self.inner
            .lock()
            .map(|guard| guard.1)
            .unwrap_or_else(|poisoned| poisoned.into_inner().1)
    }
}
