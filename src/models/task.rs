use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::space::CandidateSpace;

/// 计划时间的持久化格式（分钟精度）
pub const SCHEDULE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// 到期窗口长度：计划时间起一分钟内视为到期
const DUE_WINDOW_MINUTES: i64 = 1;

/// 任务重复周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::None
    }
}

impl Recurrence {
    pub fn label(&self) -> &'static str {
        match self {
            Recurrence::None => "一次性",
            Recurrence::Daily => "每天",
            Recurrence::Weekly => "每周",
            Recurrence::Monthly => "每月",
        }
    }
}

/// 定时答题任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub url: String,
    /// 执行任务所用账号的标识；凭据本身由凭据存储管理
    #[serde(default)]
    pub email: String,
    pub space: CandidateSpace,
    #[serde(with = "schedule_datetime")]
    pub scheduled_at: NaiveDateTime,
    #[serde(default)]
    pub recurrence: Recurrence,
}

impl Task {
    /// 构造立即执行的一次性任务
    pub fn one_shot(
        url: impl Into<String>,
        email: impl Into<String>,
        space: CandidateSpace,
        now: NaiveDateTime,
    ) -> Self {
        Task {
            id: Uuid::new_v4(),
            url: url.into(),
            email: email.into(),
            space,
            scheduled_at: now,
            recurrence: Recurrence::None,
        }
    }

    /// 任务是否落在到期窗口内（[scheduled_at, scheduled_at + 1 分钟)）
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.scheduled_at && now < self.scheduled_at + Duration::minutes(DUE_WINDOW_MINUTES)
    }

    /// 计算下一次执行时间；一次性任务返回 None（应当从任务表移除）
    pub fn advanced_schedule(&self) -> Option<NaiveDateTime> {
        match self.recurrence {
            Recurrence::None => None,
            Recurrence::Daily => Some(self.scheduled_at + Duration::days(1)),
            Recurrence::Weekly => Some(self.scheduled_at + Duration::weeks(1)),
            Recurrence::Monthly => Some(advance_one_month(self.scheduled_at)),
        }
    }
}

/// 月度推进：月份 +1，目标月份没有同一天时退到 1 号
fn advance_one_month(at: NaiveDateTime) -> NaiveDateTime {
    let (mut year, mut month) = (at.year(), at.month());
    if month == 12 {
        year += 1;
        month = 1;
    } else {
        month += 1;
    }
    let date = NaiveDate::from_ymd_opt(year, month, at.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 1))
        .unwrap_or_else(|| at.date());
    date.and_time(at.time())
}

/// 计划时间的 serde 适配（`YYYY-MM-DD HH:MM`）
pub mod schedule_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::error::ScheduleError;

    use super::SCHEDULE_DATETIME_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(SCHEDULE_DATETIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, SCHEDULE_DATETIME_FORMAT)
            .map_err(|_| serde::de::Error::custom(ScheduleError::BadDatetime { value: raw }))
    }
}
