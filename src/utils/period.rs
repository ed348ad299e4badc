//! 预算周期窗口计算
//!
//! 周期以预算的 `start_date` 为锚点切分：第 n 个周期为
//! `[anchor + n * period, anchor + (n + 1) * period)`。
//! 月 / 年周期始终从锚点重新计算，因此 1 月 31 日开始的预算
//! 在 2 月落到 28/29 日，到 3 月仍回到 31 日。

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::storage::models::BudgetPeriod;

/// 半开区间 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// 区间最后一天（含）
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.end)
    }
}

/// 计算 `on` 所在的周期窗口；`on` 早于锚点时返回第一个周期
pub fn period_window(period: BudgetPeriod, anchor: NaiveDate, on: NaiveDate) -> PeriodWindow {
    match period {
        BudgetPeriod::Weekly => {
            let index = if on < anchor {
                0
            } else {
                (on - anchor).num_days() / 7
            };
            let start = anchor + Duration::days(index * 7);
            PeriodWindow {
                start,
                end: start + Duration::days(7),
            }
        }
        BudgetPeriod::Monthly => month_window(anchor, on, 1),
        BudgetPeriod::Yearly => month_window(anchor, on, 12),
    }
}

fn month_window(anchor: NaiveDate, on: NaiveDate, step: u32) -> PeriodWindow {
    let mut index = if on < anchor {
        0
    } else {
        let months = (on.year() - anchor.year()) * 12 + on.month() as i32 - anchor.month() as i32;
        (months.max(0) as u32) / step
    };

    // 月末截断可能让估算的起点落在 on 之后，回退一个周期
    while index > 0 && add_months(anchor, index * step) > on {
        index -= 1;
    }

    PeriodWindow {
        start: add_months(anchor, index * step),
        end: add_months(anchor, (index + 1) * step),
    }
}

/// 按日历月相加，日期超出目标月长度时截断到月末
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
