//! Answer grading and history analysis

pub mod evaluator;
pub mod history;

pub use evaluator::{evaluate, is_correct};
pub use history::{
    adjust_to_monday, calendar_days, earliest_date, group_by_week, load_all, CalendarDay,
    ProviderHistory,
};
