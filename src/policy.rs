//! Office-hours policy: window membership, late thresholds and worked-hours
//! arithmetic. All functions take facility-local wall-clock values; callers
//! convert UTC instants with the configured facility offset first.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Nominal office span, 9h10m, used as the hard ceiling on daily hours.
pub const MAX_DAILY_HOURS: Decimal = dec!(9.17);

pub fn office_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

pub fn office_end() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 40, 0).unwrap()
}

/// Arrivals strictly after this require a submitted reason.
pub fn late_threshold() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

/// Punch-outs strictly after this require a submitted reason.
pub fn punch_out_threshold() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 30, 0).unwrap()
}

/// Office window is half-open: [09:30, 18:40).
pub fn within_office_window(t: NaiveTime) -> bool {
    t >= office_start() && t < office_end()
}

pub fn is_weekend(d: NaiveDate) -> bool {
    matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_late_punch_in(t: NaiveTime) -> bool {
    t > late_threshold()
}

pub fn requires_punch_out_reason(t: NaiveTime) -> bool {
    t > punch_out_threshold()
}

/// Worked hours for a login/logout pair: both instants are clamped into the
/// office window of the login day before differencing, the result is capped
/// at [`MAX_DAILY_HOURS`] and rounded to 2 decimal places, half-up.
pub fn worked_hours(login: NaiveDateTime, logout: NaiveDateTime) -> Decimal {
    let day = login.date();
    let window_start = day.and_time(office_start());
    let window_end = day.and_time(office_end());

    let clamped_login = login.max(window_start);
    let clamped_logout = logout.min(window_end);

    if clamped_logout <= clamped_login {
        return Decimal::ZERO;
    }

    let secs = (clamped_logout - clamped_login).num_seconds();
    round_hours(secs).min(MAX_DAILY_HOURS)
}

/// Raw punch-cycle hours: elapsed seconds to 2 decimal places, unclamped.
pub fn punch_hours(elapsed_secs: i64) -> Decimal {
    round_hours(elapsed_secs)
}

fn round_hours(secs: i64) -> Decimal {
    (Decimal::from(secs) / dec!(3600))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Elapsed seconds floored into `HH:MM:SS`.
pub fn elapsed_hms(elapsed_secs: i64) -> String {
    let secs = elapsed_secs.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn window_is_half_open() {
        assert!(within_office_window(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert!(within_office_window(NaiveTime::from_hms_opt(18, 39, 59).unwrap()));
        assert!(!within_office_window(NaiveTime::from_hms_opt(18, 40, 0).unwrap()));
        assert!(!within_office_window(NaiveTime::from_hms_opt(9, 29, 59).unwrap()));
    }

    #[test]
    fn weekend_detection() {
        // 2025-06-14 is a Saturday.
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()));
    }

    #[test]
    fn late_threshold_is_exclusive() {
        assert!(!is_late_punch_in(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert!(is_late_punch_in(NaiveTime::from_hms_opt(9, 31, 0).unwrap()));
    }

    #[test]
    fn punch_out_reason_after_threshold() {
        assert!(!requires_punch_out_reason(NaiveTime::from_hms_opt(18, 30, 0).unwrap()));
        assert!(requires_punch_out_reason(NaiveTime::from_hms_opt(18, 31, 0).unwrap()));
        assert!(requires_punch_out_reason(NaiveTime::from_hms_opt(19, 0, 0).unwrap()));
    }

    #[test]
    fn full_day_is_clamped_to_cap() {
        // Login before the window, logout after it: 09:30-18:40 = 9h10m.
        let h = worked_hours(dt(2025, 6, 16, 9, 25), dt(2025, 6, 16, 19, 0));
        assert_eq!(h, dec!(9.17));
    }

    #[test]
    fn mid_day_session() {
        let h = worked_hours(dt(2025, 6, 16, 10, 0), dt(2025, 6, 16, 16, 0));
        assert_eq!(h, dec!(6.00));
    }

    #[test]
    fn logout_before_window_yields_zero() {
        let h = worked_hours(dt(2025, 6, 16, 8, 0), dt(2025, 6, 16, 9, 0));
        assert_eq!(h, Decimal::ZERO);
    }

    #[test]
    fn rounding_is_half_up() {
        // 7h33m = 7.55h exactly; 1m = 0.0166..h rounds to 0.02.
        assert_eq!(
            worked_hours(dt(2025, 6, 16, 10, 0), dt(2025, 6, 16, 17, 33)),
            dec!(7.55)
        );
        assert_eq!(punch_hours(60), dec!(0.02));
    }

    #[test]
    fn hms_floors_seconds() {
        assert_eq!(elapsed_hms(0), "00:00:00");
        assert_eq!(elapsed_hms(59), "00:00:59");
        assert_eq!(elapsed_hms(3661), "01:01:01");
        assert_eq!(elapsed_hms(9 * 3600 + 10 * 60), "09:10:00");
    }
}
