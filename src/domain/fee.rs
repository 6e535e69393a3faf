use thiserror::Error;

use crate::domain::slot_status::TimestampMs;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Faculty,
    Staff,
    Visitor,
}

impl Role {
    /// Unrecognized role strings map to `None`, which bills at the standard
    /// multiplier of 1.0.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "faculty" => Some(Self::Faculty),
            "staff" => Some(Self::Staff),
            "visitor" => Some(Self::Visitor),
            _ => None,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::Student => 1.0,
            Self::Faculty => 0.5,
            Self::Staff => 0.7,
            Self::Visitor => 1.2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Staff => "staff",
            Self::Visitor => "visitor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub duration_hours: i64,
    pub base_fee: i64,
    pub discount: i64,
    pub total_fee: i64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FeeError {
    #[error("exit time cannot be before entry time")]
    InvalidInterval,
}

/// Computes the fee for one closed session. Duration bills in whole hours
/// rounded up, with a floor of one hour. `discount` is signed: the visitor
/// surcharge makes it negative.
pub fn calculate_fee(
    entry_time: TimestampMs,
    exit_time: TimestampMs,
    hourly_rate: i64,
    role: Option<Role>,
) -> Result<FeeBreakdown, FeeError> {
    let duration_ms = exit_time.0 - entry_time.0;
    if duration_ms < 0 {
        return Err(FeeError::InvalidInterval);
    }

    let duration_hours = ((duration_ms as u64).div_ceil(MS_PER_HOUR as u64) as i64).max(1);
    let base_fee = duration_hours * hourly_rate;
    let multiplier = role.map_or(1.0, Role::multiplier);
    let total_fee = (base_fee as f64 * multiplier).round() as i64;

    Ok(FeeBreakdown {
        duration_hours,
        base_fee,
        discount: base_fee - total_fee,
        total_fee,
    })
}

#[cfg(test)]
mod tests {
    use super::{FeeBreakdown, FeeError, Role, calculate_fee};
    use crate::domain::slot_status::TimestampMs;

    const T10_00: TimestampMs = TimestampMs(1_735_725_600_000);

    fn minutes_after(start: TimestampMs, minutes: i64) -> TimestampMs {
        TimestampMs(start.0 + minutes * 60_000)
    }

    #[test]
    fn five_minute_stay_bills_one_hour_at_standard_rate() {
        let fee = calculate_fee(T10_00, minutes_after(T10_00, 5), 5000, Some(Role::Student))
            .expect("fee must compute");

        assert_eq!(
            fee,
            FeeBreakdown {
                duration_hours: 1,
                base_fee: 5000,
                discount: 0,
                total_fee: 5000,
            }
        );
    }

    #[test]
    fn faculty_pays_half_over_rounded_up_hours() {
        let fee = calculate_fee(
            T10_00,
            minutes_after(T10_00, 210),
            5000,
            Some(Role::Faculty),
        )
        .expect("fee must compute");

        assert_eq!(
            fee,
            FeeBreakdown {
                duration_hours: 4,
                base_fee: 20000,
                discount: 10000,
                total_fee: 10000,
            }
        );
    }

    #[test]
    fn visitor_surcharge_yields_negative_discount() {
        let fee = calculate_fee(T10_00, minutes_after(T10_00, 30), 5000, Some(Role::Visitor))
            .expect("fee must compute");

        assert_eq!(
            fee,
            FeeBreakdown {
                duration_hours: 1,
                base_fee: 5000,
                discount: -1000,
                total_fee: 6000,
            }
        );
    }

    #[test]
    fn staff_multiplier_rounds_total() {
        let fee = calculate_fee(T10_00, minutes_after(T10_00, 90), 2500, Some(Role::Staff))
            .expect("fee must compute");

        assert_eq!(fee.duration_hours, 2);
        assert_eq!(fee.base_fee, 5000);
        assert_eq!(fee.total_fee, 3500);
        assert_eq!(fee.discount, 1500);
    }

    #[test]
    fn absent_role_bills_standard_rate() {
        let fee =
            calculate_fee(T10_00, minutes_after(T10_00, 61), 5000, None).expect("fee must compute");

        assert_eq!(fee.duration_hours, 2);
        assert_eq!(fee.total_fee, 10000);
        assert_eq!(fee.discount, 0);
    }

    #[test]
    fn exact_hour_boundary_does_not_round_up() {
        let fee = calculate_fee(T10_00, minutes_after(T10_00, 120), 5000, Some(Role::Student))
            .expect("fee must compute");

        assert_eq!(fee.duration_hours, 2);
    }

    #[test]
    fn zero_duration_still_bills_minimum_hour() {
        let fee = calculate_fee(T10_00, T10_00, 5000, Some(Role::Student))
            .expect("fee must compute");

        assert_eq!(fee.duration_hours, 1);
        assert_eq!(fee.total_fee, 5000);
    }

    #[test]
    fn exit_before_entry_is_rejected_for_any_role() {
        for role in [
            None,
            Some(Role::Student),
            Some(Role::Faculty),
            Some(Role::Staff),
            Some(Role::Visitor),
        ] {
            let result = calculate_fee(T10_00, minutes_after(T10_00, -1), 5000, role);
            assert_eq!(result, Err(FeeError::InvalidInterval));
        }
    }

    #[test]
    fn parses_roles_case_insensitively() {
        assert_eq!(Role::parse("Faculty"), Some(Role::Faculty));
        assert_eq!(Role::parse("VISITOR"), Some(Role::Visitor));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse(""), None);
    }
}
