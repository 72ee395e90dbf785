//! Subscription entitlement carried by a profile record.

use chrono::{DateTime, NaiveDateTime, Utc};
use quotagate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Entitlement fields read from a profile record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntitlement {
    /// Permanent flag maintained by billing webhooks.
    #[serde(default)]
    pub is_pro: bool,
    /// Optional time-boxed grant, as stored by the profile backend.
    #[serde(default)]
    pub pro_expires_at: Option<String>,
}

impl ProfileEntitlement {
    /// Evaluates whether the profile grants unmetered access at `now`.
    ///
    /// `is_pro` wins over any expiry value. Otherwise the grant is active only
    /// while `pro_expires_at` lies strictly after `now`. Returns a validation
    /// error when the expiry cannot be parsed; callers treat that as metered.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> AppResult<bool> {
        if self.is_pro {
            return Ok(true);
        }

        match self.pro_expires_at.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let expires_at = parse_profile_timestamp(raw)?;
                Ok(expires_at > now)
            }
            _ => Ok(false),
        }
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const HOUR_OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Parses a profile timestamp into UTC.
///
/// Accepts RFC 3339 (`Z` or numeric offset), PostgreSQL style hour-only
/// offsets (`+00`) and zone-less values, which are taken as UTC.
pub fn parse_profile_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in HOUR_OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc());
        }
    }

    Err(AppError::Validation(format!(
        "unrecognized profile timestamp '{value}'"
    )))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, SecondsFormat, TimeZone, Utc};

    use super::{ProfileEntitlement, parse_profile_timestamp};

    fn expiring(raw: String) -> ProfileEntitlement {
        ProfileEntitlement {
            is_pro: false,
            pro_expires_at: Some(raw),
        }
    }

    #[test]
    fn permanent_flag_ignores_expiry() {
        let now = Utc::now();
        let profile = ProfileEntitlement {
            is_pro: true,
            pro_expires_at: Some("not a timestamp".to_owned()),
        };
        assert!(matches!(profile.is_active_at(now), Ok(true)));
    }

    #[test]
    fn no_flag_and_no_expiry_is_metered() {
        assert!(matches!(
            ProfileEntitlement::default().is_active_at(Utc::now()),
            Ok(false)
        ));
    }

    #[test]
    fn expiry_one_second_ahead_or_behind_with_offset() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
        let ahead = (now + Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Secs, false);
        let behind = (now - Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Secs, false);
        assert!(ahead.ends_with("+00:00"));

        assert!(matches!(expiring(ahead).is_active_at(now), Ok(true)));
        assert!(matches!(expiring(behind).is_active_at(now), Ok(false)));
    }

    #[test]
    fn expiry_one_second_ahead_or_behind_with_z_suffix() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
        let ahead = (now + Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Micros, true);
        let behind = (now - Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Micros, true);
        assert!(ahead.ends_with('Z'));

        assert!(matches!(expiring(ahead).is_active_at(now), Ok(true)));
        assert!(matches!(expiring(behind).is_active_at(now), Ok(false)));
    }

    #[test]
    fn expiry_equal_to_now_is_not_active() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
        let profile = expiring("2024-01-01T12:00:00Z".to_owned());
        assert!(matches!(profile.is_active_at(now), Ok(false)));
    }

    #[test]
    fn naive_timestamps_are_taken_as_utc() {
        let parsed = parse_profile_timestamp("2024-03-05T06:07:08.250");
        let expected = Utc
            .with_ymd_and_hms(2024, 3, 5, 6, 7, 8)
            .single()
            .map(|value| value + Duration::milliseconds(250));
        assert_eq!(parsed.ok(), expected);

        let spaced = parse_profile_timestamp("2024-03-05 06:07:08");
        assert_eq!(
            spaced.ok(),
            Utc.with_ymd_and_hms(2024, 3, 5, 6, 7, 8).single()
        );
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed = parse_profile_timestamp("2024-03-05T08:00:00+02:00");
        assert_eq!(parsed.ok(), Utc.with_ymd_and_hms(2024, 3, 5, 6, 0, 0).single());

        let postgres = parse_profile_timestamp("2024-03-05 06:00:00.123456+00");
        assert!(postgres.is_ok());
    }

    #[test]
    fn garbage_expiry_is_a_validation_error() {
        let profile = expiring("next tuesday".to_owned());
        assert!(profile.is_active_at(Utc::now()).is_err());
    }
}
