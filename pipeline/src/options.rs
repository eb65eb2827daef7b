//! Option lists offered by the input surface.
//!
//! The builder does not check values against these lists; hosts use them to
//! present the same choices the forecasting backend was trained on and to
//! flag values it has never seen (see [`is_known`]).

use crate::profile::ProfileField;

/// US state and territory codes.
pub const STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH",
    "NJ", "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY", "PR",
];

/// Decade buckets accepted for `in.vintage`.
pub const VINTAGE_BUCKETS: &[&str] = &[
    "<1940", "1940s", "1950s", "1960s", "1970s", "1980s", "1990s", "2000s", "2010s",
];

pub const BUILDING_TYPES: &[&str] = &[
    "Mobile Home",
    "Multi-Family with 2 - 4 Units",
    "Multi-Family with 5+ Units",
    "Single-Family Attached",
    "Single-Family Detached",
];

pub const HEATING_FUELS: &[&str] = &[
    "Electricity",
    "Fuel Oil",
    "Natural Gas",
    "None",
    "Other Fuel",
    "Propane",
];

pub const WINDOW_TYPES: &[&str] = &[
    "Double, Clear, Metal, Air",
    "Double, Clear, Metal, Air, Exterior Clear Storm",
    "Double, Clear, Non-metal, Air",
    "Double, Clear, Non-metal, Air, Exterior Clear Storm",
    "Double, Low-E, Non-metal, Air, M-Gain",
    "Single, Clear, Metal",
    "Single, Clear, Metal, Exterior Clear Storm",
    "Single, Clear, Non-metal",
    "Single, Clear, Non-metal, Exterior Clear Storm",
    "Triple, Low-E, Non-metal, Air, L-Gain",
];

pub const WALL_INSULATION: &[&str] = &[
    "Brick, 12-in, 3-wythe, R-11",
    "Brick, 12-in, 3-wythe, R-15",
    "Brick, 12-in, 3-wythe, R-19",
    "Brick, 12-in, 3-wythe, Uninsulated",
    "CMU, 6-in Hollow, R-7",
    "CMU, 6-in Hollow, R-11",
    "CMU, 6-in Hollow, R-15",
    "CMU, 6-in Hollow, R-19",
    "CMU, 6-in Hollow, Uninsulated",
    "Wood Stud, R-7",
    "Wood Stud, R-11",
    "Wood Stud, R-15",
    "Wood Stud, R-19",
    "Wood Stud, Uninsulated",
];

/// Choices offered for `field`, or `None` for free-form fields.
pub fn choices(field: ProfileField) -> Option<&'static [&'static str]> {
    match field {
        ProfileField::State => Some(STATE_CODES),
        ProfileField::Vintage => Some(VINTAGE_BUCKETS),
        ProfileField::BuildingType => Some(BUILDING_TYPES),
        ProfileField::HeatingFuel => Some(HEATING_FUELS),
        ProfileField::Windows => Some(WINDOW_TYPES),
        ProfileField::WallInsulation => Some(WALL_INSULATION),
        _ => None,
    }
}

/// Whether `value` is one of the offered choices for `field`.
///
/// Free-form fields accept anything, and a numeric construction year is a
/// valid vintage. State codes compare case-insensitively.
pub fn is_known(field: ProfileField, value: &str) -> bool {
    let value = value.trim();
    match (field, choices(field)) {
        (ProfileField::Vintage, _) if value.chars().all(|c| c.is_ascii_digit()) => true,
        (ProfileField::State, Some(codes)) => codes.iter().any(|c| c.eq_ignore_ascii_case(value)),
        (_, Some(list)) => list.contains(&value),
        (_, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_known() {
        assert!(is_known(ProfileField::State, "il"));
        assert!(!is_known(ProfileField::State, "ZZ"));
        assert!(is_known(ProfileField::Vintage, "1970s"));
        assert!(is_known(ProfileField::Vintage, "1987"));
        assert!(!is_known(ProfileField::Vintage, "1970ies"));
        assert!(is_known(ProfileField::HeatingFuel, "Natural Gas"));
        assert!(!is_known(ProfileField::HeatingFuel, "Natural gas "));
        assert!(is_known(ProfileField::CountyName, "Cook County"));
        assert_eq!(choices(ProfileField::Bedrooms), None);
    }

    #[test]
    fn test_category_counts() {
        assert_eq!(BUILDING_TYPES.len(), 5);
        assert_eq!(HEATING_FUELS.len(), 6);
        assert_eq!(WINDOW_TYPES.len(), 10);
        assert_eq!(WALL_INSULATION.len(), 14);
    }
}
