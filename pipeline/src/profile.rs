//! Building profile: the request payload and the builder that assembles it
//! from partial user input.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{Error, Result};

/// Construction period of a building.
///
/// Some input surfaces offer decade buckets ("1970s", "<1940"), others a raw
/// year. Both reach the backend under the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Vintage {
    ConstructionYear(i32),
    DecadeBucket(String),
}

impl FromStr for Vintage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Validation("vintage cannot be empty".to_string()));
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            return s
                .parse()
                .map(Vintage::ConstructionYear)
                .map_err(|e| Error::Validation(format!("invalid construction year '{}': {}", s, e)));
        }
        Ok(Vintage::DecadeBucket(s.to_string()))
    }
}

/// Keys of the building profile. `key()` is the name sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    State,
    FloorAreaSqFt,
    Bedrooms,
    Vintage,
    BuildingType,
    HeatingFuel,
    Windows,
    WallInsulation,
    CountyName,
    CoolingSetpoint,
    Refrigerator,
    ClothesWasher,
}

impl ProfileField {
    pub const ALL: [ProfileField; 12] = [
        ProfileField::State,
        ProfileField::FloorAreaSqFt,
        ProfileField::Bedrooms,
        ProfileField::Vintage,
        ProfileField::BuildingType,
        ProfileField::HeatingFuel,
        ProfileField::Windows,
        ProfileField::WallInsulation,
        ProfileField::CountyName,
        ProfileField::CoolingSetpoint,
        ProfileField::Refrigerator,
        ProfileField::ClothesWasher,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ProfileField::State => "in.state",
            ProfileField::FloorAreaSqFt => "in.sqft..ft2",
            ProfileField::Bedrooms => "in.bedrooms",
            ProfileField::Vintage => "in.vintage",
            ProfileField::BuildingType => "in.geometry_building_type_recs",
            ProfileField::HeatingFuel => "in.heating_fuel",
            ProfileField::Windows => "in.windows",
            ProfileField::WallInsulation => "in.insulation_wall",
            ProfileField::CountyName => "in.county_name",
            ProfileField::CoolingSetpoint => "in.cooling_setpoint",
            ProfileField::Refrigerator => "in.refrigerator",
            ProfileField::ClothesWasher => "in.clothes_washer",
        }
    }

    /// Whether `build()` refuses a profile without this field.
    pub fn is_required(self) -> bool {
        matches!(self, ProfileField::State | ProfileField::FloorAreaSqFt)
    }
}

impl FromStr for ProfileField {
    type Err = Error;

    /// Accepts the wire key or a short alias.
    fn from_str(s: &str) -> Result<Self> {
        let field = match s.trim() {
            "in.state" | "state" => ProfileField::State,
            "in.sqft..ft2" | "sqft" | "floor_area" => ProfileField::FloorAreaSqFt,
            "in.bedrooms" | "bedrooms" => ProfileField::Bedrooms,
            "in.vintage" | "vintage" => ProfileField::Vintage,
            "in.geometry_building_type_recs" | "building_type" => ProfileField::BuildingType,
            "in.heating_fuel" | "heating_fuel" => ProfileField::HeatingFuel,
            "in.windows" | "windows" => ProfileField::Windows,
            "in.insulation_wall" | "wall_insulation" => ProfileField::WallInsulation,
            "in.county_name" | "county" => ProfileField::CountyName,
            "in.cooling_setpoint" | "cooling_setpoint" => ProfileField::CoolingSetpoint,
            "in.refrigerator" | "refrigerator" => ProfileField::Refrigerator,
            "in.clothes_washer" | "clothes_washer" => ProfileField::ClothesWasher,
            other => return Err(Error::Validation(format!("unknown profile field '{}'", other))),
        };
        Ok(field)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Validated building attributes, serialized as a flat JSON object.
///
/// Only [`ProfileBuilder::build`] produces one, so every instance has passed
/// validation. Unset optional attributes are left out of the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingProfile {
    #[serde(rename = "in.state")]
    state: String,
    #[serde(rename = "in.sqft..ft2")]
    floor_area_sq_ft: f64,
    #[serde(rename = "in.bedrooms", skip_serializing_if = "Option::is_none")]
    bedrooms: Option<u8>,
    #[serde(rename = "in.vintage", skip_serializing_if = "Option::is_none")]
    vintage: Option<Vintage>,
    #[serde(rename = "in.geometry_building_type_recs", skip_serializing_if = "Option::is_none")]
    building_type: Option<String>,
    #[serde(rename = "in.heating_fuel", skip_serializing_if = "Option::is_none")]
    heating_fuel: Option<String>,
    #[serde(rename = "in.windows", skip_serializing_if = "Option::is_none")]
    windows: Option<String>,
    #[serde(rename = "in.insulation_wall", skip_serializing_if = "Option::is_none")]
    wall_insulation: Option<String>,
    #[serde(rename = "in.county_name", skip_serializing_if = "Option::is_none")]
    county_name: Option<String>,
    #[serde(rename = "in.cooling_setpoint", skip_serializing_if = "Option::is_none")]
    cooling_setpoint: Option<String>,
    #[serde(rename = "in.refrigerator", skip_serializing_if = "Option::is_none")]
    refrigerator: Option<String>,
    #[serde(rename = "in.clothes_washer", skip_serializing_if = "Option::is_none")]
    clothes_washer: Option<String>,
}

impl BuildingProfile {
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn floor_area_sq_ft(&self) -> f64 {
        self.floor_area_sq_ft
    }

    pub fn bedrooms(&self) -> Option<u8> {
        self.bedrooms
    }

    pub fn vintage(&self) -> Option<&Vintage> {
        self.vintage.as_ref()
    }

    /// Serialize to the flat JSON object sent to the backend.
    pub fn to_payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Validate for BuildingProfile {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.state.trim().is_empty() {
            let mut error = ValidationError::new("required");
            error.message = Some(Cow::from("state is required"));
            errors.add("state", error);
        }

        if !(self.floor_area_sq_ft.is_finite() && self.floor_area_sq_ft > 0.0) {
            let mut error = ValidationError::new("positive_finite");
            error.message = Some(Cow::from("floor area must be a positive number"));
            errors.add("floor_area_sq_ft", error);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Mutable draft of a [`BuildingProfile`].
///
/// Setting a field to blank text clears it, so an included field never holds
/// an empty string.
#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    state: Option<String>,
    floor_area_sq_ft: Option<f64>,
    bedrooms: Option<u8>,
    vintage: Option<Vintage>,
    building_type: Option<String>,
    heating_fuel: Option<String>,
    windows: Option<String>,
    wall_insulation: Option<String>,
    county_name: Option<String>,
    cooling_setpoint: Option<String>,
    refrigerator: Option<String>,
    clothes_washer: Option<String>,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field from raw text input, parsing numeric fields.
    ///
    /// Blank input clears the field.
    pub fn set_field(&mut self, field: ProfileField, raw: &str) -> Result<&mut Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(self.clear_field(field));
        }

        match field {
            ProfileField::FloorAreaSqFt => {
                let area = raw.parse::<f64>().map_err(|_| {
                    Error::Validation(format!("{} must be a number, got '{}'", field, raw))
                })?;
                self.floor_area_sq_ft = Some(area);
            }
            ProfileField::Bedrooms => {
                let count = raw.parse::<u8>().map_err(|_| {
                    Error::Validation(format!("{} must be a whole number, got '{}'", field, raw))
                })?;
                self.bedrooms = Some(count);
            }
            ProfileField::Vintage => self.vintage = Some(raw.parse()?),
            text => {
                if let Some(slot) = self.text_slot(text) {
                    *slot = Some(raw.to_string());
                }
            }
        }
        Ok(self)
    }

    /// Remove a field entirely.
    pub fn clear_field(&mut self, field: ProfileField) -> &mut Self {
        match field {
            ProfileField::FloorAreaSqFt => self.floor_area_sq_ft = None,
            ProfileField::Bedrooms => self.bedrooms = None,
            ProfileField::Vintage => self.vintage = None,
            text => {
                if let Some(slot) = self.text_slot(text) {
                    *slot = None;
                }
            }
        }
        self
    }

    pub fn is_set(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::FloorAreaSqFt => self.floor_area_sq_ft.is_some(),
            ProfileField::Bedrooms => self.bedrooms.is_some(),
            ProfileField::Vintage => self.vintage.is_some(),
            ProfileField::State => self.state.is_some(),
            ProfileField::BuildingType => self.building_type.is_some(),
            ProfileField::HeatingFuel => self.heating_fuel.is_some(),
            ProfileField::Windows => self.windows.is_some(),
            ProfileField::WallInsulation => self.wall_insulation.is_some(),
            ProfileField::CountyName => self.county_name.is_some(),
            ProfileField::CoolingSetpoint => self.cooling_setpoint.is_some(),
            ProfileField::Refrigerator => self.refrigerator.is_some(),
            ProfileField::ClothesWasher => self.clothes_washer.is_some(),
        }
    }

    /// Storage for free-text fields; `None` for numeric and vintage fields.
    fn text_slot(&mut self, field: ProfileField) -> Option<&mut Option<String>> {
        match field {
            ProfileField::State => Some(&mut self.state),
            ProfileField::BuildingType => Some(&mut self.building_type),
            ProfileField::HeatingFuel => Some(&mut self.heating_fuel),
            ProfileField::Windows => Some(&mut self.windows),
            ProfileField::WallInsulation => Some(&mut self.wall_insulation),
            ProfileField::CountyName => Some(&mut self.county_name),
            ProfileField::CoolingSetpoint => Some(&mut self.cooling_setpoint),
            ProfileField::Refrigerator => Some(&mut self.refrigerator),
            ProfileField::ClothesWasher => Some(&mut self.clothes_washer),
            ProfileField::FloorAreaSqFt | ProfileField::Bedrooms | ProfileField::Vintage => None,
        }
    }

    pub fn state(&mut self, state: impl Into<String>) -> &mut Self {
        self.state = non_blank(state);
        self
    }

    pub fn floor_area_sq_ft(&mut self, area: f64) -> &mut Self {
        self.floor_area_sq_ft = Some(area);
        self
    }

    pub fn bedrooms(&mut self, count: u8) -> &mut Self {
        self.bedrooms = Some(count);
        self
    }

    pub fn vintage(&mut self, vintage: Vintage) -> &mut Self {
        self.vintage = match vintage {
            Vintage::DecadeBucket(label) => non_blank(label).map(Vintage::DecadeBucket),
            year => Some(year),
        };
        self
    }

    pub fn building_type(&mut self, value: impl Into<String>) -> &mut Self {
        self.building_type = non_blank(value);
        self
    }

    pub fn heating_fuel(&mut self, value: impl Into<String>) -> &mut Self {
        self.heating_fuel = non_blank(value);
        self
    }

    pub fn windows(&mut self, value: impl Into<String>) -> &mut Self {
        self.windows = non_blank(value);
        self
    }

    pub fn wall_insulation(&mut self, value: impl Into<String>) -> &mut Self {
        self.wall_insulation = non_blank(value);
        self
    }

    /// Snapshot the draft into a validated profile.
    pub fn build(&self) -> Result<BuildingProfile> {
        let profile = BuildingProfile {
            state: self.state.clone().unwrap_or_default(),
            floor_area_sq_ft: self.floor_area_sq_ft.unwrap_or(f64::NAN),
            bedrooms: self.bedrooms,
            vintage: self.vintage.clone(),
            building_type: self.building_type.clone(),
            heating_fuel: self.heating_fuel.clone(),
            windows: self.windows.clone(),
            wall_insulation: self.wall_insulation.clone(),
            county_name: self.county_name.clone(),
            cooling_setpoint: self.cooling_setpoint.clone(),
            refrigerator: self.refrigerator.clone(),
            clothes_washer: self.clothes_washer.clone(),
        };
        profile.validate()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> ProfileBuilder {
        let mut builder = ProfileBuilder::new();
        builder.state("CA").floor_area_sq_ft(1800.0);
        builder
    }

    #[test]
    fn test_minimal_profile_serializes_required_keys_only() {
        let payload = minimal().build().unwrap().to_payload().unwrap();
        let object = payload.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["in.state"], "CA");
        assert_eq!(object["in.sqft..ft2"], 1800.0);
    }

    #[test]
    fn test_cleared_field_is_omitted() {
        let mut builder = minimal();
        builder
            .set_field(ProfileField::HeatingFuel, "Natural Gas")
            .unwrap()
            .set_field(ProfileField::Bedrooms, "3")
            .unwrap();
        builder.clear_field(ProfileField::HeatingFuel);

        let payload = builder.build().unwrap().to_payload().unwrap();
        assert!(payload.get("in.heating_fuel").is_none());
        assert_eq!(payload["in.bedrooms"], 3);
    }

    #[test]
    fn test_blank_input_clears_instead_of_storing_empty_string() {
        let mut builder = minimal();
        builder.windows("Single, Clear, Metal");
        builder.set_field(ProfileField::Windows, "   ").unwrap();
        builder.building_type("");

        assert!(!builder.is_set(ProfileField::Windows));
        let payload = builder.build().unwrap().to_payload().unwrap();
        assert!(payload.get("in.windows").is_none());
        assert!(payload.get("in.geometry_building_type_recs").is_none());
    }

    #[test]
    fn test_missing_state_fails_validation() {
        let mut builder = ProfileBuilder::new();
        builder.floor_area_sq_ft(1200.0);
        match builder.build() {
            Err(Error::Validation(message)) => assert!(message.contains("state is required")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_floor_area_must_be_positive_and_finite() {
        for area in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let mut builder = ProfileBuilder::new();
            builder.state("TX").floor_area_sq_ft(area);
            assert!(
                matches!(builder.build(), Err(Error::Validation(_))),
                "area {} should be rejected",
                area
            );
        }

        let mut builder = ProfileBuilder::new();
        builder.state("TX");
        assert!(matches!(builder.build(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_non_numeric_floor_area_is_rejected_at_input() {
        let mut builder = ProfileBuilder::new();
        let err = builder
            .set_field(ProfileField::FloorAreaSqFt, "big")
            .unwrap_err();
        assert!(err.to_string().contains("must be a number"));
    }

    #[test]
    fn test_vintage_variants_serialize_as_year_or_label() {
        assert_eq!("1990".parse::<Vintage>().unwrap(), Vintage::ConstructionYear(1990));
        assert_eq!(
            "1970s".parse::<Vintage>().unwrap(),
            Vintage::DecadeBucket("1970s".to_string())
        );

        let mut builder = minimal();
        builder.set_field(ProfileField::Vintage, "<1940").unwrap();
        let payload = builder.build().unwrap().to_payload().unwrap();
        assert_eq!(payload["in.vintage"], "<1940");

        builder.vintage(Vintage::ConstructionYear(2005));
        let payload = builder.build().unwrap().to_payload().unwrap();
        assert_eq!(payload["in.vintage"], 2005);
    }

    #[test]
    fn test_enumeration_membership_is_not_enforced() {
        let mut builder = minimal();
        builder.heating_fuel("Geothermal");
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_field_names_parse_from_key_or_alias() {
        for field in ProfileField::ALL {
            assert_eq!(field.key().parse::<ProfileField>().unwrap(), field);
        }
        assert_eq!("sqft".parse::<ProfileField>().unwrap(), ProfileField::FloorAreaSqFt);
        assert!("colour".parse::<ProfileField>().is_err());
    }
}
