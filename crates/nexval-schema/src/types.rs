//! # Logical Types, Unit Categories, and Requirements
//!
//! The closed vocabularies a definition uses to constrain a node. Names
//! serialize exactly as NXDL spells them (`NX_FLOAT`, `NX_LENGTH`, ...),
//! so definition files can be transcribed from NXDL without renaming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// NeXus logical data type of a field or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NexusType {
    #[serde(rename = "NX_CHAR")]
    Char,
    /// ISO 8601 date-time string. `ISO8601` is accepted as an alias.
    #[serde(rename = "NX_DATE_TIME", alias = "ISO8601")]
    DateTime,
    #[serde(rename = "NX_NUMBER")]
    Number,
    #[serde(rename = "NX_INT")]
    Int,
    #[serde(rename = "NX_POSINT")]
    PosInt,
    #[serde(rename = "NX_UINT")]
    UInt,
    #[serde(rename = "NX_FLOAT")]
    Float,
    #[serde(rename = "NX_BOOLEAN")]
    Boolean,
    #[serde(rename = "NX_COMPLEX")]
    Complex,
    #[serde(rename = "NX_BINARY")]
    Binary,
    #[serde(rename = "NX_CHAR_OR_NUMBER")]
    CharOrNumber,
}

impl NexusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "NX_CHAR",
            Self::DateTime => "NX_DATE_TIME",
            Self::Number => "NX_NUMBER",
            Self::Int => "NX_INT",
            Self::PosInt => "NX_POSINT",
            Self::UInt => "NX_UINT",
            Self::Float => "NX_FLOAT",
            Self::Boolean => "NX_BOOLEAN",
            Self::Complex => "NX_COMPLEX",
            Self::Binary => "NX_BINARY",
            Self::CharOrNumber => "NX_CHAR_OR_NUMBER",
        }
    }
}

impl fmt::Display for NexusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse physical-dimension class a field's `units` must belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    #[serde(rename = "NX_ANGLE")]
    Angle,
    #[serde(rename = "NX_ANY")]
    Any,
    #[serde(rename = "NX_AREA")]
    Area,
    #[serde(rename = "NX_CHARGE")]
    Charge,
    #[serde(rename = "NX_COUNT")]
    Count,
    #[serde(rename = "NX_CROSS_SECTION")]
    CrossSection,
    #[serde(rename = "NX_CURRENT")]
    Current,
    #[serde(rename = "NX_DIMENSIONLESS")]
    Dimensionless,
    #[serde(rename = "NX_EMITTANCE")]
    Emittance,
    #[serde(rename = "NX_ENERGY")]
    Energy,
    #[serde(rename = "NX_FLUX")]
    Flux,
    #[serde(rename = "NX_FREQUENCY")]
    Frequency,
    #[serde(rename = "NX_LENGTH")]
    Length,
    #[serde(rename = "NX_MASS")]
    Mass,
    #[serde(rename = "NX_MASS_DENSITY")]
    MassDensity,
    #[serde(rename = "NX_MOLECULAR_WEIGHT")]
    MolecularWeight,
    #[serde(rename = "NX_PERIOD")]
    Period,
    #[serde(rename = "NX_PER_AREA")]
    PerArea,
    #[serde(rename = "NX_PER_LENGTH")]
    PerLength,
    #[serde(rename = "NX_POWER")]
    Power,
    #[serde(rename = "NX_PRESSURE")]
    Pressure,
    #[serde(rename = "NX_PULSES")]
    Pulses,
    #[serde(rename = "NX_SCATTERING_LENGTH_DENSITY")]
    ScatteringLengthDensity,
    #[serde(rename = "NX_SOLID_ANGLE")]
    SolidAngle,
    #[serde(rename = "NX_TEMPERATURE")]
    Temperature,
    #[serde(rename = "NX_TIME")]
    Time,
    #[serde(rename = "NX_TIME_OF_FLIGHT")]
    TimeOfFlight,
    #[serde(rename = "NX_TRANSFORMATION")]
    Transformation,
    #[serde(rename = "NX_UNITLESS")]
    Unitless,
    #[serde(rename = "NX_VOLTAGE")]
    Voltage,
    #[serde(rename = "NX_VOLUME")]
    Volume,
    #[serde(rename = "NX_WAVELENGTH")]
    Wavelength,
    #[serde(rename = "NX_WAVENUMBER")]
    Wavenumber,
}

impl UnitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Angle => "NX_ANGLE",
            Self::Any => "NX_ANY",
            Self::Area => "NX_AREA",
            Self::Charge => "NX_CHARGE",
            Self::Count => "NX_COUNT",
            Self::CrossSection => "NX_CROSS_SECTION",
            Self::Current => "NX_CURRENT",
            Self::Dimensionless => "NX_DIMENSIONLESS",
            Self::Emittance => "NX_EMITTANCE",
            Self::Energy => "NX_ENERGY",
            Self::Flux => "NX_FLUX",
            Self::Frequency => "NX_FREQUENCY",
            Self::Length => "NX_LENGTH",
            Self::Mass => "NX_MASS",
            Self::MassDensity => "NX_MASS_DENSITY",
            Self::MolecularWeight => "NX_MOLECULAR_WEIGHT",
            Self::Period => "NX_PERIOD",
            Self::PerArea => "NX_PER_AREA",
            Self::PerLength => "NX_PER_LENGTH",
            Self::Power => "NX_POWER",
            Self::Pressure => "NX_PRESSURE",
            Self::Pulses => "NX_PULSES",
            Self::ScatteringLengthDensity => "NX_SCATTERING_LENGTH_DENSITY",
            Self::SolidAngle => "NX_SOLID_ANGLE",
            Self::Temperature => "NX_TEMPERATURE",
            Self::Time => "NX_TIME",
            Self::TimeOfFlight => "NX_TIME_OF_FLIGHT",
            Self::Transformation => "NX_TRANSFORMATION",
            Self::Unitless => "NX_UNITLESS",
            Self::Voltage => "NX_VOLTAGE",
            Self::Volume => "NX_VOLUME",
            Self::Wavelength => "NX_WAVELENGTH",
            Self::Wavenumber => "NX_WAVENUMBER",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strongly a definition asks for a node.
///
/// Application definitions make nodes required unless stated otherwise,
/// hence the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requirement {
    #[default]
    Required,
    Recommended,
    Optional,
}

impl Requirement {
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }
}
