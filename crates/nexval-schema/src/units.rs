//! # Unit Strings and Categories
//!
//! Parses a field's `units` attribute into a physical dimension and decides
//! whether that dimension belongs to a [`UnitCategory`].
//!
//! Supported notation covers what NeXus writers emit in practice:
//!
//! - SI base and derived symbols with SI prefixes (`mm`, `keV`, `mrad`, `kPa`).
//! - Common non-SI units (`Angstrom`/`Å`, `deg`, `barn`, `bar`, `Torr`, `eV`,
//!   `min`, `h`, `counts`).
//! - Products with `*`, `.`, `·` or spaces; quotients with `/`; one level of
//!   parentheses; exponents as `^2`, `**2`, or attached digits (`m2`, `s-1`).
//!
//! Angles carry their own dimension so that `NX_ANGLE` and
//! `NX_DIMENSIONLESS` can be told apart. Counts are dimensionless.

use std::fmt;

use thiserror::Error;

use crate::types::UnitCategory;

const LENGTH: usize = 0;
const MASS: usize = 1;
const TIME: usize = 2;
const CURRENT: usize = 3;
const TEMPERATURE: usize = 4;
const AMOUNT: usize = 5;
const ANGLE: usize = 6;

const AXIS_SYMBOLS: [&str; 7] = ["L", "M", "T", "I", "Θ", "N", "A"];

/// Exponents of the base dimensions length, mass, time, current,
/// temperature, amount of substance, and plane angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension([i8; 7]);

impl Dimension {
    pub const NONE: Dimension = Dimension([0; 7]);

    const fn base(axis: usize) -> Self {
        let mut d = [0; 7];
        d[axis] = 1;
        Dimension(d)
    }

    const fn of(exponents: [i8; 7]) -> Self {
        Dimension(exponents)
    }

    fn mul(self, other: Dimension) -> Self {
        let mut d = self.0;
        for (a, b) in d.iter_mut().zip(other.0) {
            *a += b;
        }
        Dimension(d)
    }

    fn pow(self, n: i8) -> Self {
        let mut d = self.0;
        for a in d.iter_mut() {
            *a *= n;
        }
        Dimension(d)
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return f.write_str("1");
        }
        let mut first = true;
        for (symbol, exp) in AXIS_SYMBOLS.iter().zip(self.0) {
            if exp == 0 {
                continue;
            }
            if !first {
                f.write_str("·")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{exp}")?;
            }
        }
        Ok(())
    }
}

// ─── Unit Table ──────────────────────────────────────────────────────

const LENGTH_DIM: Dimension = Dimension::base(LENGTH);
const MASS_DIM: Dimension = Dimension::base(MASS);
const TIME_DIM: Dimension = Dimension::base(TIME);
const CURRENT_DIM: Dimension = Dimension::base(CURRENT);
const TEMPERATURE_DIM: Dimension = Dimension::base(TEMPERATURE);
const AMOUNT_DIM: Dimension = Dimension::base(AMOUNT);
const ANGLE_DIM: Dimension = Dimension::base(ANGLE);

const AREA: Dimension = Dimension::of([2, 0, 0, 0, 0, 0, 0]);
const VOLUME: Dimension = Dimension::of([3, 0, 0, 0, 0, 0, 0]);
const PER_LENGTH: Dimension = Dimension::of([-1, 0, 0, 0, 0, 0, 0]);
const PER_AREA: Dimension = Dimension::of([-2, 0, 0, 0, 0, 0, 0]);
const FREQUENCY: Dimension = Dimension::of([0, 0, -1, 0, 0, 0, 0]);
const FORCE: Dimension = Dimension::of([1, 1, -2, 0, 0, 0, 0]);
const ENERGY: Dimension = Dimension::of([2, 1, -2, 0, 0, 0, 0]);
const PRESSURE: Dimension = Dimension::of([-1, 1, -2, 0, 0, 0, 0]);
const POWER: Dimension = Dimension::of([2, 1, -3, 0, 0, 0, 0]);
const CHARGE: Dimension = Dimension::of([0, 0, 1, 1, 0, 0, 0]);
const VOLTAGE: Dimension = Dimension::of([2, 1, -3, -1, 0, 0, 0]);
const RESISTANCE: Dimension = Dimension::of([2, 1, -3, -2, 0, 0, 0]);
const MAGNETIC_FLUX_DENSITY: Dimension = Dimension::of([0, 1, -2, -1, 0, 0, 0]);
const FLUX: Dimension = Dimension::of([-2, 0, -1, 0, 0, 0, 0]);
const MASS_DENSITY: Dimension = Dimension::of([-3, 1, 0, 0, 0, 0, 0]);
const MOLAR_MASS: Dimension = Dimension::of([0, 1, 0, 0, 0, -1, 0]);
const SOLID_ANGLE: Dimension = Dimension::of([0, 0, 0, 0, 0, 0, 2]);
const EMITTANCE: Dimension = Dimension::of([1, 0, 0, 0, 0, 0, 1]);

/// Symbol, dimension, and whether SI prefixes apply.
const UNITS: &[(&str, Dimension, bool)] = &[
    ("m", LENGTH_DIM, true),
    ("g", MASS_DIM, true),
    ("s", TIME_DIM, true),
    ("A", CURRENT_DIM, true),
    ("K", TEMPERATURE_DIM, true),
    ("mol", AMOUNT_DIM, true),
    ("rad", ANGLE_DIM, true),
    ("sr", SOLID_ANGLE, true),
    ("Hz", FREQUENCY, true),
    ("N", FORCE, true),
    ("Pa", PRESSURE, true),
    ("J", ENERGY, true),
    ("eV", ENERGY, true),
    ("erg", ENERGY, false),
    ("W", POWER, true),
    ("C", CHARGE, true),
    ("V", VOLTAGE, true),
    ("ohm", RESISTANCE, true),
    ("Ω", RESISTANCE, true),
    ("T", MAGNETIC_FLUX_DENSITY, true),
    ("l", VOLUME, true),
    ("L", VOLUME, true),
    ("barn", AREA, true),
    ("bar", PRESSURE, true),
    ("atm", PRESSURE, false),
    ("Torr", PRESSURE, true),
    ("torr", PRESSURE, false),
    ("Angstrom", LENGTH_DIM, false),
    ("angstrom", LENGTH_DIM, false),
    ("Ang", LENGTH_DIM, false),
    ("Å", LENGTH_DIM, false),
    ("micron", LENGTH_DIM, false),
    ("deg", ANGLE_DIM, false),
    ("degree", ANGLE_DIM, false),
    ("degrees", ANGLE_DIM, false),
    ("°", ANGLE_DIM, false),
    ("degC", TEMPERATURE_DIM, false),
    ("celsius", TEMPERATURE_DIM, false),
    ("°C", TEMPERATURE_DIM, false),
    ("min", TIME_DIM, false),
    ("minute", TIME_DIM, false),
    ("minutes", TIME_DIM, false),
    ("h", TIME_DIM, false),
    ("hour", TIME_DIM, false),
    ("hours", TIME_DIM, false),
    ("second", TIME_DIM, false),
    ("seconds", TIME_DIM, false),
    ("Da", MASS_DIM, true),
    ("amu", MASS_DIM, false),
    ("counts", Dimension::NONE, false),
    ("count", Dimension::NONE, false),
    ("cts", Dimension::NONE, false),
    ("pulses", Dimension::NONE, false),
    ("photons", Dimension::NONE, false),
    ("%", Dimension::NONE, false),
];

/// SI prefixes, longest first so `da` wins over `d`.
const PREFIXES: &[&str] = &[
    "da", "Y", "Z", "E", "P", "T", "G", "M", "k", "h", "d", "c", "m", "u", "µ", "μ", "n", "p", "f", "a", "z", "y",
];

fn lookup_symbol(symbol: &str) -> Option<Dimension> {
    if let Some((_, dim, _)) = UNITS.iter().find(|(s, _, _)| *s == symbol) {
        return Some(*dim);
    }
    PREFIXES.iter().find_map(|prefix| {
        let base = symbol.strip_prefix(prefix)?;
        UNITS
            .iter()
            .find(|(s, _, prefixable)| *prefixable && *s == base)
            .map(|(_, dim, _)| *dim)
    })
}

// ─── Parser ──────────────────────────────────────────────────────────

/// Why a unit string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot parse unit '{unit}': {reason}")]
pub struct UnitParseError {
    pub unit: String,
    pub reason: String,
}

/// Parse a unit expression into its dimension. An empty string and `1`
/// are dimensionless.
pub fn parse_unit(unit: &str) -> Result<Dimension, UnitParseError> {
    let chars: Vec<char> = unit.trim().chars().collect();
    if chars.is_empty() {
        return Ok(Dimension::NONE);
    }
    let mut parser = Parser {
        chars: &chars,
        pos: 0,
        unit,
    };
    let dim = parser.expression()?;
    if parser.pos < chars.len() {
        return Err(parser.error(&format!("unexpected '{}'", chars[parser.pos])));
    }
    Ok(dim)
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
    unit: &'a str,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> UnitParseError {
        UnitParseError {
            unit: self.unit.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) -> bool {
        let start = self.pos;
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expression(&mut self) -> Result<Dimension, UnitParseError> {
        self.skip_spaces();
        let mut dim = self.factor()?;
        loop {
            let spaced = self.skip_spaces();
            match self.peek() {
                Some('*') if self.chars.get(self.pos + 1) != Some(&'*') => {
                    self.pos += 1;
                    self.skip_spaces();
                    dim = dim.mul(self.factor()?);
                }
                Some('.') | Some('·') => {
                    self.pos += 1;
                    self.skip_spaces();
                    dim = dim.mul(self.factor()?);
                }
                Some('/') => {
                    self.pos += 1;
                    self.skip_spaces();
                    dim = dim.mul(self.factor()?.pow(-1));
                }
                Some(')') | None => return Ok(dim),
                Some(_) if spaced => dim = dim.mul(self.factor()?),
                Some(c) => return Err(self.error(&format!("unexpected '{c}'"))),
            }
        }
    }

    fn factor(&mut self) -> Result<Dimension, UnitParseError> {
        let base = match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.expression()?;
                if self.peek() != Some(')') {
                    return Err(self.error("unbalanced parentheses"));
                }
                self.pos += 1;
                inner
            }
            Some(c) if c.is_ascii_digit() => {
                let number = self.take_while(|c| c.is_ascii_digit());
                if number != "1" {
                    return Err(self.error(&format!("numeric factor '{number}' is not supported")));
                }
                Dimension::NONE
            }
            Some(_) => {
                let symbol = self.take_while(|c| c.is_alphabetic() || matches!(c, '%' | '°' | 'Ω' | 'µ' | 'μ' | 'Å'));
                if symbol.is_empty() {
                    return Err(self.error("expected a unit symbol"));
                }
                lookup_symbol(&symbol).ok_or_else(|| self.error(&format!("unknown symbol '{symbol}'")))?
            }
            None => return Err(self.error("expected a unit symbol")),
        };
        Ok(base.pow(self.exponent()?))
    }

    fn exponent(&mut self) -> Result<i8, UnitParseError> {
        let explicit = match self.peek() {
            Some('^') => {
                self.pos += 1;
                true
            }
            Some('*') if self.chars.get(self.pos + 1) == Some(&'*') => {
                self.pos += 2;
                true
            }
            _ => false,
        };
        let negative = match self.peek() {
            Some('-') if explicit || self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) => {
                self.pos += 1;
                true
            }
            Some('+') if explicit => {
                self.pos += 1;
                false
            }
            _ => false,
        };
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            if explicit || negative {
                return Err(self.error("missing exponent"));
            }
            return Ok(1);
        }
        let n: i8 = digits.parse().map_err(|_| self.error("exponent out of range"))?;
        Ok(if negative { -n } else { n })
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

// ─── Categories ──────────────────────────────────────────────────────

/// Why a unit attribute was rejected for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitRejection {
    /// The category needs a unit but the node has none.
    Missing,
    /// The unit string is not understood.
    Unparseable(UnitParseError),
    /// The unit parses but has the wrong physical dimension.
    WrongDimension(Dimension),
    /// `NX_UNITLESS` nodes must not carry a unit.
    NotUnitless,
}

impl UnitCategory {
    /// Dimensions a unit of this category may have. Empty means any.
    pub fn dimensions(&self) -> &'static [Dimension] {
        match self {
            Self::Any => &[],
            Self::Angle => &[ANGLE_DIM],
            Self::Area | Self::CrossSection => &[AREA],
            Self::Charge => &[CHARGE],
            Self::Count | Self::Pulses | Self::Dimensionless | Self::Unitless => &[Dimension::NONE],
            Self::Current => &[CURRENT_DIM],
            Self::Emittance => &[EMITTANCE, LENGTH_DIM],
            Self::Energy => &[ENERGY],
            Self::Flux => &[FLUX],
            Self::Frequency => &[FREQUENCY],
            Self::Length | Self::Wavelength => &[LENGTH_DIM],
            Self::Mass => &[MASS_DIM],
            Self::MassDensity => &[MASS_DENSITY],
            Self::MolecularWeight => &[MOLAR_MASS],
            Self::Period | Self::Time | Self::TimeOfFlight => &[TIME_DIM],
            Self::PerArea | Self::ScatteringLengthDensity => &[PER_AREA],
            Self::PerLength | Self::Wavenumber => &[PER_LENGTH],
            Self::Power => &[POWER],
            Self::Pressure => &[PRESSURE],
            Self::SolidAngle => &[SOLID_ANGLE],
            Self::Temperature => &[TEMPERATURE_DIM],
            Self::Transformation => &[LENGTH_DIM, ANGLE_DIM, Dimension::NONE],
            Self::Voltage => &[VOLTAGE],
            Self::Volume => &[VOLUME],
        }
    }

    /// Whether a node may omit its `units` attribute.
    pub fn allows_missing_units(&self) -> bool {
        matches!(self, Self::Any | Self::Dimensionless | Self::Unitless)
    }

    /// Decide whether `units` (the node's unit attribute, if any) belongs
    /// to this category.
    pub fn admits(&self, units: Option<&str>) -> Result<(), UnitRejection> {
        if *self == Self::Any {
            return Ok(());
        }
        let Some(units) = units else {
            return if self.allows_missing_units() {
                Ok(())
            } else {
                Err(UnitRejection::Missing)
            };
        };
        if *self == Self::Unitless {
            return if units.trim().is_empty() {
                Ok(())
            } else {
                Err(UnitRejection::NotUnitless)
            };
        }
        let dim = parse_unit(units).map_err(UnitRejection::Unparseable)?;
        if self.dimensions().contains(&dim) {
            Ok(())
        } else {
            Err(UnitRejection::WrongDimension(dim))
        }
    }
}
