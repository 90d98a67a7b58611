//! Typed property values as exposed by a content store

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// Property type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Long,
    Double,
    Decimal,
    Boolean,
    Date,
    Binary,
    Other,
}

/// Arbitrary-precision decimal kept in canonical text form
///
/// Scale is preserved (`12.30` stays `12.30`); only a leading `+`, redundant
/// leading zeros and the exponent marker case are canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Decimal(String);

impl Decimal {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
            None => (unsigned, None),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (mantissa, None),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
            return Err(format!("not a decimal number: {:?}", text));
        }
        if !all_digits(int_part) || !frac_part.map_or(true, all_digits) {
            return Err(format!("not a decimal number: {:?}", text));
        }
        if let Some(exp) = exponent {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !all_digits(digits) {
                return Err(format!("invalid exponent in decimal: {:?}", text));
            }
        }

        let int_trimmed = int_part.trim_start_matches('0');
        let mut canonical = String::new();
        if negative {
            canonical.push('-');
        }
        canonical.push_str(if int_trimmed.is_empty() { "0" } else { int_trimmed });
        if let Some(frac) = frac_part {
            if !frac.is_empty() {
                canonical.push('.');
                canonical.push_str(frac);
            }
        }
        if let Some(exp) = exponent {
            canonical.push('E');
            canonical.push_str(exp);
        }
        Ok(Decimal(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Decimal {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Decimal::parse(&value)
    }
}

impl From<Decimal> for String {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary property content, readable as a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryValue {
    /// Content held in memory (hex in content dumps)
    #[serde(rename = "hex")]
    Inline(#[serde(with = "hex::serde")] Vec<u8>),
    /// Content backed by a file
    File(PathBuf),
}

impl BinaryValue {
    /// Open the content for streaming
    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            BinaryValue::Inline(bytes) => Ok(Box::new(bytes.as_slice())),
            BinaryValue::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        }
    }
}

/// A typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    String(String),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(DateTime<FixedOffset>),
    Binary(BinaryValue),
    /// Homogeneous array of values of `element_type`
    Multi {
        element_type: PropertyType,
        values: Vec<PropertyValue>,
    },
    /// A store type this crate does not model, carried in its string form
    Other { type_name: String, value: String },
}

impl PropertyValue {
    /// Build a multi-valued property, rejecting mixed or nested element types
    pub fn multi(element_type: PropertyType, values: Vec<PropertyValue>) -> Result<Self, String> {
        let value = PropertyValue::Multi {
            element_type,
            values,
        };
        value.validate()?;
        Ok(value)
    }

    /// Build a multi-valued string property
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::Multi {
            element_type: PropertyType::String,
            values: values
                .into_iter()
                .map(|s| PropertyValue::String(s.into()))
                .collect(),
        }
    }

    /// Type of this value (element type for multi-valued properties)
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Long(_) => PropertyType::Long,
            PropertyValue::Double(_) => PropertyType::Double,
            PropertyValue::Decimal(_) => PropertyType::Decimal,
            PropertyValue::Boolean(_) => PropertyType::Boolean,
            PropertyValue::Date(_) => PropertyType::Date,
            PropertyValue::Binary(_) => PropertyType::Binary,
            PropertyValue::Multi { element_type, .. } => *element_type,
            PropertyValue::Other { .. } => PropertyType::Other,
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, PropertyValue::Multi { .. })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check that multi-valued properties are flat and homogeneous
    pub fn validate(&self) -> Result<(), String> {
        if let PropertyValue::Multi {
            element_type,
            values,
        } = self
        {
            for value in values {
                if value.is_multiple() {
                    return Err("multi-valued properties cannot be nested".to_string());
                }
                if value.property_type() != *element_type {
                    return Err(format!(
                        "element of type {:?} in a {:?} array",
                        value.property_type(),
                        element_type
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Long(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Double(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<Decimal> for PropertyValue {
    fn from(value: Decimal) -> Self {
        PropertyValue::Decimal(value)
    }
}

impl From<DateTime<FixedOffset>> for PropertyValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        PropertyValue::Date(value)
    }
}

impl From<BinaryValue> for PropertyValue {
    fn from(value: BinaryValue) -> Self {
        PropertyValue::Binary(value)
    }
}
