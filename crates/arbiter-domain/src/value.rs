//! Typed values flowing through expression evaluation.
//!
//! A value is either a scalar of one of the closed set of [`DataType`]s, a
//! [`Bag`] of scalars sharing one data type, a function reference (only valid
//! as a higher-order function argument) or the Indeterminate sentinel.

use crate::error::EvalError;
use arbiter_types::ids;
use std::cmp::Ordering;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    String,
    Boolean,
    Integer,
    Double,
    Date,
    Time,
    DateTime,
    AnyUri,
    HexBinary,
    Rfc822Name,
    X500Name,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        DataType::String,
        DataType::Boolean,
        DataType::Integer,
        DataType::Double,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::AnyUri,
        DataType::HexBinary,
        DataType::Rfc822Name,
        DataType::X500Name,
    ];

    /// Look a data type up by its URI identifier.
    pub fn from_uri(uri: &str) -> Option<Self> {
        DataType::ALL.into_iter().find(|dt| dt.uri() == uri)
    }

    pub fn uri(self) -> &'static str {
        match self {
            DataType::String => ids::DATA_TYPE_STRING,
            DataType::Boolean => ids::DATA_TYPE_BOOLEAN,
            DataType::Integer => ids::DATA_TYPE_INTEGER,
            DataType::Double => ids::DATA_TYPE_DOUBLE,
            DataType::Date => ids::DATA_TYPE_DATE,
            DataType::Time => ids::DATA_TYPE_TIME,
            DataType::DateTime => ids::DATA_TYPE_DATE_TIME,
            DataType::AnyUri => ids::DATA_TYPE_ANY_URI,
            DataType::HexBinary => ids::DATA_TYPE_HEX_BINARY,
            DataType::Rfc822Name => ids::DATA_TYPE_RFC822_NAME,
            DataType::X500Name => ids::DATA_TYPE_X500_NAME,
        }
    }

    /// Prefix used in function identifiers (`string-equal`, `dateTime-bag`).
    pub fn short_name(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Double => "double",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::DateTime => "dateTime",
            DataType::AnyUri => "anyURI",
            DataType::HexBinary => "hexBinary",
            DataType::Rfc822Name => "rfc822Name",
            DataType::X500Name => "x500Name",
        }
    }

    /// Parse the lexical form of a value. `arg_pos` is only used for error reporting.
    pub fn parse(self, text: &str, arg_pos: usize) -> Result<Scalar, EvalError> {
        let fail = || EvalError::Parse {
            position: arg_pos,
            value: text.to_string(),
            data_type: self.short_name(),
        };
        let trimmed = text.trim();
        let scalar = match self {
            DataType::String => Scalar::String(text.to_string()),
            DataType::Boolean => match trimmed {
                "true" | "1" => Scalar::Boolean(true),
                "false" | "0" => Scalar::Boolean(false),
                _ => return Err(fail()),
            },
            DataType::Integer => {
                let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
                Scalar::Integer(digits.parse().map_err(|_| fail())?)
            }
            DataType::Double => Scalar::Double(parse_double(trimmed).ok_or_else(fail)?),
            DataType::Date => Scalar::Date(parse_date(trimmed).ok_or_else(fail)?),
            DataType::Time => Scalar::Time(parse_time(trimmed).ok_or_else(fail)?),
            DataType::DateTime => Scalar::DateTime(parse_date_time(trimmed).ok_or_else(fail)?),
            DataType::AnyUri => {
                if trimmed.chars().any(char::is_whitespace) {
                    return Err(fail());
                }
                Scalar::AnyUri(trimmed.to_string())
            }
            DataType::HexBinary => Scalar::HexBinary(hex::decode(trimmed).map_err(|_| fail())?),
            DataType::Rfc822Name => Scalar::Rfc822Name(normalize_rfc822(trimmed).ok_or_else(fail)?),
            DataType::X500Name => Scalar::X500Name(normalize_x500(trimmed).ok_or_else(fail)?),
        };
        Ok(scalar)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

fn parse_double(text: &str) -> Option<f64> {
    match text {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        // Rust accepts "inf"/"nan" spellings that the lexical space does not.
        other if other.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => None,
        other => other.parse().ok(),
    }
}

fn strip_utc(text: &str) -> &str {
    text.strip_suffix('Z').unwrap_or(text)
}

fn parse_date(text: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(strip_utc(text), format).ok()
}

fn parse_time(text: &str) -> Option<Time> {
    let format = format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
    Time::parse(strip_utc(text), format).ok()
}

/// Full RFC 3339 first; a local date-time without offset is read as UTC.
fn parse_date_time(text: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(value);
    }
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(strip_utc(text), format)
        .ok()
        .map(|local| local.assume_offset(UtcOffset::UTC))
}

/// The local part is case-sensitive, the domain part is not.
fn normalize_rfc822(text: &str) -> Option<String> {
    let (local, domain) = text.rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(format!("{local}@{}", domain.to_ascii_lowercase()))
}

/// Case-insensitive attribute types and values, whitespace around separators dropped.
fn normalize_x500(text: &str) -> Option<String> {
    let mut parts = Vec::new();
    for rdn in text.split(',') {
        let (attr, value) = rdn.split_once('=')?;
        let (attr, value) = (attr.trim(), value.trim());
        if attr.is_empty() {
            return None;
        }
        parts.push(format!(
            "{}={}",
            attr.to_ascii_lowercase(),
            value.to_ascii_lowercase()
        ));
    }
    Some(parts.join(","))
}

/// A single typed value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Date(Date),
    Time(Time),
    DateTime(OffsetDateTime),
    AnyUri(String),
    HexBinary(Vec<u8>),
    Rfc822Name(String),
    X500Name(String),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::String(_) => DataType::String,
            Scalar::Boolean(_) => DataType::Boolean,
            Scalar::Integer(_) => DataType::Integer,
            Scalar::Double(_) => DataType::Double,
            Scalar::Date(_) => DataType::Date,
            Scalar::Time(_) => DataType::Time,
            Scalar::DateTime(_) => DataType::DateTime,
            Scalar::AnyUri(_) => DataType::AnyUri,
            Scalar::HexBinary(_) => DataType::HexBinary,
            Scalar::Rfc822Name(_) => DataType::Rfc822Name,
            Scalar::X500Name(_) => DataType::X500Name,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Scalar::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Text of the string-like data types.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) | Scalar::AnyUri(s) | Scalar::Rfc822Name(s) | Scalar::X500Name(s) => {
                Some(s)
            }
            _ => None,
        }
    }

    /// Total order within one data type; `None` across types or for unordered types.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Integer(a), Scalar::Integer(b)) => Some(a.cmp(b)),
            (Scalar::Double(a), Scalar::Double(b)) => a.partial_cmp(b),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::Time(a), Scalar::Time(b)) => Some(a.cmp(b)),
            (Scalar::DateTime(a), Scalar::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) | Scalar::AnyUri(s) | Scalar::Rfc822Name(s) | Scalar::X500Name(s) => {
                f.write_str(s)
            }
            Scalar::Boolean(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Double(d) => write!(f, "{d}"),
            Scalar::Date(d) => {
                let format = format_description!("[year]-[month]-[day]");
                match d.format(format) {
                    Ok(s) => f.write_str(&s),
                    Err(_) => Err(fmt::Error),
                }
            }
            Scalar::Time(t) => {
                let format = format_description!("[hour]:[minute]:[second]");
                match t.format(format) {
                    Ok(s) => f.write_str(&s),
                    Err(_) => Err(fmt::Error),
                }
            }
            Scalar::DateTime(dt) => match dt.format(&Rfc3339) {
                Ok(s) => f.write_str(&s),
                Err(_) => Err(fmt::Error),
            },
            Scalar::HexBinary(bytes) => f.write_str(&hex::encode_upper(bytes)),
        }
    }
}

/// Ordered collection of scalars sharing one data type. Duplicates are kept.
#[derive(Clone, Debug, PartialEq)]
pub struct Bag {
    data_type: DataType,
    values: Vec<Scalar>,
}

impl Bag {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            values: Vec::new(),
        }
    }

    pub fn from_values(data_type: DataType, values: Vec<Scalar>) -> Result<Self, EvalError> {
        let mut bag = Bag::new(data_type);
        for value in values {
            bag.push(value)?;
        }
        Ok(bag)
    }

    pub fn push(&mut self, value: Scalar) -> Result<(), EvalError> {
        if value.data_type() != self.data_type {
            return Err(EvalError::MixedBag {
                expected: self.data_type.short_name(),
                found: value.data_type().short_name(),
            });
        }
        self.values.push(value);
        Ok(())
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scalar> {
        self.values.iter()
    }

    pub fn contains(&self, value: &Scalar) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// Append every element of `other`, which must share this bag's data type.
    pub fn extend(&mut self, other: Bag) -> Result<(), EvalError> {
        for value in other.values {
            self.push(value)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Bag {
    type Item = &'a Scalar;
    type IntoIter = std::slice::Iter<'a, Scalar>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Result of evaluating an expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationValue {
    Indeterminate,
    Scalar(Scalar),
    Bag(Bag),
    /// Reference to a registered function, passed to higher-order functions.
    Function(String),
}

impl EvaluationValue {
    pub const TRUE: EvaluationValue = EvaluationValue::Scalar(Scalar::Boolean(true));
    pub const FALSE: EvaluationValue = EvaluationValue::Scalar(Scalar::Boolean(false));
    pub const INDETERMINATE: EvaluationValue = EvaluationValue::Indeterminate;

    pub fn is_indeterminate(&self) -> bool {
        matches!(self, EvaluationValue::Indeterminate)
    }

    pub fn is_bag(&self) -> bool {
        matches!(self, EvaluationValue::Bag(_))
    }

    /// Data type used for signature checks; a bag reports its element type.
    ///
    /// Indeterminate values and function references have none and therefore
    /// never satisfy a declared argument type.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            EvaluationValue::Scalar(s) => Some(s.data_type()),
            EvaluationValue::Bag(b) => Some(b.data_type()),
            EvaluationValue::Indeterminate | EvaluationValue::Function(_) => None,
        }
    }

    pub fn value(&self) -> Result<&Scalar, EvalError> {
        match self {
            EvaluationValue::Scalar(s) => Ok(s),
            EvaluationValue::Indeterminate => Err(EvalError::Indeterminate),
            EvaluationValue::Bag(_) | EvaluationValue::Function(_) => {
                Err(EvalError::ExpectedScalar(0))
            }
        }
    }

    pub fn bool_value(&self) -> Result<bool, EvalError> {
        let scalar = self.value()?;
        scalar.as_bool().ok_or_else(|| EvalError::TypeMismatch {
            position: 0,
            expected: DataType::Boolean.to_string(),
            found: scalar.data_type().to_string(),
        })
    }

    pub fn bag(&self) -> Result<&Bag, EvalError> {
        match self {
            EvaluationValue::Bag(b) => Ok(b),
            EvaluationValue::Indeterminate => Err(EvalError::Indeterminate),
            EvaluationValue::Scalar(_) | EvaluationValue::Function(_) => {
                Err(EvalError::ExpectedBag(0))
            }
        }
    }
}

impl From<bool> for EvaluationValue {
    fn from(value: bool) -> Self {
        if value {
            EvaluationValue::TRUE
        } else {
            EvaluationValue::FALSE
        }
    }
}

impl From<Scalar> for EvaluationValue {
    fn from(value: Scalar) -> Self {
        EvaluationValue::Scalar(value)
    }
}

impl From<Bag> for EvaluationValue {
    fn from(value: Bag) -> Self {
        EvaluationValue::Bag(value)
    }
}

impl fmt::Display for EvaluationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationValue::Indeterminate => f.write_str("Indeterminate"),
            EvaluationValue::Scalar(s) => write!(f, "{s}:{}", s.data_type()),
            EvaluationValue::Bag(b) => {
                write!(f, "bag<{}>[", b.data_type())?;
                for (i, v) in b.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            EvaluationValue::Function(id) => write!(f, "function {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn data_type_uri_round_trips() {
        for dt in DataType::ALL {
            assert_eq!(DataType::from_uri(dt.uri()), Some(dt));
        }
        assert_eq!(DataType::from_uri("urn:unknown"), None);
    }

    #[test]
    fn parses_lexical_forms() {
        assert_eq!(
            DataType::Boolean.parse("true", 0).unwrap(),
            Scalar::Boolean(true)
        );
        assert_eq!(DataType::Integer.parse("+42", 0).unwrap(), Scalar::Integer(42));
        assert_eq!(DataType::Double.parse("1.5e2", 0).unwrap(), Scalar::Double(150.0));
        assert_eq!(
            DataType::Date.parse("2024-02-29", 0).unwrap(),
            Scalar::Date(date!(2024 - 02 - 29))
        );
        assert_eq!(
            DataType::Time.parse("08:30:00", 0).unwrap(),
            Scalar::Time(time!(08:30:00))
        );
        assert_eq!(
            DataType::DateTime.parse("2024-01-01T12:00:00Z", 0).unwrap(),
            Scalar::DateTime(datetime!(2024-01-01 12:00:00 UTC))
        );
        assert_eq!(
            DataType::DateTime.parse("2024-01-01T12:00:00", 0).unwrap(),
            Scalar::DateTime(datetime!(2024-01-01 12:00:00 UTC))
        );
        assert_eq!(
            DataType::HexBinary.parse("0aFF", 0).unwrap(),
            Scalar::HexBinary(vec![0x0a, 0xff])
        );
    }

    #[test]
    fn parse_error_reports_position_and_type() {
        let err = DataType::Integer.parse("twelve", 3).unwrap_err();
        assert_eq!(
            err,
            EvalError::Parse {
                position: 3,
                value: "twelve".to_string(),
                data_type: "integer",
            }
        );
        assert!(DataType::Double.parse("inf", 0).is_err());
        assert!(DataType::Boolean.parse("yes", 0).is_err());
    }

    #[test]
    fn names_are_normalized_for_equality() {
        assert_eq!(
            DataType::Rfc822Name.parse("Anne@Example.COM", 0).unwrap(),
            DataType::Rfc822Name.parse("Anne@example.com", 0).unwrap()
        );
        assert_ne!(
            DataType::Rfc822Name.parse("anne@example.com", 0).unwrap(),
            DataType::Rfc822Name.parse("Anne@example.com", 0).unwrap()
        );
        assert_eq!(
            DataType::X500Name.parse("CN=Anne, O=Example", 0).unwrap(),
            DataType::X500Name.parse("cn=anne,o=example", 0).unwrap()
        );
    }

    #[test]
    fn bag_rejects_mixed_types() {
        let mut bag = Bag::new(DataType::String);
        bag.push(Scalar::String("a".into())).unwrap();
        bag.push(Scalar::String("a".into())).unwrap();
        assert_eq!(bag.len(), 2);
        assert!(bag.push(Scalar::Integer(1)).is_err());
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn indeterminate_has_no_value() {
        let v = EvaluationValue::INDETERMINATE;
        assert!(v.is_indeterminate());
        assert_eq!(v.value(), Err(EvalError::Indeterminate));
        assert_eq!(v.bool_value(), Err(EvalError::Indeterminate));
        assert_eq!(v.data_type(), None);
    }

    #[test]
    fn bag_reports_element_type() {
        let bag = Bag::from_values(DataType::Integer, vec![Scalar::Integer(1)]).unwrap();
        let v = EvaluationValue::from(bag);
        assert_eq!(v.data_type(), Some(DataType::Integer));
        assert!(v.value().is_err());
        assert_eq!(EvaluationValue::from(true), EvaluationValue::TRUE);
    }
}
