//! Attribute field definitions and values.

use std::fmt;
use std::str::FromStr;

/// Closed set of attribute types understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Integer64,
    Real,
    String,
    Date,
    Time,
    DateTime,
    IntegerList,
    Integer64List,
    RealList,
    StringList,
    Binary,
}

impl FieldType {
    /// Maps an OGR field type code (`OFTInteger` = 0 .. `OFTInteger64List` = 13).
    ///
    /// The deprecated wide-string codes fold into their narrow counterparts.
    /// Returns `None` for codes outside the OGR table.
    #[must_use]
    pub const fn from_ogr_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Integer,
            1 => Self::IntegerList,
            2 => Self::Real,
            3 => Self::RealList,
            4 | 6 => Self::String,
            5 | 7 => Self::StringList,
            8 => Self::Binary,
            9 => Self::Date,
            10 => Self::Time,
            11 => Self::DateTime,
            12 => Self::Integer64,
            13 => Self::Integer64List,
            _ => return None,
        })
    }

    /// Whether values of this type are a list or a raw byte blob.
    #[must_use]
    pub const fn is_list_or_binary(self) -> bool {
        matches!(
            self,
            Self::IntegerList
                | Self::Integer64List
                | Self::RealList
                | Self::StringList
                | Self::Binary
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Integer64 => "Integer64",
            Self::Real => "Real",
            Self::String => "String",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::IntegerList => "IntegerList",
            Self::Integer64List => "Integer64List",
            Self::RealList => "RealList",
            Self::StringList => "StringList",
            Self::Binary => "Binary",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [FieldType; 12] = [
            FieldType::Integer,
            FieldType::Integer64,
            FieldType::Real,
            FieldType::String,
            FieldType::Date,
            FieldType::Time,
            FieldType::DateTime,
            FieldType::IntegerList,
            FieldType::Integer64List,
            FieldType::RealList,
            FieldType::StringList,
            FieldType::Binary,
        ];
        ALL.into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field type '{s}'"))
    }
}

/// Definition of one attribute column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefn {
    pub name: String,
    pub field_type: FieldType,
    /// Declared width, 0 when unconstrained.
    pub width: u32,
    /// Declared precision, 0 when unconstrained.
    pub precision: u32,
}

impl FieldDefn {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            width: 0,
            precision: 0,
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i32),
    Integer64(i64),
    Real(f64),
    String(String),
    /// Date, time and date-time values are kept in their textual form.
    Date(String),
    Time(String),
    DateTime(String),
    IntegerList(Vec<i32>),
    Integer64List(Vec<i64>),
    RealList(Vec<f64>),
    StringList(Vec<String>),
    Binary(Vec<u8>),
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts the value to the given destination type.
    ///
    /// Lists render as `(count:a,b,...)` and binary as upper-case hex when the
    /// destination is textual. Returns `None` when no sensible conversion
    /// exists (for example non-numeric text into an integer column).
    #[must_use]
    pub fn coerce_to(&self, target: FieldType) -> Option<Self> {
        if self.is_null() {
            return Some(Self::Null);
        }
        let value = match target {
            FieldType::String => Self::String(self.to_string()),
            FieldType::Date => Self::Date(self.to_string()),
            FieldType::Time => Self::Time(self.to_string()),
            FieldType::DateTime => Self::DateTime(self.to_string()),
            FieldType::Integer => Self::Integer(i32::try_from(self.as_i64()?).ok()?),
            FieldType::Integer64 => Self::Integer64(self.as_i64()?),
            FieldType::Real => Self::Real(self.as_f64()?),
            FieldType::IntegerList => match self {
                Self::IntegerList(v) => Self::IntegerList(v.clone()),
                Self::Integer(v) => Self::IntegerList(vec![*v]),
                _ => return None,
            },
            FieldType::Integer64List => match self {
                Self::Integer64List(v) => Self::Integer64List(v.clone()),
                Self::IntegerList(v) => Self::Integer64List(v.iter().map(|&i| i64::from(i)).collect()),
                Self::Integer(v) => Self::Integer64List(vec![i64::from(*v)]),
                Self::Integer64(v) => Self::Integer64List(vec![*v]),
                _ => return None,
            },
            FieldType::RealList => match self {
                Self::RealList(v) => Self::RealList(v.clone()),
                Self::IntegerList(v) => Self::RealList(v.iter().map(|&i| f64::from(i)).collect()),
                Self::Real(v) => Self::RealList(vec![*v]),
                _ => return None,
            },
            FieldType::StringList => match self {
                Self::StringList(v) => Self::StringList(v.clone()),
                Self::String(v) => Self::StringList(vec![v.clone()]),
                _ => return None,
            },
            FieldType::Binary => match self {
                Self::Binary(v) => Self::Binary(v.clone()),
                Self::String(v) => Self::Binary(v.as_bytes().to_vec()),
                _ => return None,
            },
        };
        Some(value)
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(i64::from(*v)),
            Self::Integer64(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            Self::Real(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(f64::from(*v)),
            Self::Integer64(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    write!(f, "({}:", items.len())?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Integer64(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::String(v) | Self::Date(v) | Self::Time(v) | Self::DateTime(v) => f.write_str(v),
            Self::IntegerList(v) => write_list(f, v),
            Self::Integer64List(v) => write_list(f, v),
            Self::RealList(v) => write_list(f, v),
            Self::StringList(v) => write_list(f, v),
            Self::Binary(bytes) => bytes.iter().try_for_each(|b| write!(f, "{b:02X}")),
        }
    }
}
