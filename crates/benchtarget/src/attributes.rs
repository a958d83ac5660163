//! Attribute and command identities exposed to the host, and the values
//! exchanged through them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffers::ImageFrame;
use crate::counters::Category;
use crate::error::BenchmarkError;

/// Attribute name of the writable benchmark scalar.
pub const BENCHMARK_SCALAR_ATTRIBUTE: &str = "BenchmarkScalarAttribute";
/// Attribute name of the benchmark spectrum.
pub const BENCHMARK_SPECTRUM_ATTRIBUTE: &str = "BenchmarkSpectrumAttribute";
/// Attribute name of the benchmark image.
pub const BENCHMARK_IMAGE_ATTRIBUTE: &str = "BenchmarkImageAttribute";
/// Attribute name of the reset timer.
pub const TIME_SINCE_RESET_ATTRIBUTE: &str = "TimeSinceReset";
/// Name of the benchmark pipe.
pub const BENCHMARK_PIPE: &str = "BenchmarkPipe";

/// Attribute exposed by the benchmark target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Writable `f64` scalar.
    BenchmarkScalar,
    /// Writable 1-D `f64` buffer.
    BenchmarkSpectrum,
    /// Writable 2-D `f64` buffer.
    BenchmarkImage,
    /// Seconds since the last counter reset.
    TimeSinceReset,
    /// Read-only call counter.
    Count(Category),
}

/// Whether clients may write an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Declared access of every attribute, in host declaration order.
pub const ATTRIBUTE_ACCESS: [(Attribute, Access); 15] = [
    (Attribute::BenchmarkScalar, Access::ReadWrite),
    (Attribute::Count(Category::AlwaysExecutedHook), Access::ReadOnly),
    (Attribute::Count(Category::ReadAttributeHardware), Access::ReadOnly),
    (Attribute::Count(Category::ScalarRead), Access::ReadOnly),
    (Attribute::Count(Category::SpectrumRead), Access::ReadOnly),
    (Attribute::Count(Category::ImageRead), Access::ReadOnly),
    (Attribute::Count(Category::ScalarWrite), Access::ReadOnly),
    (Attribute::Count(Category::SpectrumWrite), Access::ReadOnly),
    (Attribute::Count(Category::ImageWrite), Access::ReadOnly),
    (Attribute::Count(Category::CommandCall), Access::ReadOnly),
    (Attribute::TimeSinceReset, Access::ReadOnly),
    (Attribute::Count(Category::PipeRead), Access::ReadOnly),
    (Attribute::Count(Category::PipeWrite), Access::ReadOnly),
    (Attribute::BenchmarkSpectrum, Access::ReadWrite),
    (Attribute::BenchmarkImage, Access::ReadWrite),
];

impl Attribute {
    /// Every attribute, in declaration order.
    pub fn all() -> impl Iterator<Item = Attribute> {
        ATTRIBUTE_ACCESS.iter().map(|(attr, _)| *attr)
    }

    /// Host-contract attribute name.
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::BenchmarkScalar => BENCHMARK_SCALAR_ATTRIBUTE,
            Attribute::BenchmarkSpectrum => BENCHMARK_SPECTRUM_ATTRIBUTE,
            Attribute::BenchmarkImage => BENCHMARK_IMAGE_ATTRIBUTE,
            Attribute::TimeSinceReset => TIME_SINCE_RESET_ATTRIBUTE,
            Attribute::Count(category) => category.attribute_name(),
        }
    }

    /// Declared access from [`ATTRIBUTE_ACCESS`].
    pub fn access(&self) -> Access {
        ATTRIBUTE_ACCESS
            .iter()
            .find(|(attr, _)| attr == self)
            .map_or(Access::ReadOnly, |(_, access)| *access)
    }

    /// Counter category recorded when this attribute's payload is read.
    pub fn read_category(&self) -> Option<Category> {
        match self {
            Attribute::BenchmarkScalar => Some(Category::ScalarRead),
            Attribute::BenchmarkSpectrum => Some(Category::SpectrumRead),
            Attribute::BenchmarkImage => Some(Category::ImageRead),
            Attribute::TimeSinceReset | Attribute::Count(_) => None,
        }
    }

    /// Counter category recorded when this attribute is written.
    pub fn write_category(&self) -> Option<Category> {
        match self {
            Attribute::BenchmarkScalar => Some(Category::ScalarWrite),
            Attribute::BenchmarkSpectrum => Some(Category::SpectrumWrite),
            Attribute::BenchmarkImage => Some(Category::ImageWrite),
            Attribute::TimeSinceReset | Attribute::Count(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Attribute {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::all()
            .find(|attr| attr.name() == s)
            .ok_or_else(|| BenchmarkError::UnknownAttribute {
                name: s.to_string(),
            })
    }
}

/// Command exposed by the benchmark target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    BenchmarkCommand,
    SetSpectrumSize,
    SetImageSize,
    ResetCounters,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::BenchmarkCommand,
        Command::SetSpectrumSize,
        Command::SetImageSize,
        Command::ResetCounters,
    ];

    /// Host-contract command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::BenchmarkCommand => "BenchmarkCommand",
            Command::SetSpectrumSize => "SetSpectrumSize",
            Command::SetImageSize => "SetImageSize",
            Command::ResetCounters => "ResetCounters",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = BenchmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.name() == s)
            .ok_or_else(|| BenchmarkError::UnknownCommand {
                name: s.to_string(),
            })
    }
}

/// Input argument of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandArg {
    Void,
    Long(i32),
    LongArray(Vec<i32>),
}

/// Value read from or written to an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    Double(f64),
    ULong64(u64),
    Spectrum(Vec<f64>),
    Image(ImageFrame),
}

impl AttributeValue {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Double(_) => "double",
            AttributeValue::ULong64(_) => "ulong64",
            AttributeValue::Spectrum(_) => "spectrum",
            AttributeValue::Image(_) => "image",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::ULong64(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_attribute_listed_once() {
        let names: Vec<&str> = Attribute::all().map(|a| a.name()).collect();
        assert_eq!(names.len(), 15);
        let mut dedup = names.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), names.len());

        for category in Category::ALL {
            assert!(names.contains(&category.attribute_name()));
        }
    }

    #[test]
    fn test_only_benchmark_attributes_are_writable() {
        let writable: Vec<Attribute> = Attribute::all()
            .filter(|a| a.access() == Access::ReadWrite)
            .collect();
        assert_eq!(
            writable,
            vec![
                Attribute::BenchmarkScalar,
                Attribute::BenchmarkSpectrum,
                Attribute::BenchmarkImage
            ]
        );
    }

    #[test]
    fn test_attribute_from_str() {
        assert_eq!(
            "ScalarReadsCount".parse::<Attribute>().unwrap(),
            Attribute::Count(Category::ScalarRead)
        );
        assert_eq!(
            "TimeSinceReset".parse::<Attribute>().unwrap(),
            Attribute::TimeSinceReset
        );
        assert!(matches!(
            "WriteAttributeCounterCount".parse::<Attribute>(),
            Err(BenchmarkError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_command_from_str() {
        for cmd in Command::ALL {
            assert_eq!(cmd.name().parse::<Command>().unwrap(), cmd);
        }
        assert!(matches!(
            "Init".parse::<Command>(),
            Err(BenchmarkError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_read_write_categories() {
        assert_eq!(
            Attribute::BenchmarkImage.read_category(),
            Some(Category::ImageRead)
        );
        assert_eq!(
            Attribute::BenchmarkSpectrum.write_category(),
            Some(Category::SpectrumWrite)
        );
        assert_eq!(Attribute::TimeSinceReset.read_category(), None);
        assert_eq!(Attribute::Count(Category::PipeRead).write_category(), None);
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(AttributeValue::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(AttributeValue::ULong64(3).as_u64(), Some(3));
        assert_eq!(AttributeValue::Spectrum(vec![]).as_f64(), None);
        assert_eq!(AttributeValue::ULong64(3).type_name(), "ulong64");
    }
}
