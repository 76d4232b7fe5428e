// src/utils/gdal_ext.rs
use gdal::raster::GdalDataType;
use serde::Serialize;

use crate::error::ConvertError;

/// Sample type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericKind {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
}

/// Storage layout of a sample kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    pub byte_width: usize,
    pub signed: bool,
    pub float: bool,
}

impl NumericKind {
    pub fn descriptor(&self) -> KindDescriptor {
        use NumericKind::*;
        let (byte_width, signed, float) = match self {
            UInt8 => (1, false, false),
            Int8 => (1, true, false),
            UInt16 => (2, false, false),
            Int16 => (2, true, false),
            UInt32 => (4, false, false),
            Int32 => (4, true, false),
            UInt64 => (8, false, false),
            Int64 => (8, true, false),
            Float32 => (4, true, true),
            Float64 => (8, true, true),
        };
        KindDescriptor { byte_width, signed, float }
    }

    /// True if some values of this kind cannot be represented exactly as f32.
    pub fn loses_precision_as_f32(&self) -> bool {
        let d = self.descriptor();
        if d.float { d.byte_width > 4 } else { d.byte_width >= 4 }
    }

    /// Parse a GDAL data type name such as `Byte` or `Float32`.
    pub fn from_gdal_name(name: &str) -> Option<NumericKind> {
        use NumericKind::*;
        match name {
            "Byte" | "UInt8" => Some(UInt8),
            "Int8" => Some(Int8),
            "UInt16" => Some(UInt16),
            "Int16" => Some(Int16),
            "UInt32" => Some(UInt32),
            "Int32" => Some(Int32),
            "UInt64" => Some(UInt64),
            "Int64" => Some(Int64),
            "Float32" => Some(Float32),
            "Float64" => Some(Float64),
            _ => None,
        }
    }
}

// matched by name, the set of GdalDataType variants depends on the linked GDAL version
impl TryFrom<GdalDataType> for NumericKind {
    type Error = ConvertError;

    fn try_from(value: GdalDataType) -> Result<Self, Self::Error> {
        let name = value.name();
        NumericKind::from_gdal_name(&name).ok_or(ConvertError::UnsupportedSampleKind(name))
    }
}

/// Output sample type of an exported raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Float32,
    Int16,
}

/// Samples of a single band in their output type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedSamples {
    F32(Vec<f32>),
    I16(Vec<i16>),
}

impl TypedSamples {
    pub fn len(&self) -> usize {
        match self {
            TypedSamples::F32(v) => v.len(),
            TypedSamples::I16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TypedSamples::F32(_) => TargetKind::Float32,
            TypedSamples::I16(_) => TargetKind::Int16,
        }
    }
}
