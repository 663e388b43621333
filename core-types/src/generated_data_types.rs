// @generated by core-types/build.rs from supported_types.yaml. Do not edit.

/// Supported element types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    F32,
    I32,
    I64,
    U32,
}

impl DataType {
    /// Every supported element type, in declaration order
    pub const ALL: &'static [DataType] = &[
        DataType::F32,
        DataType::I32,
        DataType::I64,
        DataType::U32,
    ];

    /// Size of one element, in bytes
    pub fn size_in_bytes(self) -> usize {
        match self {
            DataType::F32 => std::mem::size_of::<f32>(),
            DataType::I32 => std::mem::size_of::<i32>(),
            DataType::I64 => std::mem::size_of::<i64>(),
            DataType::U32 => std::mem::size_of::<u32>(),
        }
    }

    /// Lower-case name, as used in logs and graph exports
    pub fn name(self) -> &'static str {
        match self {
            DataType::F32 => "f32",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U32 => "u32",
        }
    }

    pub fn is_integer(self) -> bool {
        match self {
            DataType::F32 => false,
            DataType::I32 => true,
            DataType::I64 => true,
            DataType::U32 => true,
        }
    }
}

/// Marker-trait so we can go from T to DataType
pub trait Element: bytemuck::Pod + std::fmt::Debug + PartialEq + Send + Sync {
    const DTYPE: DataType;
    const ONE: Self;
}

impl Element for f32 {
    const DTYPE: DataType = DataType::F32;
    const ONE: Self = 1.0;
}

impl Element for i32 {
    const DTYPE: DataType = DataType::I32;
    const ONE: Self = 1;
}

impl Element for i64 {
    const DTYPE: DataType = DataType::I64;
    const ONE: Self = 1;
}

impl Element for u32 {
    const DTYPE: DataType = DataType::U32;
    const ONE: Self = 1;
}
