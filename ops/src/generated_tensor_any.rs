// @generated by ops/build.rs from supported_types.yaml. Do not edit.

/// Dynamically-typed Tensor: wraps `Tensor<T>` for various T
#[derive(Clone, Debug, From)]
pub enum TensorAny {
    F32(Tensor<f32>),
    I32(Tensor<i32>),
    I64(Tensor<i64>),
    U32(Tensor<u32>),
}

impl TensorAny {
    pub fn dtype(&self) -> DataType {
        match self {
            TensorAny::F32(t) => t.dtype(),
            TensorAny::I32(t) => t.dtype(),
            TensorAny::I64(t) => t.dtype(),
            TensorAny::U32(t) => t.dtype(),
        }
    }

    pub fn view(&self) -> &ViewDescriptor {
        match self {
            TensorAny::F32(t) => t.view(),
            TensorAny::I32(t) => t.view(),
            TensorAny::I64(t) => t.view(),
            TensorAny::U32(t) => t.view(),
        }
    }

    pub fn buffer_id(&self) -> BufferId {
        match self {
            TensorAny::F32(t) => t.buffer_id(),
            TensorAny::I32(t) => t.buffer_id(),
            TensorAny::I64(t) => t.buffer_id(),
            TensorAny::U32(t) => t.buffer_id(),
        }
    }

    pub fn device_id(&self) -> usize {
        match self {
            TensorAny::F32(t) => t.device_id(),
            TensorAny::I32(t) => t.device_id(),
            TensorAny::I64(t) => t.device_id(),
            TensorAny::U32(t) => t.device_id(),
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        self.view().dims()
    }

    /// Same buffer viewed under `shape`
    pub fn reshaped(&self, shape: &[usize]) -> anyhow::Result<TensorAny> {
        match self {
            TensorAny::F32(t) => t.reshaped(shape).map(TensorAny::F32),
            TensorAny::I32(t) => t.reshaped(shape).map(TensorAny::I32),
            TensorAny::I64(t) => t.reshaped(shape).map(TensorAny::I64),
            TensorAny::U32(t) => t.reshaped(shape).map(TensorAny::U32),
        }
    }

    /// Fresh tensor with this tensor's shape and dtype, every element set to `fill`
    pub fn filled_like(&self, mm: &MemoryManager, fill: Fill, device_id: usize) -> anyhow::Result<TensorAny> {
        let dims = self.dims();
        match self {
            TensorAny::F32(_) => {
                Tensor::<f32>::filled(mm, fill.value(), &dims, device_id).map(TensorAny::F32)
            }
            TensorAny::I32(_) => {
                Tensor::<i32>::filled(mm, fill.value(), &dims, device_id).map(TensorAny::I32)
            }
            TensorAny::I64(_) => {
                Tensor::<i64>::filled(mm, fill.value(), &dims, device_id).map(TensorAny::I64)
            }
            TensorAny::U32(_) => {
                Tensor::<u32>::filled(mm, fill.value(), &dims, device_id).map(TensorAny::U32)
            }
        }
    }

    /// Element values widened to `i64`, or `None` for non-integer dtypes
    pub fn integer_values(&self, mm: &MemoryManager) -> anyhow::Result<Option<Vec<i64>>> {
        match self {
            TensorAny::I32(t) => Ok(Some(t.to_vec(mm)?.into_iter().map(i64::from).collect())),
            TensorAny::I64(t) => Ok(Some(t.to_vec(mm)?.into_iter().map(i64::from).collect())),
            TensorAny::U32(t) => Ok(Some(t.to_vec(mm)?.into_iter().map(i64::from).collect())),
            _ => Ok(None),
        }
    }

    pub fn shares_buffer_with(&self, other: &TensorAny) -> bool {
        match (self, other) {
            (TensorAny::F32(a), TensorAny::F32(b)) => a.shares_buffer_with(b),
            (TensorAny::I32(a), TensorAny::I32(b)) => a.shares_buffer_with(b),
            (TensorAny::I64(a), TensorAny::I64(b)) => a.shares_buffer_with(b),
            (TensorAny::U32(a), TensorAny::U32(b)) => a.shares_buffer_with(b),
            _ => false,
        }
    }
}