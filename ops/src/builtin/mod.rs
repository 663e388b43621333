//! Primitives every backend ships with.

mod expand_dims;
mod fill_like;
mod identity;
mod identity_n;
mod shape;

pub use expand_dims::{ExpandDimsOp, normalize_axis};
pub use fill_like::{OnesLikeOp, ZerosLikeOp};
pub use identity::IdentityOp;
pub use identity_n::IdentityNOp;
pub use shape::ShapeOp;

use crate::OpRegistry;

/// Register the builtin primitives explicitly.
///
/// `collect_inventory` would find them as well, but linkers are free to drop
/// unreferenced inventory submissions from static archives.
pub fn register_all(reg: &mut OpRegistry) {
    reg.register(IdentityOp::new());
    reg.register(IdentityNOp::new());
    reg.register(ZerosLikeOp::new());
    reg.register(OnesLikeOp::new());
    reg.register(ShapeOp::new());
    reg.register(ExpandDimsOp::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{KernelContext, Op};
    use crate::types::{OpError, TensorAny};
    use core_types::DataType;
    use memory::MemoryManager;
    use tensor::Tensor;

    fn f32_tensor(mm: &MemoryManager, data: &[f32], shape: &[usize]) -> TensorAny {
        Tensor::from_vec(mm, data, shape, 0).unwrap().into()
    }

    fn values(mm: &MemoryManager, t: &TensorAny) -> Vec<f32> {
        match t {
            TensorAny::F32(t) => t.to_vec(mm).unwrap(),
            other => panic!("expected f32, got {:?}", other.dtype()),
        }
    }

    #[test]
    fn identity_aliases_its_input() {
        let mm = MemoryManager::new(None);
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let x = f32_tensor(&mm, &[1.0, 2.0], &[2]);

        let out = IdentityOp::new().compute(std::slice::from_ref(&x), &kc).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].shares_buffer_with(&x));
        assert_eq!(values(&mm, &out[0]), vec![1.0, 2.0]);
    }

    #[test]
    fn identity_n_keeps_order() {
        let mm = MemoryManager::new(None);
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let xs = vec![
            f32_tensor(&mm, &[1.0], &[1]),
            f32_tensor(&mm, &[2.0, 3.0], &[2]),
            f32_tensor(&mm, &[4.0], &[]),
        ];
        let out = IdentityNOp::new().compute(&xs, &kc).unwrap();
        assert_eq!(out.len(), 3);
        for (o, x) in out.iter().zip(&xs) {
            assert!(o.shares_buffer_with(x));
        }
    }

    #[test]
    fn fill_like_kernels_allocate_fresh_buffers() {
        let mm = MemoryManager::new(None);
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let x = f32_tensor(&mm, &[5.0, 6.0, 7.0, 8.0], &[2, 2]);

        let zeros = ZerosLikeOp::new().compute(std::slice::from_ref(&x), &kc).unwrap();
        let ones = OnesLikeOp::new().compute(std::slice::from_ref(&x), &kc).unwrap();
        assert!(!zeros[0].shares_buffer_with(&x));
        assert_eq!(zeros[0].dims(), vec![2, 2]);
        assert_eq!(values(&mm, &zeros[0]), vec![0.0; 4]);
        assert_eq!(values(&mm, &ones[0]), vec![1.0; 4]);
    }

    #[test]
    fn fill_like_respects_the_memory_budget() {
        let mm = MemoryManager::new(Some(16));
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let x = f32_tensor(&mm, &[1.0, 2.0, 3.0, 4.0], &[4]);

        let err = OnesLikeOp::new().compute(std::slice::from_ref(&x), &kc).unwrap_err();
        assert!(matches!(err, OpError::Allocation { .. }));
    }

    #[test]
    fn shape_reports_dims_as_i32() {
        let mm = MemoryManager::new(None);
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let x: TensorAny = Tensor::<u32>::empty(&mm, &[2, 3, 4], 0).unwrap().into();

        let out = ShapeOp::new().compute(&[x], &kc).unwrap();
        match &out[0] {
            TensorAny::I32(t) => {
                assert_eq!(t.dims(), vec![3]);
                assert_eq!(t.to_vec(&mm).unwrap(), vec![2, 3, 4]);
            }
            other => panic!("expected i32, got {:?}", other.dtype()),
        }
        assert_eq!(ShapeOp::new().output_dtypes(&[DataType::F32]), vec![DataType::I32]);
    }

    #[test]
    fn expand_dims_inserts_an_axis() {
        let mm = MemoryManager::new(None);
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let x = f32_tensor(&mm, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);

        for (dim, expected) in [(0i32, vec![1, 2, 3]), (1, vec![2, 1, 3]), (-1, vec![2, 3, 1]), (-3, vec![1, 2, 3])] {
            let d: TensorAny = Tensor::from_vec(&mm, &[dim], &[], 0).unwrap().into();
            let out = ExpandDimsOp::new().compute(&[x.clone(), d], &kc).unwrap();
            assert_eq!(out[0].dims(), expected, "dim {dim}");
            assert!(out[0].shares_buffer_with(&x));
        }

        let d64: TensorAny = Tensor::from_vec(&mm, &[2i64], &[1], 0).unwrap().into();
        let out = ExpandDimsOp::new().compute(&[x.clone(), d64], &kc).unwrap();
        assert_eq!(out[0].dims(), vec![2, 3, 1]);
    }

    #[test]
    fn expand_dims_rejects_bad_dims() {
        let mm = MemoryManager::new(None);
        let kc = KernelContext { memory: &mm, device_id: 0 };
        let x = f32_tensor(&mm, &[1.0, 2.0], &[2]);

        let out_of_range: TensorAny = Tensor::from_vec(&mm, &[3i32], &[], 0).unwrap().into();
        let two_values: TensorAny = Tensor::from_vec(&mm, &[0i32, 1], &[2], 0).unwrap().into();
        for dim in [out_of_range, two_values] {
            let err = ExpandDimsOp::new().compute(&[x.clone(), dim], &kc).unwrap_err();
            assert!(matches!(err, OpError::InvalidInput { .. }), "{err}");
        }

        let deep: TensorAny = Tensor::<f32>::empty(&mm, &[1; core_types::MAX_DIMS], 0).unwrap().into();
        let zero: TensorAny = Tensor::from_vec(&mm, &[0i32], &[], 0).unwrap().into();
        let err = ExpandDimsOp::new().compute(&[deep, zero], &kc).unwrap_err();
        assert!(matches!(err, OpError::InvalidInput { .. }));
    }
}
