//! Build and execute single primitive operations against pluggable backends.
//!
//! ```no_run
//! use opforge::{ContextConfig, EagerContext, array_ops};
//!
//! let ctx = EagerContext::new(ContextConfig::default())?;
//! let x = ctx.from_vec(&[1.0f32, 2.0, 3.0], &[3])?;
//! let y = array_ops::expand_dims(&ctx, x, ctx.scalar(0i32)?, None)?;
//! assert_eq!(ctx.dims(y)?, vec![1, 3]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use core_types::{DataType, Element};
pub use execution::{
    ConfigError, ContextConfig, EagerContext, GraphContext, NodeDef, ENV_DEFAULT_DEVICE,
    ENV_MEMORY_LIMIT,
};
pub use opforge_core::{
    execute_into, run_op, DeviceSpec, Error, ErrorCode, ExecutionContext, InputSlot, Operation,
    Result, TensorHandle,
};
pub use opforge_ops::{array_ops, OpRegistry};

pub mod logging {
    use tracing_subscriber::EnvFilter;

    const DEFAULT_FILTER: &str = "info";

    fn filter() -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }

    /// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
    ///
    /// Panics if a global subscriber is already set; see [`try_init`].
    pub fn init() {
        tracing_subscriber::fmt().with_env_filter(filter()).with_target(false).init();
    }

    /// Like [`init`], but returns `false` instead of panicking when a
    /// subscriber is already installed.
    pub fn try_init() -> bool {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_target(false)
            .try_init()
            .is_ok()
    }
}
