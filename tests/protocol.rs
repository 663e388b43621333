use opforge::{
    array_ops, execute_into, ContextConfig, DataType, EagerContext, ErrorCode, ExecutionContext,
    GraphContext, InputSlot, TensorHandle,
};
use pretty_assertions::assert_eq;

/// Handles prepared on one backend
struct Inputs {
    x:   TensorHandle,
    y:   TensorHandle,
    z:   TensorHandle,
    d:   TensorHandle,
    dim: TensorHandle,
}

fn eager() -> (EagerContext, Inputs) {
    let ctx = EagerContext::new(ContextConfig::default()).unwrap();
    let inputs = Inputs {
        x:   ctx.from_vec(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap(),
        y:   ctx.from_vec(&[7i32, 8], &[2]).unwrap(),
        z:   ctx.scalar(9u32).unwrap(),
        d:   ctx.from_vec(&[10i64, 11, 12], &[3]).unwrap(),
        dim: ctx.scalar(0i32).unwrap(),
    };
    (ctx, inputs)
}

fn graph() -> (GraphContext, Inputs) {
    let ctx = GraphContext::new();
    let inputs = Inputs {
        x:   ctx.placeholder(DataType::F32, Some("x")),
        y:   ctx.placeholder(DataType::I32, Some("y")),
        z:   ctx.placeholder(DataType::U32, Some("z")),
        d:   ctx.placeholder(DataType::I64, Some("d")),
        dim: ctx.placeholder(DataType::I32, Some("dim")),
    };
    (ctx, inputs)
}

/// Run `check` once per backend
fn on_both_backends(check: impl Fn(&dyn ExecutionContext, &Inputs)) {
    let (ctx, inputs) = eager();
    check(&ctx, &inputs);
    let (ctx, inputs) = graph();
    check(&ctx, &inputs);
}

#[test]
fn ordered_sequence_reports_true_output_count() {
    on_both_backends(|ctx, i| {
        let cases: [(&str, Vec<InputSlot>, usize); 6] = [
            ("Identity", vec![i.x.into()], 1),
            ("IdentityN", vec![vec![i.x, i.y, i.z].into()], 3),
            ("ZerosLike", vec![i.y.into()], 1),
            ("OnesLike", vec![i.d.into()], 1),
            ("Shape", vec![i.x.into()], 1),
            ("ExpandDims", vec![i.x.into(), i.dim.into()], 1),
        ];
        for (op_name, slots, count) in cases {
            let mut out = vec![None; count];
            let n = execute_into(ctx, op_name, &slots, Some("traced"), &mut out).unwrap();
            assert_eq!(n, count, "{} {op_name}", ctx.backend());
            assert!(out.iter().all(Option::is_some));
        }
    });
}

#[test]
fn add_input_before_reset_fails_and_execute_fails_too() {
    on_both_backends(|ctx, i| {
        let mut op = ctx.create_operation();
        assert_eq!(op.add_input(i.x).unwrap_err().code(), ErrorCode::InvalidArgument);
        let mut out = [None];
        assert!(op.execute(&mut out).is_err());
        assert_eq!(out, [None]);
    });
}

#[test]
fn reset_twice_is_invalid() {
    on_both_backends(|ctx, _| {
        let mut op = ctx.create_operation();
        op.reset("Identity", None).unwrap();
        assert_eq!(
            op.reset("Identity", None).unwrap_err().code(),
            ErrorCode::InvalidArgument
        );
    });
}

#[test]
fn list_then_single_keeps_order_and_grouping() {
    on_both_backends(|ctx, i| {
        let mut op = ctx.create_operation();
        op.reset("IdentityN", None).unwrap();
        op.add_input_list(&[i.x, i.y, i.z]).unwrap();
        op.add_input(i.d).unwrap();

        let state = op.state();
        assert_eq!(state.flat_inputs(), vec![i.x, i.y, i.z, i.d]);
        assert_eq!(
            state.inputs(),
            &[InputSlot::Group(vec![i.x, i.y, i.z]), InputSlot::Single(i.d)][..]
        );
    });
}

#[test]
fn undersized_output_buffer_is_rejected() {
    on_both_backends(|ctx, i| {
        let mut out = [None; 2];
        let err = execute_into(ctx, "IdentityN", &[vec![i.x, i.y, i.z].into()], None, &mut out)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(out, [None, None]);

        let mut empty: [Option<TensorHandle>; 0] = [];
        let err = execute_into(ctx, "Identity", &[i.x.into()], None, &mut empty).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    });
}

#[test]
fn larger_output_buffer_reports_actual_count() {
    on_both_backends(|ctx, i| {
        let mut out = [None; 4];
        let n = execute_into(ctx, "Identity", &[i.x.into()], None, &mut out).unwrap();
        assert_eq!(n, 1);
        assert!(out[0].is_some());
        assert_eq!(out[1..], [None, None, None]);
    });
}

#[test]
fn unknown_primitive_is_not_found() {
    on_both_backends(|ctx, i| {
        let err = execute_into(ctx, "MatrixInverse", &[i.x.into()], None, &mut [None]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    });
}

#[test]
fn foreign_handles_are_invalid_arguments() {
    let (eager_ctx, eager_inputs) = eager();
    let (graph_ctx, graph_inputs) = graph();

    let err = array_ops::identity(&eager_ctx, graph_inputs.x, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    let err = array_ops::identity(&graph_ctx, eager_inputs.x, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn eager_identity_returns_equal_value() {
    let (ctx, i) = eager();
    let y = array_ops::identity(&ctx, i.x, None).unwrap();
    assert_eq!(ctx.to_vec::<f32>(y).unwrap(), ctx.to_vec::<f32>(i.x).unwrap());
    assert_eq!(ctx.dims(y).unwrap(), vec![2, 3]);
}

#[test]
fn eager_identity_n_preserves_order() {
    let (ctx, i) = eager();
    let outs = array_ops::identity_n(&ctx, &[i.x, i.y, i.z], Some("fanout")).unwrap();
    assert_eq!(outs.len(), 3);
    assert_eq!(ctx.to_vec::<f32>(outs[0]).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(ctx.to_vec::<i32>(outs[1]).unwrap(), vec![7, 8]);
    assert_eq!(ctx.to_vec::<u32>(outs[2]).unwrap(), vec![9]);
}

#[test]
fn eager_helpers_compute_host_values() {
    let (ctx, i) = eager();

    let zeros = array_ops::zeros_like(&ctx, i.d, None).unwrap();
    assert_eq!(ctx.to_vec::<i64>(zeros).unwrap(), vec![0, 0, 0]);

    let ones = array_ops::ones_like(&ctx, i.x, None).unwrap();
    assert_eq!(ctx.to_vec::<f32>(ones).unwrap(), vec![1.0; 6]);
    assert_eq!(ctx.dims(ones).unwrap(), vec![2, 3]);

    let shape = array_ops::shape(&ctx, i.x, None).unwrap();
    assert_eq!(ctx.dtype(shape).unwrap(), DataType::I32);
    assert_eq!(ctx.to_vec::<i32>(shape).unwrap(), vec![2, 3]);

    let last = ctx.scalar(-1i64).unwrap();
    let expanded = array_ops::expand_dims(&ctx, i.x, last, None).unwrap();
    assert_eq!(ctx.dims(expanded).unwrap(), vec![2, 3, 1]);
    assert!(ctx.same_storage(expanded, i.x).unwrap());

    let too_far = ctx.scalar(3i32).unwrap();
    let err = array_ops::expand_dims(&ctx, i.x, too_far, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn graph_helpers_record_labelled_nodes() {
    let (ctx, i) = graph();
    let s = array_ops::shape(&ctx, i.x, Some("x_shape")).unwrap();
    let e = array_ops::expand_dims(&ctx, s, i.dim, None).unwrap();

    let (node, _) = ctx.node_for(e).unwrap();
    assert_eq!(node.op_type, "ExpandDims");
    assert_eq!(node.inputs, vec![InputSlot::Single(s), InputSlot::Single(i.dim)]);
    assert_eq!(ctx.node_for(s).unwrap().0.name, "x_shape");
    assert_eq!(ctx.dtype(e).unwrap(), DataType::I32);
}

#[test]
fn memory_budget_surfaces_as_resource_exhausted() {
    let cfg = ContextConfig::from_yaml_str("memory_limit_bytes: 40\n").unwrap();
    let ctx = EagerContext::new(cfg).unwrap();
    let x = ctx.from_vec(&[1.0f32; 8], &[8]).unwrap();

    let err = array_ops::ones_like(&ctx, x, None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ResourceExhausted);

    // releasing the input frees enough room
    let copy = array_ops::identity(&ctx, x, None).unwrap();
    ctx.release(x).unwrap();
    assert!(ctx.memory_in_use() > 0);
    ctx.release(copy).unwrap();
    assert_eq!(ctx.memory_in_use(), 0);
    let y = ctx.from_vec(&[2.0f32; 8], &[8]).unwrap();
    assert_eq!(ctx.to_vec::<f32>(y).unwrap(), vec![2.0; 8]);
}

#[test]
fn configured_default_device_places_outputs() {
    let cfg = ContextConfig::from_yaml_str("host_devices: 3\n")
        .unwrap()
        .with_overrides(|key| (key == opforge::ENV_DEFAULT_DEVICE).then(|| "CPU:2".to_string()))
        .unwrap();
    let ctx = EagerContext::new(cfg).unwrap();
    let x = ctx.scalar(1.5f32).unwrap();
    let y = array_ops::zeros_like(&ctx, x, None).unwrap();
    assert_eq!(ctx.device_of(x).unwrap(), 2);
    assert_eq!(ctx.device_of(y).unwrap(), 2);

    let mut op = ctx.create_operation();
    assert_eq!(op.reset("ZerosLike", Some("CPU:3")).unwrap_err().code(), ErrorCode::InvalidArgument);
}

#[test]
fn logging_installs_once() {
    opforge::logging::try_init();
    assert!(!opforge::logging::try_init());
}
