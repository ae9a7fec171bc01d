//! Forward expand: shape contract, inference and end-to-end runs.

use lite_core::{Error, KernelPicker, KernelStrategy, OpDesc, OpLite, OpState, Tensor};
use lite_place::{Place, PrecisionType};
use test_case::test_case;

use crate::expand::{EXPAND, EXPAND_TIMES, ExpandOp};
use crate::test::helpers::*;

fn built(scope: &lite_core::Scope, expand_times: &[i32]) -> ExpandOp {
    let mut op = ExpandOp::new();
    op.build(&expand_desc(expand_times), scope).unwrap();
    op
}

#[test]
fn test_expand_end_to_end() {
    let registry = registry();
    let picker = KernelPicker::new(&registry);
    let scope = scope_with_x(&[2, 3]);

    let mut op = picker.instantiate(&expand_desc(&[2, 1]), &scope, &[Place::HOST_FLOAT], KernelStrategy::Static).unwrap();
    assert_eq!(dims_of(&scope, "out"), vec![4, 3]);
    assert_eq!(op.kernel_place(), Some(Place::HOST_FLOAT));

    op.run().unwrap();
    assert_eq!(
        values_of(&scope, "out"),
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
    );
}

#[test_case(&[2, 3], &[2, 1], &[4, 3]; "rows doubled")]
#[test_case(&[2, 3], &[1, 3], &[2, 9]; "columns tripled")]
#[test_case(&[5], &[1], &[5]; "identity")]
#[test_case(&[1, 2, 1, 2, 1, 2], &[2, 1, 3, 1, 4, 1], &[2, 2, 3, 2, 4, 2]; "max rank")]
#[test_case(&[0, 4], &[3, 2], &[0, 8]; "empty dim")]
#[test_case(&[1 << 31, 0], &[4, 1], &[1 << 33, 0]; "large empty")]
fn test_expand_shape_law(x_dims: &[i64], expand_times: &[i32], expected: &[i64]) {
    let scope = scope_with_x(x_dims);
    let op = built(&scope, expand_times);

    op.check_shape().unwrap();
    op.infer_shape().unwrap();
    assert_eq!(dims_of(&scope, "out"), expected);
}

#[test]
fn test_expand_rejects_rank_seven() {
    let scope = scope_with_x(&[1, 1, 1, 1, 1, 1, 1]);
    let op = built(&scope, &[1; 7]);

    let expected = Error::RankOutOfRange { op_type: EXPAND.into(), slot: "X".into(), rank: 7, min: 1, max: 6 };
    assert_eq!(op.check_shape().unwrap_err(), expected);
    assert_eq!(op.infer_shape().unwrap_err(), expected);
}

#[test]
fn test_expand_rejects_rank_zero() {
    let scope = lite_core::Scope::new();
    scope.set_var("x", Tensor::from_vec(Vec::<i64>::new(), vec![1.0f32]));
    let op = built(&scope, &[]);

    assert!(matches!(op.check_shape().unwrap_err(), Error::RankOutOfRange { rank: 0, .. }));
}

#[test_case(&[2, 0], 1, 0; "zero")]
#[test_case(&[-1, 2], 0, -1; "negative")]
fn test_expand_rejects_small_multiplier(expand_times: &[i32], index: usize, value: i64) {
    let scope = scope_with_x(&[2, 3]);
    let op = built(&scope, expand_times);

    assert_eq!(
        op.infer_shape().unwrap_err(),
        Error::AttrValueOutOfRange { op_type: EXPAND.into(), attr: EXPAND_TIMES.into(), index, value, min: 1 }
    );
}

#[test]
fn test_expand_rejects_length_mismatch() {
    let scope = scope_with_x(&[2, 3]);
    let op = built(&scope, &[2, 1, 1]);

    assert_eq!(
        op.check_shape().unwrap_err(),
        Error::AttrLengthMismatch { op_type: EXPAND.into(), attr: EXPAND_TIMES.into(), len: 3, expected: 2 }
    );
}

#[test]
fn test_expand_infer_shape_idempotent() {
    let scope = scope_with_x(&[3, 2]);
    let op = built(&scope, &[2, 2]);

    op.infer_shape().unwrap();
    let first = scope.var("out").unwrap().read().clone();
    op.infer_shape().unwrap();
    let second = scope.var("out").unwrap().read().clone();

    assert_eq!(first, second);
}

#[test]
fn test_expand_shares_lod() {
    let scope = scope_with_x(&[3, 2]);
    scope.var("x").unwrap().write().set_lod(vec![vec![0, 1, 3]]);
    let op = built(&scope, &[1, 2]);

    op.infer_shape().unwrap();
    assert_eq!(scope.var("out").unwrap().read().lod(), &vec![vec![0, 1, 3]]);
}

#[test]
fn test_expand_build_requires_attr() {
    let scope = scope_with_x(&[2]);
    let desc = OpDesc::new(EXPAND).input("X", &["x"]).output("Out", &["out"]);

    let mut op = ExpandOp::new();
    assert_eq!(op.build(&desc, &scope).unwrap_err(), Error::AttrNotFound { name: EXPAND_TIMES.into() });
    assert_eq!(op.state(), OpState::Unbuilt);
}

#[test]
fn test_expand_build_requires_slots() {
    let scope = scope_with_x(&[2]);
    let mut op = ExpandOp::new();

    let no_input = OpDesc::new(EXPAND).output("Out", &["out"]).attr(EXPAND_TIMES, vec![2i32]);
    assert_eq!(
        op.build(&no_input, &scope).unwrap_err(),
        Error::MissingInput { op_type: EXPAND.into(), slot: "X".into() }
    );

    let no_output = OpDesc::new(EXPAND).input("X", &["x"]).attr(EXPAND_TIMES, vec![2i32]);
    assert_eq!(
        op.build(&no_output, &scope).unwrap_err(),
        Error::MissingOutput { op_type: EXPAND.into(), slot: "Out".into() }
    );
}

#[test]
fn test_expand_build_rejects_wrong_attr_kind() {
    let scope = scope_with_x(&[2]);
    let desc = OpDesc::new(EXPAND).input("X", &["x"]).output("Out", &["out"]).attr(EXPAND_TIMES, 2i32);

    let err = ExpandOp::new().build(&desc, &scope).unwrap_err();
    assert!(matches!(err, Error::AttrKindMismatch { expected: "ints", actual: "int", .. }));
}

#[test]
fn test_expand_build_twice() {
    let scope = scope_with_x(&[2]);
    let mut op = built(&scope, &[2]);

    assert!(matches!(op.build(&expand_desc(&[2]), &scope).unwrap_err(), Error::AlreadyBuilt { .. }));
    assert_eq!(op.expand_times(), &[2]);
}

#[test]
fn test_expand_run_before_pick() {
    let scope = scope_with_x(&[2]);
    let mut op = built(&scope, &[2]);

    assert_eq!(op.run().unwrap_err(), Error::KernelNotPicked { op_type: EXPAND.into() });
}

#[test]
fn test_expand_static_place_and_debug_string() {
    let op = ExpandOp::new();
    assert_eq!(op.static_pick_kernel(&[Place::X86_FLOAT]), Place::HOST_FLOAT);
    assert_eq!(op.op_type(), EXPAND);

    let scope = scope_with_x(&[2]);
    assert_eq!(built(&scope, &[3]).debug_string(), "expand(expandTimes=[3])");
}

#[test]
fn test_expand_runtime_strategy() {
    let registry = registry();
    let picker = KernelPicker::new(&registry);
    let scope = scope_with_x(&[2, 2]);

    let mut op = picker
        .instantiate(&expand_desc(&[1, 2]), &scope, &[Place::HOST_FLOAT, Place::X86_FLOAT], KernelStrategy::Runtime)
        .unwrap();
    assert!(matches!(op.kernel_place(), Some(Place::HOST_FLOAT | Place::X86_FLOAT)));

    op.run().unwrap();
    assert_eq!(values_of(&scope, "out"), vec![0.0, 1.0, 0.0, 1.0, 2.0, 3.0, 2.0, 3.0]);
}

#[test]
fn test_expand_runtime_over_every_registered_place() {
    let registry = registry();
    let picker = KernelPicker::new(&registry);
    let places = registry.kernel_places(EXPAND);
    let scope = scope_with_x(&[2, 3]);

    // The Int32 kernel cannot run on float input and drops out of the comparison.
    let mut op = picker.instantiate(&expand_desc(&[2, 1]), &scope, &places, KernelStrategy::Runtime).unwrap();
    assert!(matches!(op.kernel_place(), Some(Place::HOST_FLOAT | Place::X86_FLOAT)));
    assert_eq!(scope.var("out").unwrap().read().precision(), PrecisionType::Float);

    op.run().unwrap();
    assert_eq!(dims_of(&scope, "out"), vec![4, 3]);
    assert_eq!(values_of(&scope, "out"), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_expand_runtime_picks_int32_for_int_input() {
    let registry = registry();
    let picker = KernelPicker::new(&registry);
    let scope = lite_core::Scope::new();
    scope.set_var("x", Tensor::from_vec([2], vec![4i32, 5]));

    let mut op = picker
        .instantiate(&expand_desc(&[2]), &scope, &registry.kernel_places(EXPAND), KernelStrategy::Runtime)
        .unwrap();
    assert_eq!(op.kernel_place(), Some(Place::HOST_INT32));

    op.run().unwrap();
    assert_eq!(scope.var("out").unwrap().read().as_slice::<i32>().unwrap(), &[4, 5, 4, 5]);
}

#[test]
fn test_expand_rejects_negative_dim() {
    let scope = lite_core::Scope::new();
    scope.set_var("x", Tensor::from_vec([-1, 2], Vec::<f32>::new()));
    let op = built(&scope, &[2, 1]);

    let expected = Error::NegativeDim { op_type: EXPAND.into(), slot: "X".into(), dim: 0, size: -1 };
    assert_eq!(op.check_shape().unwrap_err(), expected);
    assert_eq!(op.infer_shape().unwrap_err(), expected);
}

#[test_case(&[0, 1 << 62], &[1, 4]; "dimension")]
#[test_case(&[1, 1, 1], &[i32::MAX, i32::MAX, i32::MAX]; "element count")]
fn test_expand_overflow_is_an_error(x_dims: &[i64], expand_times: &[i32]) {
    let registry = registry();
    let picker = KernelPicker::new(&registry);
    let scope = scope_with_x(x_dims);

    let err = picker
        .instantiate(&expand_desc(expand_times), &scope, &[Place::HOST_FLOAT], KernelStrategy::Static)
        .unwrap_err();
    assert_eq!(
        err,
        Error::ShapeOverflow {
            op_type: EXPAND.into(),
            slot: "X".into(),
            dims: x_dims.to_vec(),
            times: expand_times.to_vec(),
        }
    );
}

#[test]
fn test_expand_no_kernel_for_places() {
    let registry = registry();
    let picker = KernelPicker::new(&registry);
    let scope = scope_with_x(&[2]);

    let err = picker
        .instantiate(&expand_desc(&[2]), &scope, &[Place::CUDA_FLOAT], KernelStrategy::Runtime)
        .unwrap_err();
    assert_eq!(err, Error::KernelNotFound { op_type: EXPAND.into(), places: vec![Place::CUDA_FLOAT] });
}
