//! Registry building, lookups and the process-wide instance.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use lite_place::{Place, PrecisionType, TargetType};

use crate::error::Error;
use crate::framework::OpArgs;
use crate::config::KernelStrategy;
use crate::op_lite::{OpLite, OpState};
use crate::picker::KernelPicker;
use crate::registry::{self, RegistryBuilder};
use crate::test::helpers::*;

fn mock_args() -> OpArgs {
    OpArgs::resolve(&mock_desc(), &mock_scope()).unwrap()
}

#[test]
fn test_duplicate_op_rejected() {
    let mut builder = RegistryBuilder::new();
    builder.register_op(MOCK_OP, None, Arc::new(|| Box::new(MockOp::new(Place::HOST_FLOAT)) as Box<dyn OpLite>));
    builder.register_op(MOCK_OP, None, Arc::new(|| Box::new(MockOp::new(Place::X86_FLOAT)) as Box<dyn OpLite>));

    assert_eq!(builder.build().unwrap_err(), Error::DuplicateOp { op_type: MOCK_OP.into() });
}

#[test]
fn test_duplicate_kernel_rejected() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut builder = RegistryBuilder::new();
    builder
        .register_kernel(MOCK_OP, Place::HOST_FLOAT, "a", mock_kernel_factory(Place::HOST_FLOAT, 1.0, runs.clone()))
        .register_kernel(MOCK_OP, Place::HOST_FLOAT, "b", mock_kernel_factory(Place::HOST_FLOAT, 2.0, runs));

    assert_eq!(
        builder.build().unwrap_err(),
        Error::DuplicateKernel { op_type: MOCK_OP.into(), place: Place::HOST_FLOAT }
    );
}

#[test]
fn test_create_op() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[Place::HOST_FLOAT]);

    let op = registry.create_op(MOCK_OP).unwrap();
    assert_eq!(op.op_type(), MOCK_OP);
    assert_eq!(op.state(), OpState::Unbuilt);
    assert!(registry.has_op(MOCK_OP));
    assert_eq!(registry.op_types(), vec![MOCK_OP]);
}

#[test]
fn test_create_unknown_op() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[]);

    let err = registry.create_op("conv2d").unwrap_err();
    assert_eq!(err, Error::OpNotRegistered { op_type: "conv2d".into() });
    assert!(registry.grad_op_type("conv2d").is_err());
}

#[test]
fn test_grad_op_type() {
    let mut builder = RegistryBuilder::new();
    builder
        .register_op("fwd", Some("fwd_grad"), Arc::new(|| Box::new(MockOp::new(Place::HOST_FLOAT)) as Box<dyn OpLite>))
        .register_op("fwd_grad", None, Arc::new(|| Box::new(MockOp::new(Place::HOST_FLOAT)) as Box<dyn OpLite>));
    let registry = builder.build().unwrap();

    assert_eq!(registry.grad_op_type("fwd").unwrap(), Some("fwd_grad"));
    assert_eq!(registry.grad_op_type("fwd_grad").unwrap(), None);
}

#[test]
fn test_kernel_places_in_place_order() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[Place::ARM_FLOAT, Place::HOST_FLOAT, Place::X86_FLOAT]);

    assert_eq!(registry.kernel_places(MOCK_OP), vec![Place::HOST_FLOAT, Place::X86_FLOAT, Place::ARM_FLOAT]);
    assert!(registry.has_kernel(MOCK_OP, Place::X86_FLOAT));
    assert!(!registry.has_kernel(MOCK_OP, Place::CUDA_FLOAT));
    assert_eq!(registry.kernel_alias(MOCK_OP, Place::X86_FLOAT), Some(kernel_name(Place::X86_FLOAT).as_str()));
    assert!(registry.kernel_places("other").is_empty());
}

#[test]
fn test_create_kernels_keeps_caller_order() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[Place::HOST_FLOAT, Place::X86_FLOAT]);
    let args = mock_args();

    let kernels = registry
        .create_kernels(&[Place::X86_FLOAT, Place::CUDA_FLOAT, Place::HOST_FLOAT, Place::X86_FLOAT], &args)
        .unwrap();

    let places: Vec<Place> = kernels.iter().map(|k| k.place()).collect();
    assert_eq!(places, vec![Place::X86_FLOAT, Place::HOST_FLOAT]);
}

#[test]
fn test_create_kernels_none_registered() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[Place::HOST_FLOAT]);
    let kernels = registry.create_kernels(&[Place::CUDA_FLOAT], &mock_args()).unwrap();
    assert!(kernels.is_empty());
}

#[test]
fn test_create_kernels_propagates_factory_error() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[Place::HOST_FLOAT]);
    let scope = mock_scope();
    let args = OpArgs::resolve(&crate::framework::OpDesc::new(MOCK_OP).input("X", &["x"]), &scope).unwrap();

    let err = registry.create_kernels(&[Place::HOST_FLOAT], &args).unwrap_err();
    assert_eq!(err, Error::MissingOutput { op_type: MOCK_OP.into(), slot: "Out".into() });
}

const HOST_ANY: Place = Place::new(TargetType::Host, PrecisionType::Any);

#[test]
fn test_any_precision_registration_serves_concrete_places() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[HOST_ANY, Place::X86_FLOAT]);

    assert!(registry.has_kernel(MOCK_OP, Place::HOST_INT32));
    assert_eq!(registry.kernel_alias(MOCK_OP, Place::HOST_FLOAT), Some(kernel_name(HOST_ANY).as_str()));
    assert!(!registry.has_kernel(MOCK_OP, Place::ARM_FLOAT));

    // Both host requests resolve to the one wildcard registration.
    let kernels = registry
        .create_kernels(&[Place::HOST_FLOAT, Place::X86_FLOAT, Place::HOST_INT32], &mock_args())
        .unwrap();
    let places: Vec<Place> = kernels.iter().map(|k| k.place()).collect();
    assert_eq!(places, vec![HOST_ANY, Place::X86_FLOAT]);
}

#[test]
fn test_exact_registration_wins_over_wildcard() {
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[HOST_ANY, Place::HOST_FLOAT]);

    let kernels = registry.create_kernels(&[Place::HOST_FLOAT], &mock_args()).unwrap();
    assert_eq!(kernels.len(), 1);
    assert_eq!(kernels[0].place(), Place::HOST_FLOAT);
}

#[test]
fn test_any_target_registration_serves_specified_pick() {
    let any_target = Place::new(TargetType::Any, PrecisionType::Float);
    let (registry, _) = mock_registry(Place::HOST_FLOAT, &[any_target]);
    let picker = KernelPicker::new(&registry);
    let scope = mock_scope();
    let op = built_mock(Place::HOST_FLOAT, &scope);

    let kernel = picker.pick(&op, &[], KernelStrategy::Specified(Place::ARM_FLOAT)).unwrap();
    assert_eq!(kernel.place(), any_target);
    assert!(picker.pick(&op, &[], KernelStrategy::Specified(Place::HOST_INT32)).is_err());
}

// The only test touching the process-wide registry.
#[test]
fn test_global_registry_init_once() {
    let (first, _) = mock_registry(Place::HOST_FLOAT, &[Place::HOST_FLOAT]);
    let (second, _) = mock_registry(Place::HOST_FLOAT, &[]);

    let installed = registry::init(first).unwrap();
    assert!(installed.has_kernel(MOCK_OP, Place::HOST_FLOAT));

    assert_eq!(registry::init(second).unwrap_err(), Error::RegistryInitialized);
    assert!(registry::global().unwrap().has_kernel(MOCK_OP, Place::HOST_FLOAT));
}
