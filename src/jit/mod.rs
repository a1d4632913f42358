// This module groups the compiler-facing half of the crate: the value types shared
// with the XLA compiler, the executable build options record, the device-API rollout
// configuration and the compile utilities that tie them to the op-execution framework.

//! JIT compile utilities.

pub mod build_options;
pub mod compile_util;
pub mod compiler;
pub mod flags;

pub use build_options::ExecutableBuildOptions;
pub use compile_util::{
    build_argument, create_single_op_graph, pjrt_device_compilation_profiler_resource_name,
    pjrt_device_compiler_resource_name, resolve_build_options,
    use_pjrt_for_single_device_compilation,
};
pub use compiler::{
    ArgumentKind, CollectiveInfo, CompilationArgument, CompilationResult, CompilerOptions,
    DeviceType, XlaArgument, UNSET_DEVICE_ORDINAL,
};
pub use flags::DeviceApiRolloutConfig;
