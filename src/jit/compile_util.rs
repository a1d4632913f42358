// This module holds the adapter between the JIT's single-op execution path and the
// ahead-of-time compiler. build_argument reads a live execution context and produces
// the per-op compile argument: the op's declared output dtypes, a copy of the kernel's
// node def and an empty compiler config. resolve_build_options merges compiler options
// and a compilation result into executable build options, applying the three-tier
// device ordinal rule (options ordinal, then caller fallback, then unset). Both are
// pure and total. create_single_op_graph wraps one node def into a graph with _Arg
// and _Retval placeholders. The remaining helpers answer whether a device type goes
// through the PJRT device API and name the per-device PJRT resources.

//! Single-op compile utilities.
//!
//! ```ignore
//! let arg = build_argument(harness.context().unwrap());
//! let build_options = resolve_build_options(&options, &result, -1);
//! ```

use crate::core::context::OpExecutionContext;
use crate::core::error::{JitError, JitResult};
use crate::framework::graph::{Graph, SOURCE_ID};
use crate::framework::node_def_builder::NodeDefBuilder;
use crate::framework::op_registry::{ARG_OP, RETVAL_OP};
use crate::jit::build_options::ExecutableBuildOptions;
use crate::jit::compiler::{CompilationArgument, CompilationResult, CompilerOptions, DeviceType, XlaArgument};
use crate::jit::flags::DeviceApiRolloutConfig;
use crate::protos::{ConfigProto, DataType, NodeDef};

/// Build the compile argument for the op bound to `ctx`.
///
/// The config is always left empty; callers that need one set it themselves.
pub fn build_argument<C>(ctx: &C) -> CompilationArgument
where
    C: OpExecutionContext + ?Sized,
{
    CompilationArgument {
        output_dtypes: ctx.expected_output_dtypes(),
        node_def: ctx.op_kernel_def().clone(),
        config_proto: ConfigProto::default(),
    }
}

/// Build options for turning `result` into an executable.
///
/// The device ordinal comes from `options` if set, otherwise from
/// `default_device_ordinal` if that is non-negative, otherwise it stays `-1`.
pub fn resolve_build_options(
    options: &CompilerOptions,
    result: &CompilationResult,
    default_device_ordinal: i32,
) -> ExecutableBuildOptions {
    let mut build_options = ExecutableBuildOptions::new();

    if let Some(collective_info) = &result.collective_info {
        build_options.set_num_replicas(collective_info.group_size);
    }

    if options.device_ordinal >= 0 {
        build_options.set_device_ordinal(options.device_ordinal);
    } else if default_device_ordinal >= 0 {
        build_options.set_device_ordinal(default_device_ordinal);
    }

    build_options
        .set_result_layout(result.xla_output_shape.clone())
        .set_alias_passthrough_params(options.alias_passthrough_params);

    let debug_options = build_options.mutable_debug_options();
    debug_options.xla_detailed_logging_and_dumping = options.detailed_logging;
    if options.op_determinism_required {
        debug_options.xla_gpu_deterministic_ops = true;
    }

    build_options
}

/// Wrap `node_def` into a graph: `_arg{i}` feeds input `i`, output `i` feeds `_retval{i}`.
///
/// `result_types` may cover a prefix of the op's outputs but never more than it has.
pub fn create_single_op_graph(
    node_def: &NodeDef,
    args: &[XlaArgument],
    result_types: &[DataType],
) -> JitResult<Graph<'static>> {
    let mut graph = Graph::new();
    let main = graph.add_node(node_def.clone())?;

    let num_inputs = graph.node(main)?.input_types().len();
    if args.len() != num_inputs {
        return Err(JitError::ArgumentCountMismatch {
            node: node_def.name.clone(),
            expected: num_inputs,
            actual: args.len(),
        });
    }

    let num_outputs = graph.node(main)?.output_types().len();
    if result_types.len() > num_outputs {
        return Err(JitError::ResultCountMismatch {
            node: node_def.name.clone(),
            expected: num_outputs,
            actual: result_types.len(),
        });
    }

    for (i, arg) in args.iter().enumerate() {
        let arg_def = NodeDefBuilder::new(format!("_arg{i}"), ARG_OP)
            .control_input(graph.source_node().name())
            .attr("T", arg.graph_type())
            .attr("index", i as i64)
            .finalize()?;
        let arg_node = graph.add_node(arg_def)?;
        graph.add_control_edge(SOURCE_ID, arg_node)?;
        graph.add_edge(arg_node, 0, main, i as i32)?;
    }

    for (i, &result_type) in result_types.iter().enumerate() {
        let retval_def = NodeDefBuilder::new(format!("_retval{i}"), RETVAL_OP)
            .input_from(&node_def.name, i, result_type)
            .attr("T", result_type)
            .attr("index", i as i64)
            .finalize()?;
        let retval_node = graph.add_node(retval_def)?;
        graph.add_edge(main, i as i32, retval_node, 0)?;
    }

    graph.fixup_source_and_sink_edges();
    log::debug!(
        "Single-op graph for {} ({}): {} args, {} results, {} nodes",
        node_def.name,
        node_def.op,
        args.len(),
        result_types.len(),
        graph.num_nodes()
    );
    Ok(graph)
}

/// Whether single-device compilation for `device_type` goes through the PJRT device API.
pub fn use_pjrt_for_single_device_compilation(
    device_type: &DeviceType,
    rollout: &DeviceApiRolloutConfig,
) -> bool {
    rollout.is_enabled_in_xla_launch_for_device(device_type)
        || rollout.is_enabled_in_xla_compile_on_demand_for_device(device_type)
        || rollout.is_enabled_in_xla_compile_and_run_for_device(device_type)
}

pub fn pjrt_device_compiler_resource_name(device_type: &DeviceType) -> String {
    format!("pjrt_device_compiler_{device_type}")
}

pub fn pjrt_device_compilation_profiler_resource_name(device_type: &DeviceType) -> String {
    format!("pjrt_device_compilation_profiler_{device_type}")
}
