//! Print the executable build options resolved for a set of compiler flags.
//!
//! Useful for checking which device ordinal and debug flags a JIT configuration
//! ends up with, without running a compilation.

use clap::Parser;
use prost::Message;
use xla_compile_util::jit::{
    resolve_build_options, CollectiveInfo, CompilationResult, CompilerOptions, UNSET_DEVICE_ORDINAL,
};
use xla_compile_util::protos::{PrimitiveType, Shape};

#[derive(Parser, Debug)]
#[command(name = "xla-build-options", allow_negative_numbers = true)]
struct Args {
    /// Device ordinal set in the compiler options (-1 = unset)
    #[arg(long, default_value_t = UNSET_DEVICE_ORDINAL)]
    device_ordinal: i32,

    /// Fallback ordinal used when the options leave it unset (-1 = none)
    #[arg(long, default_value_t = UNSET_DEVICE_ORDINAL)]
    default_device_ordinal: i32,

    #[arg(long)]
    alias_passthrough_params: bool,

    /// Turn off detailed logging and dumping
    #[arg(long)]
    no_detailed_logging: bool,

    #[arg(long)]
    deterministic_ops: bool,

    /// Element type of the result, e.g. f32 or s32
    #[arg(long)]
    element_type: Option<PrimitiveType>,

    /// Comma-separated result dimensions
    #[arg(long, value_delimiter = ',', requires = "element_type")]
    dims: Vec<i64>,

    /// Replica count of the collectives in the result
    #[arg(long)]
    num_replicas: Option<i32>,

    /// Also print the size of the encoded proto
    #[arg(long)]
    proto: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::debug!("{:?}", args);

    let options = CompilerOptions {
        device_ordinal: args.device_ordinal,
        alias_passthrough_params: args.alias_passthrough_params,
        detailed_logging: !args.no_detailed_logging,
        op_determinism_required: args.deterministic_ops,
        ..Default::default()
    };
    let result = CompilationResult {
        xla_output_shape: args
            .element_type
            .map(|ty| Shape::array(ty, &args.dims))
            .unwrap_or_default(),
        collective_info: args.num_replicas.map(|group_size| CollectiveInfo {
            group_size,
            ..Default::default()
        }),
        ..Default::default()
    };

    let build_options = resolve_build_options(&options, &result, args.default_device_ordinal);
    log::info!("Resolved build options for ordinal {}", build_options.device_ordinal());
    println!("{build_options}");
    if args.proto {
        println!("encoded proto: {} bytes", build_options.to_proto().encoded_len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_dims_require_element_type() {
        let err = Args::try_parse_from(["xla-build-options", "--dims", "2,3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let args =
            Args::try_parse_from(["xla-build-options", "--element-type", "f32", "--dims", "2,3"])
                .unwrap();
        assert_eq!(args.element_type, Some(PrimitiveType::F32));
        assert_eq!(args.dims, vec![2, 3]);
    }

    #[test]
    fn test_negative_ordinals_parse() {
        let args = Args::try_parse_from(["xla-build-options", "--device-ordinal", "-1"]).unwrap();
        assert_eq!(args.device_ordinal, UNSET_DEVICE_ORDINAL);
    }
}
