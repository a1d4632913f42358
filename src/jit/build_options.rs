// This module provides ExecutableBuildOptions, the builder-style record the backend
// consumes when it turns a compiled computation into an executable. It mirrors the
// XLA type of the same name: a device ordinal (-1 when not chosen), an optional result
// layout, lazily created debug options, replica and partition counts and the
// alias-passthrough flag. Setters return &mut Self so calls can be chained. The record
// renders as a one-line human readable string and converts to its proto form.

//! Executable build options.

use std::fmt;

use crate::jit::compiler::UNSET_DEVICE_ORDINAL;
use crate::protos::{DebugOptions, ExecutableBuildOptionsProto, Shape};

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableBuildOptions {
    device_ordinal: i32,
    result_layout: Option<Shape>,
    debug_options: Option<DebugOptions>,
    num_replicas: i32,
    num_partitions: i32,
    alias_passthrough_params: bool,
    run_backend_only: bool,
}

impl Default for ExecutableBuildOptions {
    fn default() -> Self {
        Self {
            device_ordinal: UNSET_DEVICE_ORDINAL,
            result_layout: None,
            debug_options: None,
            num_replicas: 1,
            num_partitions: 1,
            alias_passthrough_params: false,
            run_backend_only: false,
        }
    }
}

impl ExecutableBuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device the executable is built for, or `-1` if not chosen.
    pub fn device_ordinal(&self) -> i32 {
        self.device_ordinal
    }

    pub fn set_device_ordinal(&mut self, device_ordinal: i32) -> &mut Self {
        self.device_ordinal = device_ordinal;
        self
    }

    pub fn result_layout(&self) -> Option<&Shape> {
        self.result_layout.as_ref()
    }

    pub fn set_result_layout(&mut self, shape: Shape) -> &mut Self {
        self.result_layout = Some(shape);
        self
    }

    pub fn has_debug_options(&self) -> bool {
        self.debug_options.is_some()
    }

    pub fn debug_options(&self) -> Option<&DebugOptions> {
        self.debug_options.as_ref()
    }

    /// Debug options, created with defaults on first access.
    pub fn mutable_debug_options(&mut self) -> &mut DebugOptions {
        self.debug_options.get_or_insert_with(DebugOptions::default)
    }

    pub fn num_replicas(&self) -> i32 {
        self.num_replicas
    }

    pub fn set_num_replicas(&mut self, num_replicas: i32) -> &mut Self {
        self.num_replicas = num_replicas;
        self
    }

    pub fn num_partitions(&self) -> i32 {
        self.num_partitions
    }

    pub fn set_num_partitions(&mut self, num_partitions: i32) -> &mut Self {
        self.num_partitions = num_partitions;
        self
    }

    pub fn alias_passthrough_params(&self) -> bool {
        self.alias_passthrough_params
    }

    pub fn set_alias_passthrough_params(&mut self, alias: bool) -> &mut Self {
        self.alias_passthrough_params = alias;
        self
    }

    pub fn run_backend_only(&self) -> bool {
        self.run_backend_only
    }

    pub fn set_run_backend_only(&mut self, run_backend_only: bool) -> &mut Self {
        self.run_backend_only = run_backend_only;
        self
    }

    pub fn to_proto(&self) -> ExecutableBuildOptionsProto {
        ExecutableBuildOptionsProto {
            device_ordinal: i64::from(self.device_ordinal),
            result_layout: self.result_layout.clone(),
            debug_options: self.debug_options.clone(),
            num_replicas: i64::from(self.num_replicas),
            num_partitions: i64::from(self.num_partitions),
            alias_passthrough_params: self.alias_passthrough_params,
            run_backend_only: self.run_backend_only,
        }
    }
}

impl fmt::Display for ExecutableBuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result_layout = self
            .result_layout
            .as_ref()
            .map_or_else(|| "nullopt".to_string(), Shape::to_string);
        let detailed_logging = self
            .debug_options
            .as_ref()
            .is_some_and(|debug| debug.xla_detailed_logging_and_dumping);
        write!(
            f,
            "ExecutableBuildOptions{{device_ordinal={}, result_layout={}, num_replicas={}, \
             num_partitions={}, alias_passthrough_params={}, detailed_logging={}}}",
            self.device_ordinal,
            result_layout,
            self.num_replicas,
            self.num_partitions,
            self.alias_passthrough_params,
            detailed_logging,
        )
    }
}
