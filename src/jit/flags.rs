// This module provides DeviceApiRolloutConfig, the explicit form of the switch that
// decides whether the JIT routes a device type through the PJRT device API. Each of
// the three single-device entry points (XlaLaunch, compile-on-demand and
// compile-and-run) is enabled separately, and only device types in the allowed list
// are affected. The allowed list parses from a comma-separated string such as
// "GPU,CPU"; empty entries are rejected.

//! Device-API rollout configuration.

use std::collections::BTreeSet;
use std::str::FromStr;

use crate::core::error::JitError;
use crate::jit::compiler::DeviceType;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceApiRolloutConfig {
    pub enabled_for_xla_launch: bool,
    pub enabled_for_compile_on_demand: bool,
    pub enabled_for_compile_and_run: bool,
    allowed_devices: BTreeSet<DeviceType>,
}

impl DeviceApiRolloutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_device(&mut self, device_type: DeviceType) -> &mut Self {
        self.allowed_devices.insert(device_type);
        self
    }

    pub fn allowed_devices(&self) -> impl Iterator<Item = &DeviceType> + '_ {
        self.allowed_devices.iter()
    }

    fn is_allowed(&self, device_type: &DeviceType) -> bool {
        self.allowed_devices.contains(device_type)
    }

    pub fn is_enabled_in_xla_launch_for_device(&self, device_type: &DeviceType) -> bool {
        self.enabled_for_xla_launch && self.is_allowed(device_type)
    }

    pub fn is_enabled_in_xla_compile_on_demand_for_device(&self, device_type: &DeviceType) -> bool {
        self.enabled_for_compile_on_demand && self.is_allowed(device_type)
    }

    pub fn is_enabled_in_xla_compile_and_run_for_device(&self, device_type: &DeviceType) -> bool {
        self.enabled_for_compile_and_run && self.is_allowed(device_type)
    }
}

impl FromStr for DeviceApiRolloutConfig {
    type Err = JitError;

    /// Parse the allowed device list; all entry points start disabled.
    fn from_str(list: &str) -> Result<Self, Self::Err> {
        let mut config = Self::new();
        if list.trim().is_empty() {
            return Ok(config);
        }
        for entry in list.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(JitError::InvalidDeviceList { list: list.to_string() });
            }
            config.allow_device(DeviceType::new(entry));
        }
        Ok(config)
    }
}
