use smartfwd_core::sim::SimulatedDevice;
use smartfwd_core::PlatformServices;
use std::sync::Arc;

/// Numbers used across scenarios: slot 0 forwards to SIM 2, slot 1 to SIM 1
pub const SLOT0_TARGET: &str = "+15550001111";
pub const SLOT1_TARGET: &str = "+15550002222";

#[allow(dead_code)]
pub fn two_numbers() -> Vec<String> {
    vec![SLOT0_TARGET.to_string(), SLOT1_TARGET.to_string()]
}

/// A dual-SIM device with both slots active and nothing configured
#[allow(dead_code)]
pub fn dual_sim() -> Arc<SimulatedDevice> {
    Arc::new(SimulatedDevice::with_slots(2))
}

#[allow(dead_code)]
pub fn services(device: &Arc<SimulatedDevice>) -> PlatformServices {
    PlatformServices::from_device(device.clone())
}
