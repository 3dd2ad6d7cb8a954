//! Status command

use crate::commands::context::{CliResult, GlobalArgs, Session};
use smartfwd_core::CallWaitingStatus;

pub fn execute(global: &GlobalArgs) -> CliResult {
    let session = Session::open(global)?;
    let status = session.service().status()?;

    println!(
        "smart forwarding: {}",
        if status.enabled { "on" } else { "off" }
    );
    for slot in &status.slots {
        let number = slot
            .forwarding_number
            .as_ref()
            .map(|n| n.masked())
            .unwrap_or_else(|| "-".to_string());
        let device = session.device.slot(slot.slot);
        let call_waiting = device
            .as_ref()
            .map(|s| s.call_waiting == CallWaitingStatus::Enabled)
            .unwrap_or(false);
        let forwarding = device
            .as_ref()
            .filter(|s| s.call_forwarding.enabled)
            .and_then(|s| s.call_forwarding.number.as_ref())
            .map(|n| n.masked())
            .unwrap_or_else(|| "off".to_string());
        println!(
            "slot {} (sub {}): number {}, backup {}, call waiting {}, forwarding {}",
            slot.slot,
            slot.sub_id,
            number,
            if slot.has_backup { "yes" } else { "no" },
            if call_waiting { "on" } else { "off" },
            forwarding
        );
    }
    Ok(())
}
