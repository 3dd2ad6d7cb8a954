use crate::config::SmartForwardingConfig;
use crate::errors::Result;
use crate::flow::FlowController;
use crate::model::FeatureResult;
use crate::task::run_on_worker;
use crate::telephony::PlatformServices;
use crate::{log_op_end, log_op_error, log_op_start};
use smartfwd_core_types::{RunContext, RunId, RunKind};
use std::time::Instant;

const OP: &str = "enable_smart_forwarding";

/// Switches smart forwarding on for every active slot
///
/// `phone_numbers[i]` is the number slot `i` forwards to when it can't be
/// reached; normally that is the other SIM's own number.
#[derive(Debug)]
pub struct EnableSmartForwardingTask {
    services: PlatformServices,
    phone_numbers: Vec<String>,
    config: SmartForwardingConfig,
    ctx: RunContext,
}

impl EnableSmartForwardingTask {
    pub fn new(
        services: PlatformServices,
        phone_numbers: Vec<String>,
        config: SmartForwardingConfig,
    ) -> Self {
        Self {
            services,
            phone_numbers,
            config,
            ctx: RunContext::new(RunKind::Enable),
        }
    }

    /// Use a caller-supplied run context
    pub fn with_context(mut self, ctx: RunContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.ctx.run_id
    }

    /// Run the flow on the current thread
    ///
    /// Blocks for as long as the platform takes; use [`Self::run`] for the
    /// bounded version.
    pub fn call(self) -> FeatureResult {
        let mut flow = FlowController::new(self.services, self.config);
        if !flow.init(&self.phone_numbers) {
            tracing::info!(run_id = %self.ctx.run_id, "enable aborted before any step ran");
        }
        flow.start_process()
    }

    /// Run the flow on a worker thread, bounded by the task timeout
    pub fn run(self) -> Result<FeatureResult> {
        let ctx = self.ctx.clone();
        let timeout = self.config.task_timeout();
        log_op_start!(
            OP,
            run_id = %ctx.run_id,
            modem_count = self.phone_numbers.len()
        );
        let start = Instant::now();

        let result = run_on_worker("enable", &ctx, timeout, move || self.call()).map_err(|e| {
            log_op_error!(
                OP,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                run_id = %ctx.run_id
            );
            e
        })?;

        log_op_end!(
            OP,
            duration_ms = start.elapsed().as_millis() as u64,
            run_id = %ctx.run_id,
            success = result.is_success(),
            reason = ?result.reason()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SmartFwdError;
    use crate::model::FailureReason;
    use crate::sim::{FaultKind, SimOp, SimulatedDevice};
    use std::sync::Arc;
    use std::time::Duration;

    fn numbers() -> Vec<String> {
        vec!["+15550001111".to_string(), "+15550002222".to_string()]
    }

    #[test]
    fn test_run_succeeds_on_healthy_device() {
        let device = Arc::new(SimulatedDevice::with_slots(2));
        let task = EnableSmartForwardingTask::new(
            PlatformServices::from_device(device.clone()),
            numbers(),
            SmartForwardingConfig::default(),
        );

        let result = task.run().unwrap();
        assert!(result.is_success());
        assert_eq!(result.slots().len(), 2);
        assert_eq!(device.slot(1).unwrap().call_forwarding.number(), Some("+15550002222"));
    }

    #[test]
    fn test_run_times_out_on_hanging_platform() {
        let device = Arc::new(SimulatedDevice::with_slots(1));
        device.inject(SimOp::GetCallWaiting, 0, FaultKind::Hang);
        let config = SmartForwardingConfig::default().with_task_timeout(Duration::from_millis(100));
        let task = EnableSmartForwardingTask::new(
            PlatformServices::from_device(device),
            vec!["+15550002222".to_string()],
            config,
        );

        let err = task.run().unwrap_err();
        assert!(matches!(err, SmartFwdError::TaskTimeout { task: "enable", .. }));
    }

    #[test]
    fn test_call_returns_init_failure() {
        let task = EnableSmartForwardingTask::new(
            PlatformServices::unavailable(),
            numbers(),
            SmartForwardingConfig::default(),
        );
        let result = task.call();
        assert!(!result.is_success());
        assert_eq!(result.reason(), None);
    }

    #[test]
    fn test_inactive_sim_surfaces_reason() {
        let device = Arc::new(SimulatedDevice::with_slots(2));
        device.deactivate_slot(0);
        let task = EnableSmartForwardingTask::new(
            PlatformServices::from_device(device),
            numbers(),
            SmartForwardingConfig::default(),
        );
        assert_eq!(
            task.run().unwrap().reason(),
            Some(FailureReason::SimNotActive)
        );
    }
}
