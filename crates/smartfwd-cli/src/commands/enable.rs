//! Enable command

use crate::commands::context::{CliResult, GlobalArgs, Session};
use clap::Args;
use smartfwd_core::sim::{FaultKind, FaultRule, SimOp};

#[derive(Debug, Args)]
pub struct EnableArgs {
    /// Forwarding number, one per slot in slot order
    #[arg(long = "number", required = true)]
    pub numbers: Vec<String>,

    /// Make the platform reject an operation for this run (`op:slot`)
    #[arg(long = "fail", value_parser = parse_fault_target)]
    pub fail: Vec<(SimOp, usize)>,

    /// Make the platform never answer an operation for this run (`op:slot`)
    #[arg(long = "hang", value_parser = parse_fault_target)]
    pub hang: Vec<(SimOp, usize)>,
}

/// Parse `op:slot`, e.g. `update_cf:0` or `get_call_waiting:1`
fn parse_fault_target(s: &str) -> Result<(SimOp, usize), String> {
    let (op, slot) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <op>:<slot>, got '{}'", s))?;
    let op = SimOp::parse(op).ok_or_else(|| format!("unknown operation '{}'", op))?;
    let slot = slot
        .parse()
        .map_err(|_| format!("slot must be a number, got '{}'", slot))?;
    Ok((op, slot))
}

pub fn execute(global: &GlobalArgs, args: EnableArgs) -> CliResult {
    let session = Session::open(global)?;

    let faults = args
        .fail
        .iter()
        .map(|t| (t, FaultKind::Reject))
        .chain(args.hang.iter().map(|t| (t, FaultKind::Hang)));
    for (&(op, slot), kind) in faults {
        session.device.inject_rule(FaultRule {
            op,
            slot,
            kind,
            skip: 0,
        });
    }

    let notice = session.service().enable(args.numbers)?;
    session.save_device()?;

    if notice.is_failure() {
        return Err(notice.to_string().into());
    }
    println!("{}", notice);
    Ok(())
}
