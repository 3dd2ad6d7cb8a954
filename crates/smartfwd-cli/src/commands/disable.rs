//! Disable command

use crate::commands::context::{CliResult, GlobalArgs, Session};

pub fn execute(global: &GlobalArgs) -> CliResult {
    let session = Session::open(global)?;
    let notice = session.service().disable()?;
    session.save_device()?;

    if notice.is_failure() {
        return Err(notice.to_string().into());
    }
    println!("{}", notice);
    Ok(())
}
