use ship_core::VcsOutcome;

use crate::app::AppContext;
use crate::git::GitVcs;

pub fn handle_init(ctx: &mut AppContext) -> anyhow::Result<()> {
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;
    let report = store.init(session, &GitVcs)?;

    if let VcsOutcome::Failed(reason) = &report.vcs {
        eprintln!("Warning: git repository was not created: {}", reason);
    }
    if !quiet {
        println!("Ship initialized at {}", report.root.display());
        if report.vcs == VcsOutcome::Initialized {
            println!("Git repository enabled.");
        }
    }
    Ok(())
}
