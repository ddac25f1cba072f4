use crate::app::AppContext;

pub fn handle_lock(ctx: &mut AppContext) -> anyhow::Result<()> {
    let quiet = ctx.quiet();
    let (store, session) = ctx.store_and_session()?;
    store.lock()?;
    session.lock();
    if !quiet {
        println!("Plaintext caches removed; the next command will ask for the passphrase.");
    }
    Ok(())
}
