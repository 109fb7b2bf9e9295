use std::cell::Cell;

use crate::object::ObjectId;
use crate::{Error, Result};

thread_local! {
    // context bound on this thread, each thread owns its slot
    static CURRENT_CONTEXT: Cell<Option<ObjectId>> = const { Cell::new(None) };
}

/// Id of the render context current on the calling thread
pub fn current_context() -> Option<ObjectId> {
    CURRENT_CONTEXT.with(|current| current.get())
}

pub fn is_current(context: ObjectId) -> bool {
    current_context() == Some(context)
}

/// Makes `context` current on the calling thread. `bind` performs the native binding and
/// only runs when the context is initialized and not already current here.
pub fn make_current_with<F>(context: ObjectId, initialized: bool, bind: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    if !initialized {
        return Err(Error::uninitialized(format!(
            "render context {} has no native context",
            context
        )));
    }
    if is_current(context) {
        return Ok(());
    }
    bind()?;
    CURRENT_CONTEXT.with(|current| current.set(Some(context)));
    Ok(())
}

/// Releases `context` from the calling thread. `unbind` clears the native binding and
/// only runs when the context is current here.
pub fn make_obsolete_with<F>(context: ObjectId, unbind: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    if !is_current(context) {
        return Ok(());
    }
    unbind()?;
    CURRENT_CONTEXT.with(|current| current.set(None));
    Ok(())
}
