//! Bulk enumeration: drive a scan and hand each result to a callback.

use std::convert::Infallible;
use std::ops::ControlFlow;

use tracing::{debug, warn};
use vista_ignore::IgnoreEngine;
use vista_types::{PathKey, StatusFlags};

use crate::error::{SourceError, StatusError, StatusResult};
use crate::list::StatusList;
use crate::options::StatusOptions;
use crate::reconcile::Reconciler;
use crate::source::StatusBackend;

/// Enumerate the scan results in ascending path order.
///
/// The handler sees every path the options select. Returning
/// `ControlFlow::Break(code)` stops the scan at once and the code is
/// returned as `Ok(ControlFlow::Break(code))`; a completed scan returns
/// `Ok(ControlFlow::Continue(()))`. A source failure ends the scan with
/// [`StatusError::AdapterFailure`], which records how many entries the
/// handler had already received.
pub fn for_each<B, F, C>(
    backend: &B,
    ignores: &IgnoreEngine,
    options: &StatusOptions,
    mut handler: F,
) -> StatusResult<ControlFlow<C>>
where
    B: StatusBackend + ?Sized,
    F: FnMut(&PathKey, StatusFlags) -> ControlFlow<C>,
{
    let mut reported = 0usize;
    let failed = |reported: usize, source: SourceError| {
        warn!(reported, error = %source, "status scan aborted");
        StatusError::AdapterFailure { reported, source }
    };

    let reconciler =
        Reconciler::new(backend, ignores, options).map_err(|source| failed(reported, source))?;
    for item in reconciler {
        let (path, flags) = item.map_err(|source| failed(reported, source))?;
        reported += 1;
        if let ControlFlow::Break(code) = handler(&path, flags) {
            debug!(reported, path = %path, "handler stopped the scan");
            return Ok(ControlFlow::Break(code));
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Run a full scan and collect the results.
pub fn collect<B>(
    backend: &B,
    ignores: &IgnoreEngine,
    options: &StatusOptions,
) -> StatusResult<StatusList>
where
    B: StatusBackend + ?Sized,
{
    let mut list = StatusList::default();
    let _ = for_each(backend, ignores, options, |path, flags| {
        list.push(path.clone(), flags);
        ControlFlow::<Infallible>::Continue(())
    })?;
    Ok(list)
}
