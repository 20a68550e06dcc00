//! Lazily constructed provider handle.

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::provider::DscCli;
use crate::settings::ProcessorSettings;
use std::path::PathBuf;
use std::sync::Arc;

/// Return the handle in `slot`, constructing it on first use.
///
/// The executable comes from `settings.executable` when set; otherwise
/// `locate` is called. A failure leaves the slot empty so a later call may
/// try again.
pub fn get_or_create_engine<'a>(
    slot: &'a mut Option<DscCli>,
    settings: &Arc<ProcessorSettings>,
    diagnostics: &Diagnostics,
    locate: impl FnOnce() -> locator::Result<PathBuf>,
) -> Result<&'a DscCli> {
    let engine = match slot.take() {
        Some(engine) => engine,
        None => {
            let executable = match &settings.executable {
                Some(path) => path.clone(),
                None => locate()?,
            };
            log::debug!("Using provider executable {}", executable.display());
            DscCli::new(executable, Arc::clone(settings), diagnostics.clone())
        }
    };

    Ok(slot.insert(engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::cell::Cell;
    use std::path::Path;

    #[test]
    fn test_constructs_once() {
        let settings = Arc::new(ProcessorSettings::default());
        let calls = Cell::new(0);
        let locate = || {
            calls.set(calls.get() + 1);
            Ok(PathBuf::from("/opt/dsc/dsc"))
        };

        let mut slot = None;
        let first = get_or_create_engine(&mut slot, &settings, &Diagnostics::none(), locate)
            .unwrap()
            .executable()
            .to_path_buf();
        let second = get_or_create_engine(&mut slot, &settings, &Diagnostics::none(), || {
            calls.set(calls.get() + 1);
            Ok(PathBuf::from("/elsewhere/dsc"))
        })
        .unwrap()
        .executable()
        .to_path_buf();

        assert_eq!(first, second);
        assert_eq!(first, Path::new("/opt/dsc/dsc"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_configured_executable_skips_locate() {
        let settings = Arc::new(ProcessorSettings::new().executable("/custom/dsc"));
        let mut slot = None;

        let engine = get_or_create_engine(&mut slot, &settings, &Diagnostics::none(), || {
            panic!("locate must not run")
        })
        .unwrap();
        assert_eq!(engine.executable(), Path::new("/custom/dsc"));
    }

    #[test]
    fn test_locate_failure_leaves_slot_empty() {
        let settings = Arc::new(ProcessorSettings::default());
        let mut slot = None;

        let err = get_or_create_engine(&mut slot, &settings, &Diagnostics::none(), || {
            Err(locator::Error::DiscoveryNotFound {
                stable_minimum: locator::STABLE_MINIMUM_VERSION,
                preview_minimum: locator::PREVIEW_MINIMUM_VERSION,
            })
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryNotFound);
        assert!(slot.is_none());

        get_or_create_engine(&mut slot, &settings, &Diagnostics::none(), || {
            Ok(PathBuf::from("/opt/dsc/dsc"))
        })
        .unwrap();
        assert!(slot.is_some());
    }
}
