use std::sync::atomic::{AtomicBool, Ordering};

use shared::error::{ClientError, ClientResult};

/// At most one request per form. The flag is released when the guard drops,
/// whatever the outcome of the request.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub(crate) fn acquire(&self) -> ClientResult<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::InFlight)?;
        Ok(InFlightGuard { busy: &self.busy })
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

pub(crate) struct InFlightGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let flag = InFlight::default();
        let guard = flag.acquire().expect("first");
        assert!(flag.is_busy());
        assert_eq!(flag.acquire().err(), Some(ClientError::InFlight));

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.acquire().is_ok());
    }
}
