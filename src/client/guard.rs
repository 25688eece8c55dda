use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;

use crate::client::error::ClientError;

/// Tracks which endpoints have a request outstanding.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<&'static str>>>,
}

impl InFlight {
    /// Claim `endpoint`, failing with `Busy` if it is already claimed.
    /// The claim is released when the returned guard drops.
    pub fn acquire(&self, endpoint: &'static str) -> Result<InFlightGuard, ClientError> {
        if !self.lock().insert(endpoint) {
            warn!("duplicate {endpoint} request rejected while one is in flight");
            return Err(ClientError::Busy(endpoint));
        }
        Ok(InFlightGuard {
            owner: self.clone(),
            endpoint,
        })
    }

    pub fn is_busy(&self, endpoint: &str) -> bool {
        self.lock().contains(endpoint)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<&'static str>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    owner: InFlight,
    endpoint: &'static str,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.lock().remove(self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_rejected_until_release() {
        let flight = InFlight::default();
        let guard = flight.acquire("/api/generate").unwrap();
        assert!(flight.is_busy("/api/generate"));
        assert_eq!(
            flight.acquire("/api/generate").unwrap_err(),
            ClientError::Busy("/api/generate")
        );
        // other endpoints are independent
        let _other = flight.acquire("/api/generate-checklist").unwrap();

        drop(guard);
        assert!(!flight.is_busy("/api/generate"));
        assert!(flight.acquire("/api/generate").is_ok());
    }
}
