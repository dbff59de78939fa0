//! Connectivity and clock-sync probe.
//!
//! # Offset Convention
//! `offset_ms = server_time - local_time`
//! - Positive: server clock is ahead of local
//! - Negative: server clock is behind local
//!
//! The probe is advisory. A drifted or unreachable result is reported but
//! never blocks order submission.

use std::sync::Arc;
use std::time::Duration;

use lev_gateway::{Clock, DynGateway, GatewayError, SystemClock};
use tracing::{error, info, warn};

use crate::error::ErrorKind;

/// Offsets under this are acceptable for low-latency leveraged trading.
pub const DEFAULT_SYNC_TOLERANCE_MS: u64 = 50;

/// Default timeout for the server-time call.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a clock-sync probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockSync {
    /// Offset within tolerance.
    InSync { offset_ms: i64 },
    /// Reachable, but offset at or beyond tolerance.
    Drifted { offset_ms: i64, tolerance_ms: u64 },
    /// Server time could not be obtained.
    Unreachable { reason: String },
}

impl ClockSync {
    /// Measured offset, `None` when unreachable.
    pub fn offset_ms(&self) -> Option<i64> {
        match self {
            Self::InSync { offset_ms } | Self::Drifted { offset_ms, .. } => Some(*offset_ms),
            Self::Unreachable { .. } => None,
        }
    }

    /// True only when reachable and within tolerance.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::InSync { .. })
    }

    /// `Connectivity` when the exchange could not be reached.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Unreachable { .. } => Some(ErrorKind::Connectivity),
            _ => None,
        }
    }
}

/// Issues a server-time check through the shared gateway.
pub struct ConnectivityProber {
    gateway: DynGateway,
    clock: Arc<dyn Clock>,
    tolerance_ms: u64,
    timeout: Duration,
}

impl ConnectivityProber {
    /// Create a prober with the system clock, 50ms tolerance and 5s timeout.
    pub fn new(gateway: DynGateway) -> Self {
        Self {
            gateway,
            clock: Arc::new(SystemClock),
            tolerance_ms: DEFAULT_SYNC_TOLERANCE_MS,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.tolerance_ms = tolerance_ms;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Query server time and compare with local UTC.
    pub async fn check_sync(&self) -> ClockSync {
        let result = match tokio::time::timeout(self.timeout, self.gateway.server_time()).await {
            Ok(r) => r,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        };

        let server_time = match result {
            Ok(t) => t,
            Err(e) => {
                let reason = e.reason();
                error!(reason = %reason, "Exchange unreachable, clock sync unknown");
                return ClockSync::Unreachable { reason };
            }
        };

        let local_ms = self.clock.now_ms() as i64;
        let offset_ms = server_time.timestamp_millis() - local_ms;

        if offset_ms.unsigned_abs() < self.tolerance_ms {
            info!(
                server_time = %server_time.format("%Y-%m-%d %H:%M:%S"),
                offset_ms,
                "Connected, clock in sync"
            );
            ClockSync::InSync { offset_ms }
        } else {
            warn!(
                server_time = %server_time.format("%Y-%m-%d %H:%M:%S"),
                offset_ms,
                tolerance_ms = self.tolerance_ms,
                "Connected, clock offset exceeds tolerance"
            );
            ClockSync::Drifted {
                offset_ms,
                tolerance_ms: self.tolerance_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use lev_gateway::MockGateway;

    const LOCAL_MS: u64 = 1_761_300_000_000;

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    fn prober_with_server_offset(offset_ms: i64) -> (Arc<MockGateway>, ConnectivityProber) {
        let gateway = Arc::new(MockGateway::new());
        let server = Utc
            .timestamp_millis_opt(LOCAL_MS as i64 + offset_ms)
            .single()
            .unwrap();
        gateway.set_server_time(Ok(server));
        let prober = ConnectivityProber::new(gateway.clone())
            .with_clock(Arc::new(FixedClock(LOCAL_MS)));
        (gateway, prober)
    }

    #[tokio::test]
    async fn test_small_offset_is_in_sync() {
        let (_, prober) = prober_with_server_offset(12);
        let sync = prober.check_sync().await;
        assert_eq!(sync, ClockSync::InSync { offset_ms: 12 });
        assert!(sync.is_ok());
    }

    #[tokio::test]
    async fn test_negative_offset_is_signed() {
        let (_, prober) = prober_with_server_offset(-30);
        let sync = prober.check_sync().await;
        assert_eq!(sync.offset_ms(), Some(-30));
        assert!(sync.is_ok());
    }

    #[tokio::test]
    async fn test_large_offset_is_drifted_not_failure() {
        let (_, prober) = prober_with_server_offset(-250);
        let sync = prober.check_sync().await;
        assert_eq!(
            sync,
            ClockSync::Drifted {
                offset_ms: -250,
                tolerance_ms: 50
            }
        );
        assert!(!sync.is_ok());
        assert_eq!(sync.offset_ms(), Some(-250));
    }

    #[tokio::test]
    async fn test_tolerance_boundary() {
        let (_, prober) = prober_with_server_offset(50);
        assert!(!prober.check_sync().await.is_ok());

        let (_, prober) = prober_with_server_offset(49);
        assert!(prober.check_sync().await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_is_not_zero_offset() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_server_time(Err(GatewayError::Unreachable("dns failure".into())));
        let prober = ConnectivityProber::new(gateway.clone());

        let sync = prober.check_sync().await;
        assert!(matches!(sync, ClockSync::Unreachable { ref reason } if reason.contains("dns failure")));
        assert_eq!(sync.offset_ms(), None);
        assert_eq!(sync.error_kind(), Some(ErrorKind::Connectivity));
        assert!(!sync.is_ok());
        assert_eq!(gateway.call_names(), vec!["server_time"]);
    }

    #[tokio::test]
    async fn test_timeout_reports_unreachable() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_delay("server_time", Duration::from_secs(60));
        let prober = ConnectivityProber::new(gateway).with_timeout(Duration::from_millis(100));

        let sync = prober.check_sync().await;
        assert!(matches!(sync, ClockSync::Unreachable { .. }));
    }
}
