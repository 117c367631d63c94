// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device Session Handle
//!
//! Explicit handle to one device, passed to the engine and the harness in
//! place of process-wide provider state. It owns the per-call timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::device::{DeviceClient, DeviceError, DeviceOperation, DeviceResult};

/// Shared handle to a device client plus call policy
pub struct DeviceSession<C> {
    client: Arc<C>,
    timeout: Duration,
    id: Uuid,
}

impl<C> Clone for DeviceSession<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            timeout: self.timeout,
            id: self.id,
        }
    }
}

impl<C: DeviceClient> DeviceSession<C> {
    /// Default per-call timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a session over `client`
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            timeout: Self::DEFAULT_TIMEOUT,
            id: Uuid::now_v7(),
        }
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Session id, for correlating log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Await one device call under the session timeout
    ///
    /// An elapsed timeout becomes [`DeviceError::Transient`]. The request is
    /// not cancelled on the device side; only this caller stops waiting.
    pub async fn send<T, F>(&self, operation: DeviceOperation, request: F) -> DeviceResult<T>
    where
        F: Future<Output = DeviceResult<T>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} timed out after {}ms (session {})",
                    operation,
                    self.timeout.as_millis(),
                    self.id
                );
                Err(DeviceError::Transient(format!(
                    "no response within {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}
