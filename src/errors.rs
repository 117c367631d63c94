// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for reconciliation operations

use thiserror::Error;

use crate::device::{DeviceError, DeviceOperation};
use crate::domain::ValidationError;

/// Errors that can occur while reconciling a resource
///
/// A missing object is never an error: reads return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Desired state is malformed; raised before any device call
    #[error("validation failed: {source}")]
    Validation {
        resource: String,
        source: ValidationError,
    },

    /// Device state is incompatible with the desired state
    #[error("conflict on {resource} ({field}): {detail}")]
    Conflict {
        resource: String,
        field: String,
        detail: String,
    },

    /// Resource is still referenced and cannot be destroyed
    #[error("cannot destroy {resource}: still referenced by {dependents:?}")]
    Dependency {
        resource: String,
        dependents: Vec<String>,
    },

    /// Network failure or timeout; the caller may retry
    #[error("transient failure during {operation} of {resource}: {detail}")]
    Transient {
        resource: String,
        operation: DeviceOperation,
        detail: String,
    },

    /// Any other device rejection
    #[error("device error during {operation} of {resource}: {detail}")]
    Device {
        resource: String,
        operation: DeviceOperation,
        detail: String,
    },
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Resource the error is about
    pub fn resource(&self) -> &str {
        match self {
            Self::Validation { resource, .. }
            | Self::Conflict { resource, .. }
            | Self::Dependency { resource, .. }
            | Self::Transient { resource, .. }
            | Self::Device { resource, .. } => resource,
        }
    }

    /// Wrap a device error
    ///
    /// `field` names what the request was changing and is reported on
    /// conflicts.
    pub fn from_device(
        resource: &str,
        operation: DeviceOperation,
        field: &str,
        err: DeviceError,
    ) -> Self {
        match err {
            DeviceError::Conflict { detail, .. } => Self::Conflict {
                resource: resource.to_string(),
                field: field.to_string(),
                detail,
            },
            DeviceError::InUse { referrers, .. } => Self::Dependency {
                resource: resource.to_string(),
                dependents: referrers,
            },
            DeviceError::Transient(detail) => Self::Transient {
                resource: resource.to_string(),
                operation,
                detail,
            },
            other @ (DeviceError::NotFound { .. } | DeviceError::Rejected { .. }) => Self::Device {
                resource: resource.to_string(),
                operation,
                detail: other.to_string(),
            },
        }
    }
}

impl From<ValidationError> for ReconcileError {
    fn from(source: ValidationError) -> Self {
        Self::Validation {
            resource: source.resource().to_string(),
            source,
        }
    }
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required setting absent
    #[error("Configuration error: {0} is not set")]
    Missing(&'static str),

    /// Setting present but unusable
    #[error("Configuration error: {name}={value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
