// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy for the procedure engine.
//!
//! Four kinds of failure flow out of the engine:
//!
//! * validation errors: a precondition the engine itself enforces does not
//!   hold (missing dependency service, ambiguous package name, ...);
//! * internal errors: invariant violations that indicate a sequencing bug;
//! * collaborator errors: failures from a remote control-plane service,
//!   wrapped with the name of the collaborator they came from;
//! * multi-errors: the aggregate of a batch where individual items are
//!   independent and the batch deliberately runs to completion.

use std::fmt;

use uuid::Uuid;

/// Kinds of records the engine looks up in remote collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceType {
    Service,
    Instance,
    Vm,
    Network,
    Nic,
    Server,
    Image,
    Package,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Service => "service",
            ResourceType::Instance => "instance",
            ResourceType::Vm => "VM",
            ResourceType::Network => "network",
            ResourceType::Nic => "NIC",
            ResourceType::Server => "server",
            ResourceType::Image => "image",
            ResourceType::Package => "package",
        };
        write!(f, "{}", s)
    }
}

/// How an object was looked up, for `ObjectNotFound` errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupType {
    /// a specific name was requested
    ByName(String),
    /// a specific id was requested
    ById(Uuid),
    /// a specific version was requested
    ByVersion(String),
}

impl LookupType {
    /// Returns an `ObjectNotFound` error for the case where this lookup
    /// failed.
    pub fn into_not_found(self, type_name: ResourceType) -> Error {
        Error::ObjectNotFound { type_name, lookup_type: self }
    }
}

impl fmt::Display for LookupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupType::ByName(name) => write!(f, "\"{}\"", name),
            LookupType::ById(id) => write!(f, "id {}", id),
            LookupType::ByVersion(v) => write!(f, "version \"{}\"", v),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// An object needed for this operation was not found.
    #[error("{type_name} not found: {lookup_type}")]
    ObjectNotFound { type_name: ResourceType, lookup_type: LookupType },

    /// A precondition enforced by the engine does not hold.  Always fatal,
    /// surfaced verbatim to the operator.
    #[error("{message}")]
    Validation { message: String },

    /// An invariant violation that should be impossible given correct prior
    /// steps.  Indicates a bug in the sequencing logic.
    #[error("internal error: {internal_message}")]
    Internal { internal_message: String },

    /// A failure from a remote control-plane collaborator, wrapped with the
    /// collaborator's name.  Never retried by the engine.
    #[error("request to {collaborator} failed: {message}")]
    Collaborator { collaborator: &'static str, message: String },

    /// An error annotated with what the engine was doing at the time.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// The aggregate of a batch that ran to completion past individual
    /// failures.
    #[error("{}", display_error_list(.0))]
    Multiple(Vec<Error>),
}

impl Error {
    pub fn validation<S: Into<String>>(message: S) -> Error {
        Error::Validation { message: message.into() }
    }

    pub fn internal<S: Into<String>>(internal_message: S) -> Error {
        Error::Internal { internal_message: internal_message.into() }
    }

    pub fn collaborator<S: Into<String>>(
        collaborator: &'static str,
        message: S,
    ) -> Error {
        Error::Collaborator { collaborator, message: message.into() }
    }

    /// Wraps `self` with a description of the operation that failed.
    pub fn with_context<S: Into<String>>(self, context: S) -> Error {
        Error::Context { context: context.into(), source: Box::new(self) }
    }
}

/// Collapses a list of per-item errors from a batch: an empty list is
/// success, a single error is returned as-is, and anything more becomes
/// [`Error::Multiple`].
pub fn merge_error_list(errors: Vec<Error>) -> Result<(), Error> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.into_iter().next().unwrap()),
        _ => Err(Error::Multiple(errors)),
    }
}

fn display_error_list(errors: &[Error]) -> String {
    let mut out = format!("{} errors occurred:", errors.len());
    for error in errors {
        out.push_str("\n  - ");
        out.push_str(&error.to_string());
    }
    out
}
