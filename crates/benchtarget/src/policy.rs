//! Request gating evaluated before dispatch.
//!
//! The host asks "is this request allowed" before every attribute, pipe and
//! command call. The answer is static: reads, pipe traffic and commands are
//! always permitted; attribute writes are permitted exactly when the
//! attribute is declared `ReadWrite` in [`ATTRIBUTE_ACCESS`].
//!
//! [`ATTRIBUTE_ACCESS`]: crate::attributes::ATTRIBUTE_ACCESS

use std::fmt;

use crate::attributes::{Access, Attribute, Command, BENCHMARK_PIPE};
use crate::error::{BenchmarkError, Result};

/// A request the host is about to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    ReadAttribute(Attribute),
    WriteAttribute(Attribute),
    ReadPipe,
    WritePipe,
    Command(Command),
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::ReadAttribute(attr) => write!(f, "read {}", attr),
            Request::WriteAttribute(attr) => write!(f, "write {}", attr),
            Request::ReadPipe => write!(f, "read {}", BENCHMARK_PIPE),
            Request::WritePipe => write!(f, "write {}", BENCHMARK_PIPE),
            Request::Command(cmd) => write!(f, "command {}", cmd),
        }
    }
}

/// Outcome of evaluating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Allow,
    Deny,
}

/// Looks up the rule for a request.
pub fn rule_for(request: &Request) -> Rule {
    match request {
        Request::ReadAttribute(_) | Request::ReadPipe | Request::WritePipe => Rule::Allow,
        Request::Command(_) => Rule::Allow,
        Request::WriteAttribute(attr) => match attr.access() {
            Access::ReadWrite => Rule::Allow,
            Access::ReadOnly => Rule::Deny,
        },
    }
}

pub fn is_allowed(request: &Request) -> bool {
    rule_for(request) == Rule::Allow
}

/// Returns `NotAllowed` if the request is denied.
pub fn check(request: &Request) -> Result<()> {
    match rule_for(request) {
        Rule::Allow => Ok(()),
        Rule::Deny => Err(BenchmarkError::not_allowed(request.to_string())),
    }
}
