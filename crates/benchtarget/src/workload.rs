//! Synthetic client sessions.
//!
//! A session issues calls against a target the way a device server would on
//! behalf of one client: the always-executed hook first, then the hardware
//! hook where the host calls one, then the request itself. A session runs
//! either for a fixed number of calls or for a fixed period of time. Used by
//! `benchtargetd` and by the concurrency tests.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::attributes::{Attribute, AttributeValue, Command, CommandArg};
use crate::buffers::ImageFrame;
use crate::error::Result;
use crate::pipe::{PipeBlob, PipeValue};
use crate::target::BenchmarkTarget;

/// Single kind of request issued by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ScalarRead,
    ScalarWrite,
    SpectrumRead,
    SpectrumWrite,
    ImageRead,
    ImageWrite,
    Command,
    PipeRead,
    PipeWrite,
}

impl CallKind {
    /// Every call kind, in round-robin order.
    pub const ALL: [CallKind; 9] = [
        CallKind::ScalarRead,
        CallKind::ScalarWrite,
        CallKind::SpectrumRead,
        CallKind::SpectrumWrite,
        CallKind::ImageRead,
        CallKind::ImageWrite,
        CallKind::Command,
        CallKind::PipeRead,
        CallKind::PipeWrite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CallKind::ScalarRead => "scalar-read",
            CallKind::ScalarWrite => "scalar-write",
            CallKind::SpectrumRead => "spectrum-read",
            CallKind::SpectrumWrite => "spectrum-write",
            CallKind::ImageRead => "image-read",
            CallKind::ImageWrite => "image-write",
            CallKind::Command => "command",
            CallKind::PipeRead => "pipe-read",
            CallKind::PipeWrite => "pipe-write",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requests a session issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workload {
    /// The same kind on every call.
    Only(CallKind),
    /// Round-robin over every call kind.
    All,
}

impl Workload {
    pub fn name(&self) -> &'static str {
        match self {
            Workload::Only(kind) => kind.name(),
            Workload::All => "all",
        }
    }

    /// Kind issued as call number `i`.
    fn kind_for_call(self, i: usize) -> CallKind {
        match self {
            Workload::Only(kind) => kind,
            Workload::All => CallKind::ALL[i % CallKind::ALL.len()],
        }
    }
}

impl From<CallKind> for Workload {
    fn from(kind: CallKind) -> Self {
        Workload::Only(kind)
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Workload {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl FromStr for Workload {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Workload::All);
        }
        CallKind::ALL
            .iter()
            .find(|kind| kind.name() == s)
            .map(|kind| Workload::Only(*kind))
            .ok_or_else(|| format!("Unknown workload: {}", s))
    }
}

/// How long a session keeps issuing calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Stop after this many calls.
    Calls(usize),
    /// Stop at the first call boundary after this much time has passed.
    Period(Duration),
}

impl Budget {
    fn exhausted(&self, calls: usize, start: Instant) -> bool {
        match self {
            Budget::Calls(limit) => calls >= *limit,
            Budget::Period(period) => start.elapsed() >= *period,
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Calls(calls) => write!(f, "{} calls", calls),
            Budget::Period(period) => write!(f, "{:.3}s", period.as_secs_f64()),
        }
    }
}

/// Outcome of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub workload: Workload,
    pub calls: usize,
    pub failures: usize,
    pub elapsed: Duration,
}

impl SessionReport {
    /// Successful calls per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.calls - self.failures) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Issues requests of `workload` against `target` until `budget` runs out.
pub fn run_session(target: &BenchmarkTarget, workload: Workload, budget: Budget) -> SessionReport {
    let start = Instant::now();
    let mut calls = 0;
    let mut failures = 0;

    while !budget.exhausted(calls, start) {
        let kind = workload.kind_for_call(calls);
        if let Err(e) = issue(target, kind, calls) {
            debug!("{} call {} failed: {}", kind, calls, e);
            failures += 1;
        }
        calls += 1;
    }

    SessionReport {
        workload,
        calls,
        failures,
        elapsed: start.elapsed(),
    }
}

fn issue(target: &BenchmarkTarget, kind: CallKind, i: usize) -> Result<()> {
    target.always_executed_hook();
    match kind {
        CallKind::ScalarRead => read(target, Attribute::BenchmarkScalar),
        CallKind::SpectrumRead => read(target, Attribute::BenchmarkSpectrum),
        CallKind::ImageRead => read(target, Attribute::BenchmarkImage),
        CallKind::ScalarWrite => write(
            target,
            Attribute::BenchmarkScalar,
            AttributeValue::Double(i as f64),
        ),
        CallKind::SpectrumWrite => {
            let length = target.buffers().spectrum_length();
            write(
                target,
                Attribute::BenchmarkSpectrum,
                AttributeValue::Spectrum(vec![i as f64; length]),
            )
        }
        CallKind::ImageWrite => {
            let (rows, cols) = target.buffers().image_size();
            let frame = ImageFrame::new(rows, cols, vec![i as f64; rows * cols])?;
            write(target, Attribute::BenchmarkImage, AttributeValue::Image(frame))
        }
        CallKind::Command => target.command_inout(Command::BenchmarkCommand, CommandArg::Void),
        CallKind::PipeRead => target.read_pipe().map(|_| ()),
        CallKind::PipeWrite => target.write_pipe(
            PipeBlob::new("SessionBlob").with_element("Call", PipeValue::Long(i as i64)),
        ),
    }
}

fn read(target: &BenchmarkTarget, attr: Attribute) -> Result<()> {
    target.read_attr_hardware(&[attr]);
    target.read_attribute(attr).map(|_| ())
}

fn write(target: &BenchmarkTarget, attr: Attribute, value: AttributeValue) -> Result<()> {
    target.write_attribute(attr, value)?;
    target.write_attr_hardware(&[attr]);
    Ok(())
}
