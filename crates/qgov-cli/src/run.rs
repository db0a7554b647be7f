//! # Run Subcommand
//!
//! Replays a call script against a fresh deployment. Time is driven by a
//! manual clock that starts at the script's `start` instant and only moves
//! when a step says so, so a replay is deterministic.
//!
//! ```yaml
//! start: "2026-03-01T00:00:00Z"
//! steps:
//!   - caller: "0x0000000000000000000000000000000000000002"
//!     call: { op: propose_add, target: "0x...10", expires_at: "2027-01-01T00:00:00Z" }
//!   - caller: "0x0000000000000000000000000000000000000003"
//!     advance_secs: 60
//!     call: { op: cast_identity_vote, target: "0x...10", support: true }
//!     expect: ok
//! ```
//!
//! `expect` is either `ok` or an error kind such as `expired` or
//! `exceeds_rate_limit`. A step without `expect` is only reported.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use qgov_core::{Clock, ManualClock, Principal, SystemClock, Timestamp};
use qgov_governance::{Call, CallOutcome, GovernanceService, Ledger};

/// Arguments for `qgov run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Genesis file.
    pub genesis: PathBuf,

    /// Call script (YAML).
    pub script: PathBuf,

    /// Print the final service state as JSON.
    #[arg(long)]
    pub snapshot: bool,
}

/// A replayable sequence of calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Clock start. Defaults to the wall clock at replay time.
    #[serde(default)]
    pub start: Option<Timestamp>,
    /// Steps, in order.
    pub steps: Vec<Step>,
}

/// One call in a script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Who makes the call.
    pub caller: Principal,
    /// Seconds to move the clock forward before the call.
    #[serde(default)]
    pub advance_secs: u64,
    /// The call.
    pub call: Call,
    /// `ok` or the expected error kind.
    #[serde(default)]
    pub expect: Option<String>,
}

/// Result of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Step index.
    pub index: usize,
    /// The call's `op` tag.
    pub op: &'static str,
    /// Clock reading when the call ran.
    pub at: Timestamp,
    /// Outcome, or the error kind and message.
    pub result: std::result::Result<CallOutcome, (&'static str, String)>,
    /// Whether the step met its expectation (true when it had none).
    pub met: bool,
}

impl StepReport {
    /// One-line rendering: `OK`/`ERR`, plus `MISMATCH` when the step's
    /// expectation was not met.
    pub fn render(&self) -> String {
        let flag = if self.met { "" } else { " MISMATCH" };
        match &self.result {
            Ok(outcome) => format!(
                "OK  [{}] {} @ {}: {}{flag}",
                self.index,
                self.op,
                self.at,
                serde_json::to_string(outcome).unwrap_or_else(|_| "?".into())
            ),
            Err((kind, msg)) => format!(
                "ERR [{}] {} @ {}: {kind}: {msg}{flag}",
                self.index, self.op, self.at
            ),
        }
    }
}

/// Parse a script document.
pub fn parse_script(raw: &str) -> Result<Script> {
    serde_yaml::from_str(raw).context("parsing call script")
}

/// Replay `script` against `service`, moving `clock` as the steps say.
///
/// `clock` must be the clock `service` reads.
pub fn replay<L: Ledger>(
    service: &GovernanceService<L, ManualClock>,
    clock: &ManualClock,
    script: &Script,
) -> Vec<StepReport> {
    script
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            clock.advance_secs(step.advance_secs);
            let at = clock.now();
            let result = service
                .execute(step.caller, &step.call)
                .map_err(|e| (e.kind(), e.to_string()));
            let met = match (step.expect.as_deref(), &result) {
                (None, _) => true,
                (Some("ok"), Ok(_)) => true,
                (Some(kind), Err((actual, _))) => kind == *actual,
                (Some(_), Ok(_)) => false,
            };
            StepReport {
                index,
                op: step.call.name(),
                at,
                result,
                met,
            }
        })
        .collect()
}

/// Execute `qgov run`.
pub fn run_script(args: &RunArgs) -> Result<u8> {
    let config = crate::load_genesis(&args.genesis)?;
    let script = read_script(&args.script)?;

    let start = script.start.unwrap_or_else(|| SystemClock.now());
    let clock = ManualClock::new(start);
    let service = crate::build_service(&config, clock.clone())?;

    let reports = replay(&service, &clock, &script);
    let mismatches = reports.iter().filter(|r| !r.met).count();
    for report in &reports {
        println!("{}", report.render());
    }

    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&service.snapshot())?);
    }

    if mismatches > 0 {
        tracing::error!(mismatches, "script expectations not met");
        return Ok(1);
    }
    Ok(0)
}

fn read_script(path: &Path) -> Result<Script> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    parse_script(&raw)
}
