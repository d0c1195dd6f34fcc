use std::{path::PathBuf, time::Duration};

use clap::Parser;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use vendor_analytics::{
    drift::{check_drift, DriftEntry, DriftOutcome},
    ReqwestTransport, DEFAULT_LIVE_SCHEMA_URL, SCHEMA_TOKEN_ENV, SCHEMA_URL_ENV,
};

const PREFIX: &str = "analytics-drift";

#[derive(Debug, Parser)]
pub struct Args {
    /// Baked schema snapshot to compare against.
    #[arg(long, default_value = "config/analytics.json")]
    pub baked: PathBuf,

    /// Live schema URL.
    #[arg(long, env = SCHEMA_URL_ENV, default_value = DEFAULT_LIVE_SCHEMA_URL)]
    pub schema_url: String,

    /// Bearer token sent with the live schema request.
    #[arg(long, env = SCHEMA_TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Timeout for the live schema request, in seconds.
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Emit a machine-readable JSON report to stdout in addition to human text.
    #[arg(long)]
    pub json: bool,
}

/// Exit 0 on match; 1 on drift or when the check could not run.
pub fn run(args: Args) -> i32 {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("{PREFIX}: failed to check ({err})");
            return 1;
        }
    };

    let token = args
        .token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty());
    let transport = ReqwestTransport::new(Duration::from_secs(args.timeout_secs));
    let outcome = runtime.block_on(check_drift(
        &transport,
        &args.baked,
        &args.schema_url,
        token,
    ));

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report_json(&outcome))
                .unwrap_or_else(|_| "{}".to_string())
        );
    }
    print_human(&outcome, args.json);
    outcome.exit_code()
}

fn print_human(outcome: &DriftOutcome, json_out: bool) {
    // With --json, stdout is reserved for the report.
    let line = |text: String| {
        if json_out {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    };
    match outcome {
        DriftOutcome::Match => line(format!("{PREFIX}: OK (schema matches baked config)")),
        DriftOutcome::Drift(diffs) => {
            line(format!("{PREFIX}: drift detected"));
            for diff in diffs {
                line(diff.to_human_line());
            }
        }
        DriftOutcome::Failed(err) => eprintln!("{PREFIX}: failed to check ({err})"),
    }
}

fn report_json(outcome: &DriftOutcome) -> Value {
    let checked_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    let status = match outcome {
        DriftOutcome::Match => "match",
        DriftOutcome::Drift(_) => "drift",
        DriftOutcome::Failed(_) => "error",
    };
    let diffs: &[DriftEntry] = match outcome {
        DriftOutcome::Drift(diffs) => diffs,
        _ => &[],
    };
    let mut out = json!({
        "ok": matches!(outcome, DriftOutcome::Match),
        "status": status,
        "checked_at": checked_at,
        "diffs": diffs,
    });
    if let DriftOutcome::Failed(err) = outcome {
        out["error"] = Value::String(err.to_string());
    }
    out
}
