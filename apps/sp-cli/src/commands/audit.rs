// audit.rs — Inspect a local JSONL audit log.

use clap::Subcommand;

use sp_audit::JsonlAuditSink;

use crate::config::CliConfig;

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Verify the hash chain of the audit log.
    Verify,
    /// Print the last N events.
    Tail {
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
}

pub fn run(command: AuditCommands, config: &CliConfig) -> anyhow::Result<()> {
    match command {
        AuditCommands::Verify => {
            JsonlAuditSink::verify_chain(&config.audit_log)?;
            let events = JsonlAuditSink::read_all(&config.audit_log)?;
            println!(
                "ok: {} events, chain intact ({})",
                events.len(),
                config.audit_log.display()
            );
        }
        AuditCommands::Tail { count } => {
            let events = JsonlAuditSink::read_all(&config.audit_log)?;
            for event in events.iter().rev().take(count).rev() {
                println!(
                    "{} {:<24} {:<10} tenant={} corr={}",
                    event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    event.action,
                    format!("{:?}", event.status).to_lowercase(),
                    event.tenant_id,
                    event.correlation_id,
                );
            }
        }
    }
    Ok(())
}
