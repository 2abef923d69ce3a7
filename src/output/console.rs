//! Terminal rendering of scan events and campaign summaries

use super::{NotificationManager, ScanEvent};
use crate::campaign::CampaignReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

/// Subscribes to scan events and prints them as they arrive
#[derive(Debug, Clone, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Start rendering in the background. The task ends once every sender
    /// of `notifier` has been dropped.
    pub fn spawn(self, notifier: &NotificationManager) -> JoinHandle<()> {
        let rx = notifier.subscribe();
        tokio::spawn(self.run(rx))
    }

    async fn run(self, mut rx: Receiver<ScanEvent>) {
        let mut bar: Option<ProgressBar> = None;

        loop {
            match rx.recv().await {
                Ok(event) => self.render(event, &mut bar),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Console reporter fell behind, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        if let Some(bar) = bar.take() {
            bar.finish_and_clear();
        }
    }

    fn render(&self, event: ScanEvent, bar: &mut Option<ProgressBar>) {
        match &event {
            ScanEvent::PhaseStarted { subnets, .. } => {
                if let Some(old) = bar.take() {
                    old.finish_and_clear();
                }
                let phase_bar = ProgressBar::new(*subnets as u64);
                phase_bar.set_style(
                    ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} subnets {elapsed_precise}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("=> "),
                );
                *bar = Some(phase_bar);
            }
            ScanEvent::SubnetCompleted { .. } | ScanEvent::SubnetFailed { .. } => {
                if let Some(bar) = bar.as_ref() {
                    bar.inc(1);
                }
            }
            _ => {}
        }

        if let Some(line) = format_event(&event, self.verbose) {
            match bar.as_ref() {
                Some(bar) => bar.suspend(|| println!("{}", line)),
                None => println!("{}", line),
            }
        }

        if let ScanEvent::PhaseCompleted { .. } = event {
            if let Some(done) = bar.take() {
                done.finish_and_clear();
            }
        }
    }
}

/// Text for one event, `None` when the event is not shown at this verbosity
pub fn format_event(event: &ScanEvent, verbose: bool) -> Option<String> {
    match event {
        ScanEvent::CampaignStarted { phases, probe } => Some(format!(
            "{} Starting sweep: {} phase(s), probe: {}",
            "[~]".bright_blue(),
            phases,
            probe.bright_cyan()
        )),
        ScanEvent::PhaseStarted {
            label,
            subnets,
            host_limit,
            subnet_limit,
        } => Some(format!(
            "\n{} {} ({} subnets, {} hosts x {} subnets in flight)",
            "[*]".bright_blue(),
            label.bold(),
            subnets,
            host_limit,
            subnet_limit
        )),
        ScanEvent::SubnetStarted { subnet, range, .. } if verbose => {
            Some(format!("{} Scanning {}.x hosts {}", "[~]".bright_blue(), subnet, range))
        }
        ScanEvent::HostProgress {
            subnet,
            completed,
            total,
            responders,
        } if verbose => Some(format!(
            "    {}: {}/{} hosts probed, {} alive",
            subnet, completed, total, responders
        )),
        ScanEvent::HostAlive { address, rtt } => Some(format!(
            "{} Host alive: {} ({:.1} ms)",
            "[+]".bright_green(),
            address.to_string().bright_green().bold(),
            rtt.as_secs_f64() * 1000.0
        )),
        ScanEvent::SubnetCompleted {
            subnet,
            hosts,
            responders,
            cancelled,
        } => {
            let suffix = if *cancelled { " (cancelled)" } else { "" };
            if *responders == 0 {
                Some(format!(
                    "{} {}.x: no responders in {} hosts{}",
                    "[-]".dimmed(),
                    subnet,
                    hosts,
                    suffix
                ))
            } else {
                Some(format!(
                    "{} {}.x: {} responder(s) in {} hosts{}",
                    "[✓]".bright_green(),
                    subnet,
                    responders.to_string().bright_green(),
                    hosts,
                    suffix
                ))
            }
        }
        ScanEvent::SubnetFailed { subnet, error } => Some(format!(
            "{} {}.x failed: {}",
            "[!]".bright_red(),
            subnet,
            error
        )),
        ScanEvent::BatchCompleted {
            phase,
            batch,
            batches,
            subnets_done,
            subnets_total,
        } => Some(format!(
            "{} {}: batch {}/{} done ({}/{} subnets)",
            "[~]".bright_blue(),
            phase,
            batch,
            batches,
            subnets_done,
            subnets_total
        )),
        ScanEvent::PhaseCompleted { label, totals, elapsed } => Some(format!(
            "{} {}: {} responder(s) across {} subnets ({} hosts) in {:.2}s",
            "[=]".bright_blue(),
            label,
            totals.responders,
            totals.subnets_scanned,
            totals.hosts_scanned,
            elapsed.as_secs_f64()
        )),
        ScanEvent::CampaignCompleted { cancelled: true, .. } => {
            Some(format!("{}", "[!] Sweep cancelled, results are partial".bright_yellow()))
        }
        _ => None,
    }
}

/// Print the final totals of a campaign
pub fn print_summary(report: &CampaignReport) {
    let responders = report.responders();

    println!();
    println!("{}", "Sweep summary".bold().underline());
    println!("  {:<18} {}", "Mode:", report.mode);
    println!("  {:<18} {}", "Probe:", report.probe);
    println!("  {:<18} {}", "Started:", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  {:<18} {}", "Subnets scanned:", report.totals.subnets_scanned);
    if report.totals.subnets_failed > 0 {
        println!(
            "  {:<18} {}",
            "Subnets failed:",
            report.totals.subnets_failed.to_string().bright_red()
        );
    }
    println!("  {:<18} {}", "Hosts scanned:", report.totals.hosts_scanned);
    println!(
        "  {:<18} {}",
        "Total responders:",
        report.totals.responders.to_string().bright_green().bold()
    );
    println!("  {:<18} {:.2}s", "Elapsed:", report.elapsed.as_secs_f64());
    println!("  {:<18} {:.1} hosts/sec", "Throughput:", report.hosts_per_second);

    if !responders.is_empty() {
        println!();
        println!("{}", "Responding hosts:".bold());
        for address in responders {
            println!("  {}", address.to_string().bright_green());
        }
    }

    if report.cancelled {
        println!();
        println!("{}", "[!] Sweep was cancelled before completion".bright_yellow());
    }
}
