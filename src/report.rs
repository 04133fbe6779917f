//! Address usage reports.
//!
//! Summarizes every Pod's derived network and its used/free addresses, as
//! pretty JSON or as an aligned text table.

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result};
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::error::InventoryResult;
use crate::inventory::{Lab, LabId, PodId};
use crate::registry::{LabRegistry, PodRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodReport {
    pub lab_id: LabId,
    pub pod_id: PodId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Ipv4Network>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Ipv4Addr>,
    pub device_count: usize,
    pub used: Vec<Ipv4Addr>,
    pub free_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabReport {
    pub lab: Lab,
    pub pods: Vec<PodReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub labs: Vec<LabReport>,
}

/// Summarize one Pod
pub fn pod_report(pods: &PodRegistry, lab: &LabId, pod: &PodId) -> InventoryResult<PodReport> {
    let network = pods.get_pod_network(lab, pod)?;
    let device_count = pods.get_pod_devices(lab, pod)?.len();
    let used = pods.get_used_addresses(lab, pod)?;
    let free_count = pods.count_free_addresses(lab, pod)?;

    Ok(PodReport {
        lab_id: lab.clone(),
        pod_id: pod.clone(),
        network: network.as_ref().map(|n| n.network),
        gateway: network.as_ref().map(|n| n.gateway),
        device_count,
        used,
        free_count,
    })
}

/// Summarize every Lab and Pod in the registry
pub fn build_report(labs: &LabRegistry) -> InventoryResult<InventoryReport> {
    let mut reports = Vec::new();
    for lab in labs.list() {
        let mut pods = Vec::new();
        for pod in labs.pods().list_pods(&lab.id)? {
            pods.push(pod_report(labs.pods(), &lab.id, &pod)?);
        }
        reports.push(LabReport { lab, pods });
    }

    Ok(InventoryReport {
        generated_at: Utc::now(),
        labs: reports,
    })
}

/// Generate JSON report
pub fn generate_json_report(report: &InventoryReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Generate human-readable text report
pub fn render_text_report(report: &InventoryReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("=".repeat(80));
    lines.push("                         LAB ADDRESS USAGE REPORT".to_string());
    lines.push("=".repeat(80));
    lines.push(format!("Generated: {}", report.generated_at.to_rfc3339()));
    lines.push(String::new());

    for lab_report in &report.labs {
        let lab = &lab_report.lab;
        lines.push(format!(
            "Lab {} - {} ({}, building {}, floor {})",
            lab.id, lab.meta.name, lab.meta.location, lab.meta.building, lab.meta.floor
        ));
        lines.push("-".repeat(80));

        if lab_report.pods.is_empty() {
            lines.push("  (no pods)".to_string());
        }
        for pod in &lab_report.pods {
            let network = pod
                .network
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "  {:<14} {:<20} devices {:>4}  used {:>5}  free {:>8}",
                pod.pod_id,
                network,
                pod.device_count,
                pod.used.len(),
                pod.free_count
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
