use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::simulation::TransferComparison;

/// Write serializable rows as CSV with a header line taken from the field names.
pub fn export_dataset_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export dir {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("open csv {}", path.display()))?;
    for (idx, row) in rows.iter().enumerate() {
        writer
            .serialize(row)
            .with_context(|| format!("write csv row {idx}"))?;
    }
    writer.flush().context("flush csv")?;
    Ok(())
}

/// Two-sheet workbook: a summary of both contexts and one row per metric.
pub fn export_comparison_xlsx(path: &Path, comparison: &TransferComparison) -> Result<()> {
    let summary_rows = summary_rows(comparison);
    let metric_rows = metric_rows(comparison);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Metrics")?;
        write_rows(sheet, &metric_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn summary_rows(cmp: &TransferComparison) -> Vec<Vec<String>> {
    vec![
        vec!["Field".into(), "Current".into(), "Potential".into()],
        vec!["Player".into(), cmp.player.clone(), cmp.player.clone()],
        vec![
            "Position".into(),
            cmp.position_group.label().into(),
            cmp.position_group.label().into(),
        ],
        vec![
            "Team".into(),
            cmp.current.team.clone(),
            cmp.potential.team.clone(),
        ],
        vec![
            "League".into(),
            cmp.current.league.clone(),
            cmp.potential.league.clone(),
        ],
        vec![
            "Team rating".into(),
            format!("{:.2}", cmp.current.team_rating),
            format!("{:.2}", cmp.potential.team_rating),
        ],
        vec![
            "League rating".into(),
            format!("{:.2}", cmp.current.league_rating),
            format!("{:.2}", cmp.potential.league_rating),
        ],
        vec![
            "Generated".into(),
            Local::now().format("%Y-%m-%d %H:%M").to_string(),
            String::new(),
        ],
    ]
}

fn metric_rows(cmp: &TransferComparison) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Metric".to_string(),
        "Current".to_string(),
        "Predicted".to_string(),
        "Change".to_string(),
        "Change %".to_string(),
    ]];
    for m in cmp.metric_rows() {
        rows.push(vec![
            m.metric,
            format!("{:.2}", m.current),
            format!("{:.2}", m.predicted),
            format!("{:+.2}", m.change),
            format!("{:+.1}", m.change_pct),
        ]);
    }
    rows
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
