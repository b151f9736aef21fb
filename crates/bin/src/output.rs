//! Output formatting helpers for human-readable and JSON output.

use intentions::store::Intention;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    // Column widths are measured in chars so emoji markers line up
    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_line.join("  "));

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .take(col_count)
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

/// Short flag summary for an intention, e.g. `frog,sticky`.
pub fn intention_flags(intention: &Intention) -> String {
    let mut flags = Vec::new();
    if intention.froggy {
        flags.push("frog");
    }
    if intention.sticky {
        flags.push("sticky");
    }
    if intention.anxiety_inducing {
        flags.push("anxiety");
    }
    flags.join(",")
}

/// Print intentions as a table or as JSON.
pub fn print_intentions(
    intentions: &[Intention],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(intentions)?);
        }
        OutputFormat::Human if intentions.is_empty() => {
            println!("No intentions for today.");
        }
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = intentions
                .iter()
                .map(|i| {
                    vec![
                        i.id.to_string(),
                        i.status().as_str().to_string(),
                        intention_flags(i),
                        i.title.clone(),
                    ]
                })
                .collect();
            print_table(&["ID", "STATUS", "FLAGS", "TITLE"], &rows);
        }
    }
    Ok(())
}
