//! Import preview and result formatting

use crate::services::{ImportPreview, ImportResult};

use super::report::double_separator;

fn push_messages(output: &mut String, title: &str, messages: &[String], limit: usize) {
    if messages.is_empty() {
        return;
    }
    output.push_str(&format!("\n{} ({}):\n", title, messages.len()));
    for message in messages.iter().take(limit) {
        output.push_str(&format!("  - {}\n", message));
    }
    if messages.len() > limit {
        output.push_str(&format!("  ... and {} more\n", messages.len() - limit));
    }
}

/// Format an import preview; `limit` caps the listed errors and warnings
pub fn format_import_preview(database_name: &str, preview: &ImportPreview, limit: usize) -> String {
    let mut output = String::new();
    output.push_str(&format!("Import Preview for '{}'\n", database_name));
    output.push_str(&double_separator(40));
    output.push('\n');
    output.push_str(&format!("  Existing rows:        {}\n", preview.existing_row_count));
    output.push_str(&format!("  New rows:             {}\n", preview.new_row_count));
    output.push_str(&format!("  Already stored:       {}\n", preview.exact_duplicate_count));
    output.push_str(&format!("  Repeated in batch:    {}\n", preview.in_batch_duplicate_count));
    output.push_str(&format!("  Total after import:   {}\n", preview.total_after_import));
    output.push_str(&format!(
        "  Status:               {}\n",
        if preview.valid { "valid" } else { "blocked" }
    ));

    push_messages(&mut output, "Errors", &preview.errors, limit);
    push_messages(&mut output, "Warnings", &preview.warnings, limit);

    output
}

/// Format the outcome of an import
pub fn format_import_result(result: &ImportResult, limit: usize) -> String {
    let mut output = String::new();
    if result.success {
        output.push_str("Import Complete!\n");
    } else {
        output.push_str("Import rejected; no rows were written.\n");
    }
    output.push_str(&format!("  Added:        {}\n", result.added));
    output.push_str(&format!("  Skipped:      {}\n", result.exact_duplicates));
    output.push_str(&format!("  In-batch:     {}\n", result.in_batch_duplicates));
    output.push_str(&format!("  Rows stored:  {}\n", result.row_count));

    push_messages(&mut output, "Errors", &result.errors, limit);
    push_messages(&mut output, "Warnings", &result.warnings, limit);

    output
}
