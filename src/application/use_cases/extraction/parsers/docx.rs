use tracing::warn;

use crate::application::use_cases::extraction::DocumentExtraction;
use crate::domain::metrics::ProcessingMetrics;

impl DocumentExtraction {
    pub(in crate::application::use_cases::extraction) fn extract_docx(
        &self,
        bytes: &[u8],
        metrics: &mut ProcessingMetrics,
    ) -> String {
        let docx = match docx_rs::read_docx(bytes) {
            Ok(docx) => docx,
            Err(err) => {
                warn!(%err, "DOCX parse failed");
                metrics.record_error(format!("DOCX parse failed: {}", err));
                return String::new();
            }
        };

        let mut lines = Vec::new();
        for child in &docx.document.children {
            walk_document_child(child, &mut lines);
        }
        lines.join("\n").trim().to_string()
    }
}

fn walk_document_child(child: &docx_rs::DocumentChild, lines: &mut Vec<String>) {
    match child {
        docx_rs::DocumentChild::Paragraph(paragraph) => {
            let text = paragraph_text(paragraph);
            if !text.trim().is_empty() {
                lines.push(text);
            }
        }
        docx_rs::DocumentChild::Table(table) => {
            walk_table(table, lines);
        }
        _ => {}
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut buffer = String::new();
    for child in &paragraph.children {
        walk_paragraph_child(child, &mut buffer);
    }
    buffer
}

fn walk_paragraph_child(child: &docx_rs::ParagraphChild, buffer: &mut String) {
    match child {
        docx_rs::ParagraphChild::Run(run) => {
            run_text(run, buffer);
        }
        docx_rs::ParagraphChild::Hyperlink(link) => {
            for link_child in &link.children {
                walk_paragraph_child(link_child, buffer);
            }
        }
        docx_rs::ParagraphChild::Insert(insert) => {
            for insert_child in &insert.children {
                if let docx_rs::InsertChild::Run(run) = insert_child {
                    run_text(run, buffer);
                }
            }
        }
        _ => {}
    }
}

fn run_text(run: &docx_rs::Run, buffer: &mut String) {
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text) => buffer.push_str(&text.text),
            docx_rs::RunChild::InstrTextString(text) => buffer.push_str(text),
            docx_rs::RunChild::Tab(_) | docx_rs::RunChild::PTab(_) => buffer.push('\t'),
            docx_rs::RunChild::Break(_) => buffer.push('\n'),
            docx_rs::RunChild::Sym(sym) => buffer.push_str(&sym.char),
            _ => {}
        }
    }
}

fn walk_table(table: &docx_rs::Table, lines: &mut Vec<String>) {
    for row in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row;
        let row_text = table_row_text(row);
        if !row_text.trim().is_empty() {
            lines.push(row_text);
        }
    }
}

fn table_row_text(row: &docx_rs::TableRow) -> String {
    let mut cells = Vec::new();
    for cell in &row.cells {
        let docx_rs::TableRowChild::TableCell(cell) = cell;
        let text = table_cell_text(cell);
        if !text.trim().is_empty() {
            cells.push(text);
        }
    }
    cells.join(" | ")
}

fn table_cell_text(cell: &docx_rs::TableCell) -> String {
    let mut parts = Vec::new();
    for content in &cell.children {
        match content {
            docx_rs::TableCellContent::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
            docx_rs::TableCellContent::Table(table) => {
                let mut nested = Vec::new();
                walk_table(table, &mut nested);
                if !nested.is_empty() {
                    parts.push(nested.join(" "));
                }
            }
            _ => {}
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_runs_are_concatenated() {
        let paragraph = docx_rs::Paragraph::new()
            .add_run(docx_rs::Run::new().add_text("Hello "))
            .add_run(docx_rs::Run::new().add_text("world"));
        assert_eq!(paragraph_text(&paragraph), "Hello world");
    }

    #[test]
    fn table_rows_join_cells_with_pipes() {
        let cell = |text: &str| {
            docx_rs::TableCell::new()
                .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(text)))
        };
        let table = docx_rs::Table::new(vec![docx_rs::TableRow::new(vec![
            cell("name"),
            cell("qty"),
        ])]);

        let mut lines = Vec::new();
        walk_table(&table, &mut lines);
        assert_eq!(lines, vec!["name | qty".to_string()]);
    }
}
