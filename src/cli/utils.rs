use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::client::Book;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output the catalog as a table (text) or an array (json)
pub fn output_books(output_format: &OutputFormat, books: &[Book]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "books": books }))?);
        }
        OutputFormat::Text => {
            if books.is_empty() {
                println!("No books yet. Add one with `bookshelf books create`.");
            } else {
                print!("{}", render_table(books));
            }
        }
    }
    Ok(())
}

pub fn output_book(output_format: &OutputFormat, book: &Book) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "book": book }))?);
        }
        OutputFormat::Text => {
            println!("ID: {}", book.id);
            println!("Name: {}", book.name);
            println!("Description: {}", book.description);
        }
    }
    Ok(())
}

/// Column-aligned ID / NAME / DESCRIPTION table
pub fn render_table(books: &[Book]) -> String {
    let rows: Vec<[String; 3]> = books
        .iter()
        .map(|b| [b.id.to_string(), b.name.clone(), b.description.clone()])
        .collect();

    let header = ["ID", "NAME", "DESCRIPTION"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 3]| {
        format!(
            "{:<w0$}  {:<w1$}  {}\n",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1]
        )
    };

    let mut out = format_row(header);
    for row in &rows {
        out.push_str(&format_row([&row[0], &row[1], &row[2]]));
    }
    out
}
