//! Shared fixtures for the ingest integration tests
//!
//! Files are written into a [`tempfile::TempDir`] under the exact name the
//! test asks for, since the writer reports and stores the file name.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use rust_xlsxwriter::Workbook;
use std::path::PathBuf;
use tempfile::TempDir;

/// A fixture file and the directory that keeps it alive
pub struct Fixture {
    _dir: TempDir,
    pub path: PathBuf,
}

/// Write `contents` to a file called `name`
pub fn text_file(name: &str, contents: &str) -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture");
    Fixture { _dir: dir, path }
}

/// Write raw `contents`, which need not be valid UTF-8
pub fn byte_file(name: &str, contents: &[u8]) -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture");
    Fixture { _dir: dir, path }
}

/// CSV with a `first,last,email,phone` header and `rows` generated leads
pub fn generated_csv(name: &str, rows: usize) -> Fixture {
    let mut contents = String::from("first,last,email,phone\n");
    for i in 0..rows {
        contents.push_str(&format!(
            "First{i},Last{i},User{i}@Example.com,(555) {:03}-{:04}\n",
            i / 10_000,
            i % 10_000
        ));
    }
    text_file(name, &contents)
}

/// Cell written into a workbook fixture
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// Workbook whose first sheet holds `header` then `rows`
pub fn workbook(name: &str, header: &[&str], rows: &[Vec<Cell<'_>>]) -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(name);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(r, col as u16, *text).unwrap();
                }
                Cell::Number(number) => {
                    sheet.write_number(r, col as u16, *number).unwrap();
                }
                Cell::Blank => {}
            }
        }
    }
    workbook.save(&path).expect("Failed to save workbook");

    Fixture { _dir: dir, path }
}

/// Workbook with `rows` generated leads
pub fn generated_workbook(name: &str, rows: usize) -> Fixture {
    let emails: Vec<String> = (0..rows).map(|i| format!("lead{i}@example.com")).collect();
    let data: Vec<Vec<Cell<'_>>> = emails
        .iter()
        .enumerate()
        .map(|(i, email)| {
            vec![
                Cell::Text("Ada"),
                Cell::Text(email),
                Cell::Number(5_550_000_000.0 + i as f64),
            ]
        })
        .collect();
    workbook(name, &["First Name", "Email", "Mobile"], &data)
}
