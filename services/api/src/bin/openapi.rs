//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the LPMS API. The output path is the first
//! argument and defaults to `openapi.json`.

use lpms_api::web::rest::ApiDoc;
use std::path::{Path, PathBuf};
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_document(
    api_doc: &utoipa::openapi::OpenApi,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, api_doc.to_pretty_json()?)?;
    let operations: usize = api_doc
        .paths
        .paths
        .values()
        .map(|item| {
            [&item.get, &item.post, &item.put, &item.delete]
                .iter()
                .filter(|op| op.is_some())
                .count()
        })
        .sum();
    println!(
        "LPMS OpenAPI document with {} operations written to {}",
        operations,
        path.display()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    write_document(&ApiDoc::openapi(), &path)
}
