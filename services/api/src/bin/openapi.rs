//! services/api/src/bin/openapi.rs
//!
//! This binary generates the OpenAPI 3.0 specification for the REST API
//! and saves it to a file, `openapi.json` unless a path is given.

use api_lib::web::rest::ApiDoc;
use clap::Parser;
use utoipa::OpenApi;

#[derive(Parser, Debug)]
#[command(name = "openapi", about = "Write the OpenAPI document for the scoping API")]
struct Cli {
    /// Where to write the document.
    #[arg(long, default_value = "openapi.json")]
    output: String,
}

/// Generates the OpenAPI specification and writes it to a file.
fn generate_spec(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI specification generated at {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    generate_spec(ApiDoc::openapi(), &cli.output)?;
    Ok(())
}
