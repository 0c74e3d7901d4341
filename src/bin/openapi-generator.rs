//! Print the OpenAPI document, or write it to the path given as first argument.

use std::{env, fs};

use trivia_night_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi().to_pretty_json()?;
    match env::args().nth(1) {
        Some(path) => fs::write(&path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
