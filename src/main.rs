extern crate log;
extern crate pretty_env_logger;

use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{arg, command, value_parser, Command};
use log::warn;
use serde::Serialize;

use crate::alphabet::Language;
use crate::interpret::{interpret_answer_sheet, ErrorKind, InterpretOptions};
use crate::score::AnswerKey;
use crate::sheet::{load_sheet_geometry, SheetGeometry};
use crate::types::DetectionResult;

mod alphabet;
mod bubbles;
mod debug;
mod fill;
mod geometry;
mod grid;
mod image_utils;
mod interpret;
mod score;
mod sheet;
#[cfg(test)]
mod testing;
mod types;

#[derive(Serialize)]
struct SuccessResponse<'a> {
    #[serde(flatten)]
    result: &'a DetectionResult,
    message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureResponse {
    error_kind: ErrorKind,
    message: String,
}

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    let matches = cli().get_matches();
    let answer_key = matches
        .get_one::<String>("key")
        .expect("answer key is required");
    let language = matches
        .get_one::<String>("language")
        .map_or(Language::English, |s| Language::from(s.as_str()));
    let debug_dir = matches.get_one::<String>("debug-dir").map(PathBuf::from);

    let mut geometry = match matches.get_one::<String>("config") {
        Some(path) => match load_sheet_geometry(Path::new(path)) {
            Ok(geometry) => geometry,
            Err(e) => {
                eprintln!("Error loading sheet geometry: {}", e);
                exit(1);
            }
        },
        None => SheetGeometry::default(),
    };
    if let Some(options) = matches.get_one::<usize>("options") {
        geometry.options_per_question = *options;
    }

    let key = AnswerKey::new(answer_key);
    if key.is_empty() {
        warn!("answer key is empty; every question will be ungraded");
    }
    for (question, symbol) in key.invalid_symbols(language, geometry.options_per_question) {
        warn!(
            "answer key symbol {:?} for question {} is not a {} option",
            symbol, question, language
        );
    }

    let image_bytes = match matches.get_one::<String>("image_path") {
        Some(path) => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                eprintln!("Error reading image {}: {}", path, e);
                exit(1);
            }
        },
        None => None,
    };

    let options = InterpretOptions {
        geometry,
        language,
        debug_dir,
    };

    match interpret_answer_sheet(image_bytes.as_deref(), answer_key, &options) {
        Ok(result) => print_json(&SuccessResponse {
            result: &result,
            message: "OMR detection completed.",
        }),
        Err(e) => {
            print_json(&FailureResponse {
                error_kind: e.kind(),
                message: e.to_string(),
            });
            exit(1);
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            exit(1);
        }
    }
}

#[allow(clippy::cognitive_complexity)]
fn cli() -> Command {
    command!()
        .arg(arg!(-k --key <ANSWERS> "Correct answers, one symbol per question").required(true))
        .arg(
            arg!(-l --language <LANGUAGE> "Answer alphabet: `eng` for Latin letters, anything else for ক-ঘ")
                .default_value("eng"),
        )
        .arg(arg!(-o --options <COUNT> "Bubbles per question").value_parser(value_parser!(usize)))
        .arg(arg!(-c --config <PATH> "Path to a sheet geometry JSON file"))
        .arg(arg!(--"debug-dir" <DIR> "Directory to write debug images to"))
        .arg(arg!(image_path: [IMAGE] "Path to the answer sheet image"))
}
