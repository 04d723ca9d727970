//! Command-line interface for style_grader
//!
//! Runs one source/reference pair through the same service path an upload
//! handler would use, and prints where the result went.

use std::{
    env,
    path::{Path, PathBuf},
    process,
};

use style_grader::{ProcessResponse, ServiceConfig, StyleGradeService, Upload};

struct Options {
    source: PathBuf,
    reference: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    alpha: Option<f32>,
    blend: Option<f32>,
    brightness: Option<i32>,
    contrast: Option<i32>,
    saturation: Option<i32>,
    temperature: Option<i32>,
    json: bool,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    let mut config = match &options.config {
        Some(path) => ServiceConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => ServiceConfig::default(),
    };
    if let Some(dir) = &options.output {
        config.result_dir = dir.clone();
        config.result_url_prefix = dir.display().to_string();
    }
    if let Some(alpha) = options.alpha {
        config.transfer.alpha = alpha;
    }
    if let Some(blend) = options.blend {
        config.transfer.final_blend_weight = blend;
    }
    let sliders = [
        (options.brightness, &mut config.adjustments.brightness),
        (options.contrast, &mut config.adjustments.contrast),
        (options.saturation, &mut config.adjustments.saturation),
        (options.temperature, &mut config.adjustments.temperature),
    ];
    for (value, slot) in sliders {
        if let Some(value) = value {
            *slot = value;
        }
    }

    let service = StyleGradeService::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let source = read_upload(&options.source);
    let reference = read_upload(&options.reference);
    let response = service.process(Some(&source), Some(&reference));

    if options.json {
        println!("{}", response.to_json());
    } else {
        match &response {
            ProcessResponse::Success { result_url } => println!("{}", result_url),
            ProcessResponse::Failure { error, status } => {
                eprintln!("Transfer failed ({}): {}", status, error)
            }
        }
    }

    if !response.is_success() {
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Options {
    let program = args.first().map(String::as_str).unwrap_or("stylegrade");
    let mut positional = Vec::new();
    let mut config = None;
    let mut output = None;
    let mut alpha = None;
    let mut blend = None;
    let mut brightness = None;
    let mut contrast = None;
    let mut saturation = None;
    let mut temperature = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help(program);
                process::exit(0);
            }
            "--json" => json = true,
            "--config" => config = Some(PathBuf::from(value_of(args, &mut i))),
            "--output" => output = Some(PathBuf::from(value_of(args, &mut i))),
            "--alpha" => alpha = Some(parse_weight("--alpha", &value_of(args, &mut i))),
            "--blend" => blend = Some(parse_weight("--blend", &value_of(args, &mut i))),
            "--brightness" => brightness = Some(parse_slider(&value_of(args, &mut i))),
            "--contrast" => contrast = Some(parse_slider(&value_of(args, &mut i))),
            "--saturation" => saturation = Some(parse_slider(&value_of(args, &mut i))),
            "--temperature" => temperature = Some(parse_slider(&value_of(args, &mut i))),
            arg if !arg.starts_with("--") => positional.push(PathBuf::from(arg)),
            other => {
                eprintln!("Unknown option: {}", other);
                eprintln!("Use --help for usage information");
                process::exit(1);
            }
        }
        i += 1;
    }

    if positional.len() != 2 {
        print_help(program);
        process::exit(1);
    }
    let reference = positional.pop().unwrap_or_default();
    let source = positional.pop().unwrap_or_default();

    Options {
        source,
        reference,
        config,
        output,
        alpha,
        blend,
        brightness,
        contrast,
        saturation,
        temperature,
        json,
    }
}

fn value_of(args: &[String], i: &mut usize) -> String {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} expects a value", args[*i - 1]);
            process::exit(1);
        }
    }
}

fn parse_weight(flag: &str, value: &str) -> f32 {
    match value.parse::<f32>() {
        Ok(v) if (0.0..=1.0).contains(&v) => v,
        _ => {
            eprintln!("Error: {} expects a number between 0 and 1, got '{}'", flag, value);
            process::exit(1);
        }
    }
}

fn parse_slider(value: &str) -> i32 {
    match value.parse::<i32>() {
        Ok(v) if (-100..=100).contains(&v) => v,
        _ => {
            eprintln!("Error: adjustments take a whole number from -100 to 100, got '{}'", value);
            process::exit(1);
        }
    }
}

fn read_upload(path: &Path) -> Upload {
    let data = std::fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error: cannot read '{}': {}", path.display(), e);
        process::exit(1);
    });
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Upload::new(filename, data)
}

fn print_help(program: &str) {
    eprintln!("Usage: {} [OPTIONS] <source> <reference>", program);
    eprintln!();
    eprintln!("Restyle the colors of <source> after <reference>.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config FILE    Load service configuration from JSON");
    eprintln!("  --output DIR     Directory for result images (default: static/results)");
    eprintln!("  --alpha X        Chroma transfer strength, 0-1 (default: 0.8)");
    eprintln!("  --blend X        Weight of the graded image vs. the source, 0-1 (default: 0.8)");
    eprintln!("  --brightness N   Brighten or darken the result, -100 to 100 (default: 0)");
    eprintln!("  --contrast N     Raise or lower result contrast, -100 to 100 (default: 0)");
    eprintln!("  --saturation N   Raise or lower result saturation, -100 to 100 (default: 0)");
    eprintln!("  --temperature N  Tint the result warm or cool, -100 to 100 (default: 0)");
    eprintln!("  --json           Print the JSON response instead of the result path");
    eprintln!("  --help, -h       Show this help message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to trace the pipeline stages.");
}
