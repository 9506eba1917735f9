mod args;
mod definition;
mod error;

use std::fs::{self, File};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use datum::{Form, Notification, Value, subscriber};
use simplelog::{Config, LevelFilter, WriteLogger};

use crate::args::Args;
use crate::definition::Definition;
use crate::error::CliError;

/// Debug logs go to `log_file` when given, otherwise warnings go to stderr.
/// Stdout carries only the form value.
fn init_logging(log_file: Option<&Path>) -> Result<(), CliError> {
    let result = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            WriteLogger::init(LevelFilter::Debug, Config::default(), file)
        }
        None => WriteLogger::init(LevelFilter::Warn, Config::default(), std::io::stderr()),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logger: {}", e);
    }
    Ok(())
}

fn load_form(path: &Path) -> Result<Form, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definition: Definition = serde_json::from_str(&text)?;
    let form = Form::new(definition.form_options());

    for field in &definition.fields {
        let name = field.name.clone();
        let on_notify = subscriber(move |notification| match notification {
            Notification::Update { value, .. } => log::info!("{} = {:?}", name, value),
            Notification::Error { error: Some(error) } => log::info!("{} error: {:?}", name, error),
            _ => {}
        });
        form.bind_with_rules(&field.name, on_notify, field.default.clone());
    }
    Ok(form)
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::Value::from(other.clone()).to_string(),
    }
}

/// Runs the driver, returning whether the form ended up valid.
async fn run(args: Args) -> Result<bool, CliError> {
    let form = load_form(&args.definition)?;

    for (path, value) in args.assignments {
        form.set(&path, value);
    }
    if args.reset {
        form.reset();
    }

    let mut valid = true;
    if args.validate {
        match form.validate(true).await {
            Ok(()) => {}
            Err(e) if e.is_invalid() => {
                valid = false;
                for name in form.bound_names() {
                    if let Some(error) = form.get_error(&name) {
                        eprintln!("{}: {}", name, describe(&error));
                    }
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    let json: serde_json::Value = form.get_value().into();
    let output = serde_json::to_string_pretty(&json).map_err(CliError::Output)?;
    println!("{}", output);
    Ok(valid)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::from(2);
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
