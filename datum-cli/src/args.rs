//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;
use datum::{FieldPath, Value};

use crate::error::CliError;

/// Load a form definition, apply assignments and print the form value.
#[derive(Debug, Parser)]
#[command(name = "datum-cli")]
#[command(about = "Drive a datum form from a JSON definition", long_about = None)]
#[command(version)]
pub struct Args {
    /// Path to the form definition
    #[arg(value_name = "DEFINITION")]
    pub definition: PathBuf,

    /// Assign a field, applied in order. VALUE is read as JSON, falling back to a string
    #[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, Value)>,

    /// Reset the form to its defaults after the assignments
    #[arg(long)]
    pub reset: bool,

    /// Validate every bound field before printing
    #[arg(long)]
    pub validate: bool,

    /// Write debug logs to this file instead of warnings to stderr
    #[arg(long = "log", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Parses `PATH=VALUE`. The value is read as JSON, falling back to a plain string.
fn parse_assignment(assignment: &str) -> Result<(String, Value), CliError> {
    let (path, raw) = assignment
        .split_once('=')
        .ok_or_else(|| CliError::BadAssignment(assignment.to_string()))?;
    FieldPath::parse(path)?;

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    };
    Ok((path.to_string(), value))
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn test_parse_full() {
        let parsed = Args::try_parse_from([
            "datum-cli",
            "form.json",
            "--set",
            "a.b=5",
            "--set",
            "name=Ada",
            "--validate",
            "--log",
            "out.log",
        ])
        .unwrap();
        assert_eq!(parsed.definition, PathBuf::from("form.json"));
        assert_eq!(
            parsed.assignments,
            vec![
                ("a.b".to_string(), Value::from(5)),
                ("name".to_string(), Value::from("Ada")),
            ]
        );
        assert!(parsed.validate);
        assert!(!parsed.reset);
        assert_eq!(parsed.log_file, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn test_parse_errors() {
        let err = Args::try_parse_from(["datum-cli"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Args::try_parse_from(["datum-cli", "f.json", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let err = Args::try_parse_from(["datum-cli", "f.json", "--set", "novalue"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("expected PATH=VALUE"));

        let err = Args::try_parse_from(["datum-cli", "f.json", "--set", "a[x]=1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_assignment_value_falls_back_to_string() {
        assert_eq!(
            parse_assignment("tags=[1,2]").unwrap(),
            ("tags".to_string(), Value::from(vec![1, 2]))
        );
        assert_eq!(
            parse_assignment("name=not json").unwrap(),
            ("name".to_string(), Value::from("not json"))
        );
    }
}
