use crate::errors::{PassthruError, Result};
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: jack-passthru [OPTIONS]

Options:
  --config <path>   Settings file (JSON)
  --name <name>     JACK client name
  --gain <gain>     Linear gain from inputs to outputs
  -h, --help        Print this help";

#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub name: Option<String>,
    pub gain: Option<f32>,
    pub help: bool,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value(&mut args, &arg)?)),
                "--name" => parsed.name = Some(value(&mut args, &arg)?),
                "--gain" => {
                    let raw = value(&mut args, &arg)?;
                    let gain = raw.parse().map_err(|_| {
                        PassthruError::InvalidArgument(format!("--gain expects a number, got '{}'", raw))
                    })?;
                    parsed.gain = Some(gain);
                }
                "-h" | "--help" => parsed.help = true,
                other => {
                    return Err(PassthruError::InvalidArgument(format!(
                        "unknown argument '{}'",
                        other
                    )))
                }
            }
        }

        Ok(parsed)
    }
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| PassthruError::InvalidArgument(format!("{} expects a value", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_all_options() {
        let args = parse(&["--config", "/tmp/p.json", "--name", "fx", "--gain", "0.5"]).unwrap();
        assert_eq!(
            args,
            Args {
                config: Some(PathBuf::from("/tmp/p.json")),
                name: Some("fx".to_string()),
                gain: Some(0.5),
                help: false,
            }
        );
    }

    #[test]
    fn test_missing_value() {
        assert!(matches!(parse(&["--name"]), Err(PassthruError::InvalidArgument(_))));
    }

    #[test]
    fn test_bad_gain() {
        assert!(matches!(
            parse(&["--gain", "loud"]),
            Err(PassthruError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_argument() {
        assert!(matches!(parse(&["--verbose"]), Err(PassthruError::InvalidArgument(_))));
    }
}
