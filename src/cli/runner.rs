use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use headshot::api::process_to_path;
use headshot::detect::CascadeSource;
use headshot::io::writers::write_report;
use headshot::{ProcessingParams, TargetSize};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging(verbose: bool) {
    let directives = if verbose { "warn,headshot=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(false)
        .try_init();
}

fn target_size(args: &CliArgs) -> Result<TargetSize, AppError> {
    if args.width == Some(0) {
        return Err(AppError::ZeroSize { arg: "--width" });
    }
    if args.height == Some(0) {
        return Err(AppError::ZeroSize { arg: "--height" });
    }
    Ok(TargetSize::new(args.width, args.height))
}

fn load_params(args: &CliArgs) -> Result<ProcessingParams, AppError> {
    match &args.params {
        Some(path) => ProcessingParams::from_json_file(path).map_err(|source| AppError::Params {
            path: path.clone(),
            source,
        }),
        None => Ok(ProcessingParams::default()),
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let target = target_size(&args)?;
    let params = load_params(&args)?;
    let cascade = CascadeSource::from_option(args.cascade.clone());

    info!("Processing: {:?} -> {:?}", args.input, args.output);
    let report = process_to_path(&args.input, &args.output, target, &params, &cascade)
        .map_err(AppError::from)?;

    if let Some(report_path) = &args.report {
        if let Err(e) = write_report(&report, report_path) {
            warn!("Portrait saved but report could not be written: {}", e);
            return Err(AppError::from(e).into());
        }
    }

    info!(
        "Successfully processed: {:?} -> {:?} ({}x{})",
        args.input, args.output, report.output_size.width, report.output_size.height
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["headshot", "--input", "in.jpg", "--output", "out.png"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn sizes_are_optional() {
        let size = target_size(&parse(&[])).unwrap();
        assert!(size.is_original());
        let size = target_size(&parse(&["--width", "300"])).unwrap();
        assert_eq!(size, TargetSize::new(Some(300), None));
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = target_size(&parse(&["--width", "0"])).unwrap_err();
        assert!(matches!(err, AppError::ZeroSize { arg: "--width" }));
    }

    #[test]
    fn negative_height_does_not_parse() {
        let argv = ["headshot", "-i", "a.jpg", "-o", "b.png", "--height", "-5"];
        assert!(CliArgs::try_parse_from(argv).is_err());
    }

    #[test]
    fn params_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "detection": { "min_neighbors": 3 } }"#).unwrap();
        let args = parse(&["--params", path.to_str().unwrap()]);
        let params = load_params(&args).unwrap();
        assert_eq!(params.detection.min_neighbors, 3);
        assert_eq!(params.detection.min_size, 80);
    }

    #[test]
    fn broken_params_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, "{ not json").unwrap();
        let args = parse(&["--params", path.to_str().unwrap()]);
        assert!(matches!(load_params(&args), Err(AppError::Params { .. })));
    }
}
