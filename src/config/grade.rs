use crate::grading::GradingOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GradeOutputConfig {
    /// Where to write the project report; printed to stdout when absent.
    pub json_out: Option<PathBuf>,
    /// Print a per-tracker text summary.
    pub summary: bool,
}

#[derive(Debug, Deserialize)]
pub struct GradeToolConfig {
    /// Project JSON (`ProjectInput`), relative to the config file.
    pub input: PathBuf,
    #[serde(default)]
    pub options: GradingOptions,
    #[serde(default)]
    pub output: GradeOutputConfig,
}

impl GradeToolConfig {
    /// Resolve relative paths against the directory holding the config.
    fn anchored_at(mut self, base: &Path) -> Self {
        if self.input.is_relative() {
            self.input = base.join(&self.input);
        }
        if let Some(out) = self.output.json_out.as_mut() {
            if out.is_relative() {
                *out = base.join(&*out);
            }
        }
        self
    }
}

fn parse_config(data: &str, origin: &Path) -> Result<GradeToolConfig, String> {
    let config: GradeToolConfig = serde_json::from_str(data)
        .map_err(|e| format!("Failed to parse config {}: {e}", origin.display()))?;
    let base = origin.parent().unwrap_or_else(|| Path::new(""));
    Ok(config.anchored_at(base))
}

pub fn load_config(path: &Path) -> Result<GradeToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data, path)
}

/// Config path from the command line: `<program> <config.json>`.
pub fn parse_cli(program: &str) -> Result<GradeToolConfig, String> {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(path), None) => load_config(Path::new(&path)),
        _ => Err(format!("Usage: {program} <config.json>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::CentreSplit;

    #[test]
    fn relative_paths_follow_config_location() {
        let json = r#"{
            "input": "site.json",
            "options": { "deflection": { "centre_split": "none" } },
            "output": { "json_out": "out/report.json" }
        }"#;
        let config = parse_config(json, Path::new("configs/grade.json")).unwrap();
        assert_eq!(config.input, PathBuf::from("configs/site.json"));
        assert_eq!(
            config.output.json_out,
            Some(PathBuf::from("configs/out/report.json"))
        );
        assert!(!config.output.summary);
        assert_eq!(config.options.deflection.centre_split, CentreSplit::None);
        assert_eq!(config.options.line_search.coarse_steps, 121);
    }

    #[test]
    fn missing_input_is_reported() {
        let err = parse_config("{}", Path::new("grade.json")).unwrap_err();
        assert!(err.contains("grade.json"), "unexpected message: {err}");
    }
}
