//! Template command handler

use crate::commands::TemplateCommand;
use crate::error::{CliError, CliResult};
use flowprobe::template::{write_template, ModelTemplate, PathTemplate};
use std::path::PathBuf;

/// Write the requested template, returning the file written.
pub fn execute_template(command: &TemplateCommand) -> CliResult<PathBuf> {
    let (yaml, output) = match command {
        TemplateCommand::Model(args) => {
            let template = ModelTemplate::new(args.states).with_multi_trigger(args.multi_trigger);
            (template.to_yaml(), &args.output)
        }
        TemplateCommand::Paths(args) => (PathTemplate::new(args.cases).to_yaml(), &args.output),
    };
    let yaml = yaml.map_err(CliError::flow)?;
    let written = write_template(&yaml, output).map_err(CliError::flow)?;
    println!("Wrote {}", written.display());
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{ModelTemplateArgs, PathTemplateArgs};
    use tempfile::TempDir;

    #[test]
    fn test_model_template_written() {
        let temp = TempDir::new().unwrap();
        let written = execute_template(&TemplateCommand::Model(ModelTemplateArgs {
            states: 0,
            output: temp.path().join("model"),
            multi_trigger: true,
        }))
        .unwrap();
        assert_eq!(written, temp.path().join("model.yaml"));

        let yaml = std::fs::read_to_string(written).unwrap();
        assert!(yaml.contains("STATE_1"));
        assert!(!yaml.contains("STATE_2"));
        assert!(yaml.contains("__MULTI_TRIGGERS__"));
    }

    #[test]
    fn test_path_template_written() {
        let temp = TempDir::new().unwrap();
        let written = execute_template(&TemplateCommand::Paths(PathTemplateArgs {
            cases: 2,
            output: temp.path().join("paths.yaml"),
        }))
        .unwrap();
        assert_eq!(written, temp.path().join("paths.yaml"));
        let yaml = std::fs::read_to_string(written).unwrap();
        assert!(yaml.contains("<test_name_2>"));
    }
}
