//! Resolve command handler

use super::{emit, load_paths};
use crate::commands::ResolveArgs;
use crate::error::{CliError, CliResult};

/// Execute the resolve command
pub fn execute_resolve(args: &ResolveArgs) -> CliResult<()> {
    let paths = load_paths(&args.paths)?;
    let yaml = paths.to_yaml(args.full).map_err(CliError::flow)?;
    emit(&yaml, args.output.as_deref())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::{fixtures, load_paths};

    #[test]
    fn test_resolved_file_stands_alone() {
        let (dir, _, paths) = fixtures::workspace();
        let output = dir.path().join("resolved.yaml");
        execute_resolve(&ResolveArgs {
            paths,
            full: false,
            output: Some(output.clone()),
        })
        .unwrap();

        let yaml = std::fs::read_to_string(&output).unwrap();
        assert!(!yaml.contains("reference"));
        assert!(!yaml.contains("add_steps"));

        let resolved = load_paths(&output).unwrap();
        let steps = resolved.build_test_case("derived", "remove_after_two").unwrap();
        let ids: Vec<&str> = steps.iter().map(|s| s.id_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_full_export_keeps_directives() {
        let (dir, _, paths) = fixtures::workspace();
        let output = dir.path().join("full.yaml");
        execute_resolve(&ResolveArgs {
            paths,
            full: true,
            output: Some(output.clone()),
        })
        .unwrap();
        let yaml = std::fs::read_to_string(output).unwrap();
        assert!(yaml.contains("reference"));
        assert!(yaml.contains("paths.yaml:smoke:flip_twice"));
    }
}
