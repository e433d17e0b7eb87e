//! List command handler

use super::load_paths;
use crate::commands::ListArgs;
use crate::error::CliResult;

/// Listing of the suites and cases in the path file.
pub fn list_cases(args: &ListArgs) -> CliResult<String> {
    let paths = load_paths(&args.paths)?;
    Ok(paths.list_test_info(args.suite.as_deref()))
}

/// Execute the list command
pub fn execute_list(args: &ListArgs) -> CliResult<()> {
    print!("{}", list_cases(args)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::fixtures;

    #[test]
    fn test_list_all_suites() {
        let (_dir, _, paths) = fixtures::workspace();
        let listing = list_cases(&ListArgs { paths, suite: None }).unwrap();
        let derived = listing.find("derived:").unwrap();
        let smoke = listing.find("smoke:").unwrap();
        assert!(derived < smoke);
        assert!(listing.contains("\tflip_and_remove\n\tflip_twice"));
    }

    #[test]
    fn test_list_unknown_suite() {
        let (_dir, _, paths) = fixtures::workspace();
        let listing = list_cases(&ListArgs {
            paths,
            suite: Some("nightly".to_string()),
        })
        .unwrap();
        assert!(listing.contains("Test suite 'nightly' not found."));
        assert!(listing.contains("Known test suites: smoke, derived"));
    }
}
