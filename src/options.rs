use clap::{ArgAction, Parser};
use trmnl_convert::RenderOptions;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = match option_env!("TRMNL_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};
pub const BUILD_DATE: &str = match option_env!("TRMNL_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// Show TRMNL screens on a Waveshare 7.5" e-paper panel.
#[derive(Debug, Parser)]
#[command(name = "trmnl-display")]
pub struct Args {
    /// Enable dark mode (invert monochrome images)
    #[arg(short = 'd', long = "dark")]
    pub dark_mode: bool,

    /// Show version information
    #[arg(short = 'v', long = "version")]
    pub show_version: bool,

    /// Enable verbose output
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub verbose: bool,

    /// Quiet mode (disable verbose output)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AppOptions {
    pub render: RenderOptions,
    pub verbose: bool,
}

impl Args {
    pub fn options(&self) -> AppOptions {
        AppOptions {
            render: RenderOptions::new(self.dark_mode),
            verbose: self.verbose && !self.quiet,
        }
    }
}

pub fn version_line() -> String {
    format!("trmnl-display version {VERSION} (commit: {COMMIT}, built: {BUILD_DATE})")
}

pub fn user_agent() -> String {
    format!("trmnl-display/{VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("trmnl-display").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn verbose_by_default() {
        let options = parse(&[]).options();
        assert!(options.verbose);
        assert!(!options.render.invert_threshold);
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert!(!parse(&["-q"]).options().verbose);
        assert!(!parse(&["--verbose", "-q"]).options().verbose);
    }

    #[test]
    fn verbose_can_be_switched_off() {
        assert!(!parse(&["--verbose=false"]).options().verbose);
        assert!(parse(&["--verbose"]).options().verbose);
    }

    #[test]
    fn dark_mode_inverts_threshold() {
        assert!(parse(&["-d"]).options().render.invert_threshold);
        assert!(parse(&["--dark"]).options().render.invert_threshold);
    }

    #[test]
    fn version_flag() {
        assert!(parse(&["-v"]).show_version);
        assert!(version_line().starts_with(&format!("trmnl-display version {VERSION} (commit: ")));
    }

    #[test]
    fn user_agent_carries_version() {
        assert_eq!(user_agent(), format!("trmnl-display/{VERSION}"));
    }
}
