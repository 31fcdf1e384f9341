//! Argument definitions for the `duolog` binary.

use clap::{Arg, ArgAction, Command};

/// Build the top-level command.
pub fn build_cli() -> Command {
    Command::new("duolog")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Read commands from stdin into a shared log watched by a second thread")
        .long_about(
            "Two worker threads race for the producer role. The producer reads lines \
             from stdin and prepends them to a shared log; the observer reports every \
             new head entry. An empty line ends the run.",
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("poll-interval-ms")
                .long("poll-interval-ms")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Observer interval in milliseconds (default 2000)"),
        )
        .arg(
            Arg::new("watch")
                .long("watch")
                .value_name("MODE")
                .value_parser(["notify", "poll"])
                .help("How the observer waits for new entries"),
        )
        .arg(
            Arg::new("max-line-len")
                .long("max-line-len")
                .value_name("CHARS")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum characters kept per input line (default 18)"),
        )
        .arg(
            Arg::new("reject-oversize")
                .long("reject-oversize")
                .action(ArgAction::SetTrue)
                .help("Fail on lines longer than the limit instead of truncating"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("FORMAT")
                .value_parser(["plain", "json", "tracing"])
                .default_value("plain")
                .help("Log record output format"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Increase diagnostic verbosity on stderr (-v, -vv, -vvv)"),
        )
}
