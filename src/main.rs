//! safety-net: PreToolUse hook for Claude Code.
//!
//! Reads the hook request from stdin and prints a deny response when the
//! Bash command is destructive. Prints nothing to allow. Always exits 0.

use safety_net::config::Config;
use safety_net::eval::{Policy, RuleRegistry};
use safety_net::{hook, logging};

fn main() {
    if std::env::args().nth(1).as_deref() == Some("--dump-config") {
        match Config::load().to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => eprintln!("safety-net: cannot render config: {e}"),
        }
        return;
    }

    logging::init();
    let policy = Policy::from_env();

    let response = match hook::read_input(std::io::stdin().lock()) {
        Ok(input) => {
            let registry = RuleRegistry::from_config(&Config::load());
            hook::respond(&input, &registry, policy)
        }
        Err(err) => hook::protocol_failure(&err, policy),
    };

    if let Some(subject) = response.log_subject() {
        logging::log_decision(subject, &response.decision);
    }

    if let Some(json) = response.output() {
        println!("{json}");
    }
}
