use crate::commands::CommandRule;
use crate::eval::{CommandContext, DenyReason};
use crate::parse::embedded::exec_spans;

/// Primaries that take exactly one argument; a `-delete` in that slot is data.
const ONE_VALUE_PRIMARIES: &[&str] = &[
    "-name",
    "-iname",
    "-path",
    "-ipath",
    "-wholename",
    "-iwholename",
    "-regex",
    "-iregex",
    "-lname",
    "-ilname",
    "-type",
    "-xtype",
    "-user",
    "-group",
    "-uid",
    "-gid",
    "-perm",
    "-size",
    "-mtime",
    "-atime",
    "-ctime",
    "-mmin",
    "-amin",
    "-cmin",
    "-used",
    "-newer",
    "-anewer",
    "-cnewer",
    "-samefile",
    "-inum",
    "-links",
    "-maxdepth",
    "-mindepth",
    "-fstype",
    "-context",
    "-fprint",
    "-fprint0",
    "-fls",
    "-printf",
    "-files0-from",
];

const EXEC_PRIMARIES: &[&str] = &["-exec", "-execdir", "-ok", "-okdir"];

pub struct FindRule;

impl CommandRule for FindRule {
    fn evaluate(&self, ctx: &CommandContext) -> Option<DenyReason> {
        let args = ctx.lowered();
        let spans = exec_spans(args);

        let mut i = 0;
        while let Some(arg) = args.get(i) {
            let arg = arg.as_str();
            if arg == "-delete" {
                return Some(
                    DenyReason::new("find -delete permanently removes files.")
                        .with_hint("Run with -print first to review what matches."),
                );
            }
            i = if EXEC_PRIMARIES.contains(&arg) {
                // past the span and its terminator
                spans
                    .iter()
                    .find(|s| s.start == i + 1)
                    .map_or(args.len(), |s| s.end + 1)
            } else if arg == "-fprintf" {
                i + 3
            } else if ONE_VALUE_PRIMARIES.contains(&arg) {
                i + 2
            } else {
                i + 1
            };
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denied(cmd: &str) -> bool {
        let ctx = CommandContext::from_command(cmd);
        FindRule.evaluate(&ctx).is_some()
    }

    #[test]
    fn deny_standalone_delete() {
        assert!(denied(r#"find . -name "*.pyc" -delete"#));
        assert!(denied("find /tmp -type f -mtime +7 -delete"));
        assert!(denied("find . -DELETE"));
    }

    #[test]
    fn delete_as_primary_value() {
        assert!(!denied("find . -name -delete -print"));
        assert!(!denied("find . -path -delete"));
        assert!(!denied("find . -fprintf out -delete -print"));
    }

    #[test]
    fn delete_inside_exec_span() {
        assert!(!denied(r"find . -exec echo -delete \; -print"));
        assert!(!denied("find . -exec echo -delete + -print"));
        assert!(!denied("find . -execdir echo -delete ';'"));
    }

    #[test]
    fn delete_after_exec_span() {
        assert!(denied(r"find . -exec echo {} \; -delete"));
    }

    #[test]
    fn unterminated_exec_is_inert() {
        assert!(!denied("find . -exec echo -delete"));
    }

    #[test]
    fn substring_does_not_count() {
        assert!(!denied("find . -name foo-delete"));
        assert!(!denied("find . -print"));
    }

    #[test]
    fn wrapper_unwrapped() {
        assert!(denied("busybox find . -delete"));
        assert!(denied("sudo find / -name core -delete"));
    }
}
