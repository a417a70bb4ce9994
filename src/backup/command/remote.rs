use crate::backup::command::{CommandArg, ComposedCommand};
use bon::Builder;
use getset::Getters;
use std::fmt::{Display, Formatter};

pub static DEFAULT_SSH_PORT: u16 = 22;

/// The `user@host:port` a remote run reaches over ssh.
#[derive(Clone, Debug, PartialEq, Eq, Builder, Getters)]
#[getset(get = "pub")]
pub struct RemoteEndpoint {
    #[builder(into)]
    host: String,
    #[builder(into)]
    user: String,
    #[builder(default = DEFAULT_SSH_PORT)]
    port: u16,
}

impl Display for RemoteEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

impl RemoteEndpoint {
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// The `-e` transport handed to rsync.
    pub fn rsync_transport(&self) -> String {
        format!("ssh -p {}", self.port)
    }

    /// Runs `inner` on this endpoint: `ssh -p <port> <user>@<host> <inner...>`.
    ///
    /// ssh hands the remote words to the remote shell, so each one is quoted
    /// there. The redirection of `inner` stays on the wrapping command.
    pub fn wrap(&self, inner: ComposedCommand) -> ComposedCommand {
        let ComposedCommand {
            program,
            args,
            redirect,
        } = inner;

        ComposedCommand::new("ssh")
            .args(["-p".to_string(), self.port.to_string(), self.destination()])
            .arg(shell_quote(&program))
            .args(args.into_iter().map(quote_arg))
            .redirect(redirect)
    }
}

fn quote_arg(arg: CommandArg) -> CommandArg {
    match arg {
        CommandArg::Plain(s) => CommandArg::Plain(shell_quote(&s)),
        CommandArg::Secret { shown, value } => CommandArg::Secret {
            shown,
            value: shell_quote(value.inner()).into(),
        },
    }
}

/// POSIX single-quoting, skipped for words made only of shell-inert characters.
pub fn shell_quote(word: &str) -> String {
    let inert = |c: char| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c);
    if !word.is_empty() && word.chars().all(inert) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r#"'\''"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::command::Redirect;
    use crate::backup::redacted::RedactedString;
    use std::path::PathBuf;

    fn endpoint() -> RemoteEndpoint {
        RemoteEndpoint::builder().host("h").user("u").port(2222).build()
    }

    #[test]
    fn test_default_port() {
        let endpoint = RemoteEndpoint::builder().host("h").user("u").build();
        assert_eq!(endpoint.port(), &22);
        assert_eq!(endpoint.to_string(), "u@h:22");
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("--all-databases"), "--all-databases");
        assert_eq!(shell_quote("/var/lib/db.sql"), "/var/lib/db.sql");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(shell_quote("it's"), r#"'it'\''s'"#);
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_wrap_keeps_inner_command_and_local_redirect() {
        let inner = ComposedCommand::new("mysqldump")
            .args(["--all-databases", "--opt"])
            .redirect(Redirect::StdoutTo(PathBuf::from("/b/acct1.sql")));

        let wrapped = endpoint().wrap(inner);

        assert_eq!(wrapped.program, "ssh");
        assert_eq!(
            wrapped.to_string(),
            "ssh -p 2222 u@h mysqldump --all-databases --opt > /b/acct1.sql"
        );
        assert_eq!(wrapped.redirect, Redirect::StdoutTo(PathBuf::from("/b/acct1.sql")));
    }

    #[test]
    fn test_wrap_quotes_secret_for_remote_shell() {
        let password = RedactedString::builder().inner("p a$s").build();
        let inner = ComposedCommand::new("mysqldump").arg(CommandArg::secret("-p", &password));

        let wrapped = endpoint().wrap(inner);

        let exposed: Vec<_> = wrapped.exposed_args().collect();
        assert_eq!(exposed.last(), Some(&"'-pp a$s'"));
        assert!(!wrapped.to_string().contains("p a$s"));
    }
}
