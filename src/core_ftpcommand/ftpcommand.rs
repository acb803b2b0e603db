/// The verbs the server understands. Anything else is answered with `501`.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    SYST,
    PWD,
    CWD,
    CDUP,
    LIST,
    NLST,
    PORT,
    SIZE,
    TYPE,
    PASV,
    NOOP,
    RETR,
    STOR,
    APPE,
    DELE,
    RMD,
    MKD,
    RNFR,
    RNTO,
    QUIT,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "SYST" => Some(FtpCommand::SYST),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "PORT" => Some(FtpCommand::PORT),
            "SIZE" => Some(FtpCommand::SIZE),
            "TYPE" => Some(FtpCommand::TYPE),
            "PASV" => Some(FtpCommand::PASV),
            "NOOP" => Some(FtpCommand::NOOP),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "APPE" => Some(FtpCommand::APPE),
            "DELE" => Some(FtpCommand::DELE),
            "RMD" => Some(FtpCommand::RMD),
            "MKD" => Some(FtpCommand::MKD),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "QUIT" => Some(FtpCommand::QUIT),
            _ => None,
        }
    }

    /// USER, PASS and QUIT are the only verbs allowed before login.
    pub fn requires_login(self) -> bool {
        !matches!(self, FtpCommand::USER | FtpCommand::PASS | FtpCommand::QUIT)
    }
}

/// A control line split into verb and argument.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub verb: &'a str,
    pub arg: Option<&'a str>,
}

impl<'a> CommandLine<'a> {
    /// The verb is the first space-delimited token; the argument is the rest
    /// of the line after that separator, without the line terminator.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = line.trim_start();
        if line.is_empty() {
            return None;
        }
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, rest)) => (verb, Some(rest).filter(|rest| !rest.is_empty())),
            None => (line, None),
        };
        Some(CommandLine { verb, arg })
    }

    pub fn command(&self) -> Option<FtpCommand> {
        FtpCommand::from_str(self.verb)
    }
}

/// Splits control text into its command lines. A trailing fragment
/// without CRLF counts as a line.
pub fn split_lines(data: &str) -> impl Iterator<Item = &str> {
    data.split("\r\n").filter(|line| !line.trim().is_empty())
}

/// Reassembles control lines that arrive split across reads.
///
/// Text after the last CRLF is held back until the rest of the line shows
/// up. Once the held text reaches `limit` bytes it is released as a line of
/// its own so a client cannot grow it without bound.
#[derive(Debug)]
pub struct LineBuffer {
    pending: String,
    limit: usize,
}

impl LineBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            pending: String::new(),
            limit,
        }
    }

    /// Appends one read and returns the lines it completed.
    pub fn push(&mut self, data: &str) -> Vec<String> {
        self.pending.push_str(data);

        let mut lines = Vec::new();
        if let Some(end) = self.pending.rfind("\r\n") {
            let rest = self.pending.split_off(end + 2);
            let complete = std::mem::replace(&mut self.pending, rest);
            lines.extend(split_lines(&complete).map(str::to_string));
        }
        if self.pending.len() >= self.limit {
            let overflow = std::mem::take(&mut self.pending);
            lines.extend(split_lines(&overflow).map(str::to_string));
        }
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert_eq!(FtpCommand::from_str("user"), Some(FtpCommand::USER));
        assert_eq!(FtpCommand::from_str("Retr"), Some(FtpCommand::RETR));
        assert_eq!(FtpCommand::from_str("FEAT"), None);
        assert_eq!(FtpCommand::from_str(""), None);
    }

    #[test]
    fn test_parse_command_line() {
        let line = CommandLine::parse("STOR my file.txt\r\n").unwrap();
        assert_eq!(line.verb, "STOR");
        assert_eq!(line.arg, Some("my file.txt"));
        assert_eq!(line.command(), Some(FtpCommand::STOR));

        let bare = CommandLine::parse("pwd\r\n").unwrap();
        assert_eq!(bare.arg, None);
        assert_eq!(bare.command(), Some(FtpCommand::PWD));

        assert_eq!(CommandLine::parse("CWD \r\n").unwrap().arg, None);
        assert!(CommandLine::parse("\r\n").is_none());
        assert_eq!(CommandLine::parse("XYZZY 1").unwrap().command(), None);
    }

    #[test]
    fn test_login_gate_exemptions() {
        assert!(!FtpCommand::USER.requires_login());
        assert!(!FtpCommand::PASS.requires_login());
        assert!(!FtpCommand::QUIT.requires_login());
        assert!(FtpCommand::NOOP.requires_login());
        assert!(FtpCommand::LIST.requires_login());
    }

    #[test]
    fn test_line_buffer_joins_split_commands() {
        let mut buffer = LineBuffer::new(64);
        assert!(buffer.push("NO").is_empty());
        assert!(!buffer.is_empty());
        assert_eq!(buffer.push("OP\r\nCWD mu"), vec!["NOOP"]);
        assert_eq!(buffer.push("sic\r"), Vec::<String>::new());
        assert_eq!(buffer.push("\nPWD\r\n"), vec!["CWD music", "PWD"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_line_buffer_releases_overlong_fragment() {
        let mut buffer = LineBuffer::new(8);
        assert!(buffer.push("STOR a").is_empty());
        assert_eq!(buffer.push("bcdef"), vec!["STOR abcdef"]);
        assert!(buffer.is_empty());

        buffer.push("NO");
        buffer.clear();
        assert_eq!(buffer.push("PWD\r\n"), vec!["PWD"]);
    }

    #[test]
    fn test_split_lines() {
        let lines: Vec<&str> = split_lines("USER bob\r\nPASS pw\r\nNOOP").collect();
        assert_eq!(lines, vec!["USER bob", "PASS pw", "NOOP"]);
        assert_eq!(split_lines("\r\n").count(), 0);
    }
}
