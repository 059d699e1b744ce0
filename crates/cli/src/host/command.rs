use std::io;
use std::path::PathBuf;
use std::process::{Command, Output};

#[derive(Debug, Clone, PartialEq)]
pub enum Interpreter {
    Python,
    Bash,
    Cmd,
    PowerShell,
}

impl Interpreter {
    /// Interpreter conventionally used for files with `extension`
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension {
            "py" => Some(Interpreter::Python),
            "sh" => Some(Interpreter::Bash),
            "bat" | "cmd" => Some(Interpreter::Cmd),
            "ps1" => Some(Interpreter::PowerShell),
            _ => None,
        }
    }

    fn program(&self) -> &'static str {
        match self {
            Interpreter::Python => "python",
            Interpreter::Bash => "bash",
            Interpreter::Cmd => "cmd",
            Interpreter::PowerShell => "powershell",
        }
    }

    /// Flags placed between the program and the script path
    fn script_flags(&self) -> &'static [&'static str] {
        match self {
            Interpreter::Python | Interpreter::Bash => &[],
            Interpreter::Cmd => &["/c"],
            Interpreter::PowerShell => &["-File"],
        }
    }

    /// Flags placed before inline code
    fn inline_flags(&self) -> &'static [&'static str] {
        match self {
            Interpreter::Python | Interpreter::Bash => &["-c"],
            Interpreter::Cmd => &["/c"],
            Interpreter::PowerShell => &["-Command"],
        }
    }
}

/// An interpreter invocation assembled from a run input
#[derive(Debug, Clone)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            env: Vec::new(),
        }
    }

    /// `<interpreter> [opts] <flags> <script> [script args]`
    pub fn script(
        interpreter: &Interpreter,
        program: Option<&str>,
        interpreter_opts: &[String],
        script: &str,
        script_args: &[String],
    ) -> Self {
        let mut args: Vec<String> = interpreter_opts.to_vec();
        args.extend(interpreter.script_flags().iter().map(|f| f.to_string()));
        args.push(script.to_string());
        args.extend(script_args.iter().cloned());
        Self::new(program.unwrap_or(interpreter.program()), args)
    }

    /// `<interpreter> [opts] <flags> <code>`
    pub fn inline(
        interpreter: &Interpreter,
        program: Option<&str>,
        interpreter_opts: &[String],
        code: &str,
    ) -> Self {
        let mut args: Vec<String> = interpreter_opts.to_vec();
        args.extend(interpreter.inline_flags().iter().map(|f| f.to_string()));
        args.push(code.to_string());
        Self::new(program.unwrap_or(interpreter.program()), args)
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env.push((key, value));
        self
    }

    pub fn to_shell_command(&self) -> String {
        let mut cmd = quote(&self.program);
        for arg in &self.args {
            cmd.push(' ');
            cmd.push_str(&quote(arg));
        }
        cmd
    }

    pub fn execute(&self) -> io::Result<Output> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);

        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        command.output()
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// Split a user-supplied argument string on whitespace, keeping quoted runs
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote_char: Option<char> = None;
    let mut in_arg = false;

    for c in input.chars() {
        match quote_char {
            Some(q) if c == q => quote_char = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote_char = Some(c);
                in_arg = true;
            }
            None if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_commands_per_interpreter() {
        let cmd = ShellCommand::script(&Interpreter::Python, None, &[], "main.py", &["-v".into()]);
        assert_eq!(cmd.to_shell_command(), "python main.py -v");

        let cmd = ShellCommand::script(&Interpreter::Cmd, None, &[], "build.bat", &[]);
        assert_eq!(cmd.to_shell_command(), "cmd /c build.bat");

        let cmd = ShellCommand::script(&Interpreter::PowerShell, None, &[], "setup.ps1", &[]);
        assert_eq!(cmd.to_shell_command(), "powershell -File setup.ps1");

        let cmd = ShellCommand::script(
            &Interpreter::Bash,
            Some("/bin/bash"),
            &["-x".into()],
            "run.sh",
            &[],
        );
        assert_eq!(cmd.to_shell_command(), "/bin/bash -x run.sh");
    }

    #[test]
    fn test_inline_code_is_quoted() {
        let cmd = ShellCommand::inline(&Interpreter::Python, None, &["-i".into()], "print('hi')");
        assert_eq!(cmd.to_shell_command(), r"python -i -c 'print('\''hi'\'')'");
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("  -v --name 'two words' \"x y\" "), [
            "-v",
            "--name",
            "two words",
            "x y"
        ]);
        assert!(split_args("").is_empty());
        assert_eq!(split_args("''"), [""]);
    }

    #[test]
    fn test_interpreter_for_extension() {
        assert_eq!(Interpreter::for_extension("py"), Some(Interpreter::Python));
        assert_eq!(Interpreter::for_extension("ps1"), Some(Interpreter::PowerShell));
        assert_eq!(Interpreter::for_extension("rs"), None);
    }
}
