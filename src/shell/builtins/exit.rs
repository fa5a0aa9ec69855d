use super::prelude::*;

pub struct Exit;

impl BuiltinCommand for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn description(&self) -> &'static str {
        "exit the current shell instance"
    }

    fn help(&self) -> &'static str {
        "\
exit: exit [n]
    Exit the shell with a status of N. If N is omitted, the exit status
    is 0."
    }

    fn run(&self, _builtins: &Builtins, argv: &[String], _stdout: &mut dyn Write) -> Result<Status> {
        let status_code = argv
            .get(1)
            .map(|arg| match arg.parse::<i64>() {
                Ok(n) => (n & 0xff) as i32,
                Err(_) => {
                    eprintln!("koish: exit: {}: numeric argument required", arg);
                    2
                }
            })
            .unwrap_or(0);
        Ok(Status::Terminate(ExitStatus::from_status(status_code)))
    }
}
