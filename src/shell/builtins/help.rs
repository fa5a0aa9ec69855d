use super::prelude::*;

pub struct Help;

impl BuiltinCommand for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "display useful information"
    }

    fn help(&self) -> &'static str {
        "\
help: help [command ...]
    Display helpful information about builtin commands. If COMMAND is specified,
    gives detailed help on all commands matching COMMAND, otherwise a list of the
    builtins is printed."
    }

    fn run(&self, builtins: &Builtins, argv: &[String], stdout: &mut dyn Write) -> Result<Status> {
        let topics = argv.get(1..).unwrap_or(&[]);
        if topics.is_empty() {
            print_overview(builtins, stdout)?;
            return Ok(Status::success());
        }

        let mut all_invalid = true;
        for topic in topics {
            if let Some(command) = builtins.find(topic) {
                writeln!(stdout, "{}", command.help())?;
                all_invalid = false;
            }
        }

        if all_invalid {
            let last = topics.last().map(String::as_str).unwrap_or_default();
            return Err(Error::builtin_command(
                format!("help: no help topics match {}", last),
                1,
            ));
        }

        Ok(Status::success())
    }
}

fn print_overview(builtins: &Builtins, stdout: &mut dyn Write) -> Result<()> {
    writeln!(stdout, "koiSh v{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(stdout, "----------")?;
    writeln!(stdout, "Execute a program by entering its name.")?;
    writeln!(stdout, "Otherwise, the following commands are built-in:")?;
    writeln!(stdout)?;
    for command in builtins.iter() {
        writeln!(stdout, "  {}\t\t{}", command.name(), command.description())?;
    }
    writeln!(stdout)?;
    writeln!(
        stdout,
        "You can also use `man <program_name>` for specific information on a program."
    )?;
    Ok(())
}
