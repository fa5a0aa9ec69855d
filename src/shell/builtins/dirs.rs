use std::env;
use std::path::PathBuf;

use super::prelude::*;

pub struct Cd;

impl BuiltinCommand for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn description(&self) -> &'static str {
        "change the current directory"
    }

    fn help(&self) -> &'static str {
        "\
cd: cd [dir]
    Change the current directory to DIR. A DIR of '~' is the home directory.
    If DIR is '-', then the current directory will be the variable $OLDPWD,
    which is the last working directory."
    }

    fn run(&self, _builtins: &Builtins, argv: &[String], stdout: &mut dyn Write) -> Result<Status> {
        let dir = match argv.get(1).map(String::as_str) {
            None => return Err(Error::builtin_command("expected a path for 'cd'!", 1)),
            Some("~") => {
                ::dirs::home_dir().ok_or_else(|| Error::builtin_command("cd: HOME not set", 1))?
            }
            Some("-") => match env::var_os("OLDPWD") {
                Some(val) => {
                    let dir = PathBuf::from(val);
                    writeln!(stdout, "{}", dir.display())?;
                    dir
                }
                None => return Err(Error::builtin_command("cd: OLDPWD not set", 1)),
            },
            Some(val) => PathBuf::from(val),
        };

        let previous = env::current_dir();
        env::set_current_dir(&dir).map_err(|e| {
            Error::builtin_command(format!("cd: {}: {}", dir.display(), e), 1)
        })?;
        if let Ok(previous) = previous {
            env::set_var("OLDPWD", previous);
        }

        Ok(Status::success())
    }
}
