use std::process::ExitCode;

use rayskull::main as rayskull_main;

fn main() -> ExitCode {
    rayskull_main(std::env::args_os())
}
