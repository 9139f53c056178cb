use std::io::Read;
use std::{env, process::ExitCode};

use cel_core::config::Config;
use cel_core::error::render_diagnostics;
use cel_core::program::Program;
use cel_core::tracer::{NoopTracer, StderrTracer};
use cel_core::Activation;

fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let trace = take_flag(&mut args, "--trace");

    let source = match args.first() {
        Some(expr) => expr.clone(),
        None => match read_stdin() {
            Ok(s) => s,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        },
    };

    let (program, diagnostics) = match Program::compile(&source, "", &[], Config::default(), |_| {}) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("parse error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if !diagnostics.is_empty() {
        eprintln!("{}", render_diagnostics("<expr>", &source, &diagnostics));
    }

    let mut activation = Activation::new();
    let result = if trace {
        program.eval_with(&mut activation, cel_core::resource::NoLimitTracker, StderrTracer)
    } else {
        program.eval_with(&mut activation, cel_core::resource::NoLimitTracker, NoopTracer)
    };

    match result {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("evaluation error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == flag) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn read_stdin() -> std::io::Result<String> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}
