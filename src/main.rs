use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{self, Write};

use yahaha::Value;
use yahaha::cli::{Args, Commands, generate_completions};
use yahaha::config::AppConfig;
use yahaha::diagnostic::render_diagnostics;
use yahaha::interpreter::{
    Env, Interpreter, builtins, parse_and_run_with_diagnostics, parse_program,
};
use yahaha::value::value_to_display;

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    verbose_log(&config, "Starting yahaha");

    if let Some(path) = &args.file {
        verbose_log(&config, &format!("Reading program from {}", path.display()));
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                error_message(&config, &format!("Failed to read {}: {}", path.display(), e));
                std::process::exit(1);
            }
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("program");
        run_source(&source, name, &config);
    } else if let Some(source) = &args.eval {
        verbose_log(&config, "Evaluating program from the command line");
        run_source(source, "eval", &config);
    } else {
        run_interactive_mode(&config);
    }
}

fn run_source(source: &str, file_name: &str, config: &AppConfig) {
    match parse_and_run_with_diagnostics(source) {
        Ok(_) => verbose_log(config, "Program finished"),
        Err(diagnostics) => {
            eprint!(
                "{}",
                render_diagnostics(source, file_name, &diagnostics, config.color_enabled)
            );
            std::process::exit(1);
        }
    }
}

fn run_interactive_mode(config: &AppConfig) {
    println!("yahaha interactive interpreter");
    println!("Statements end with `;`. Exit with Ctrl+D or `exit` on its own line.");
    println!();

    let env = Env::new();
    builtins::install(&env);
    let interpreter = Interpreter::with_env(env);

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "yahaha> " } else { "   ...> " };
        print!("{}", prompt);
        io::stdout().flush().ok();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error_message(config, &format!("Error reading input: {}", e));
                break;
            }
        }

        let trimmed = line.trim();
        if buffer.is_empty() && (trimmed == "exit" || trimmed == "quit") {
            break;
        }

        buffer.push_str(&line);
        let program = match parse_program(&buffer) {
            Ok(program) => program,
            // Incomplete input: keep the buffer and read another line.
            Err(e) if e.is_incomplete() => continue,
            Err(e) => {
                eprint!(
                    "{}",
                    render_diagnostics(&buffer, "repl", &[e.to_diagnostic()], config.color_enabled)
                );
                buffer.clear();
                continue;
            }
        };

        match interpreter.run(&program) {
            Ok(Value::Empty) => {}
            Ok(value) => println!("{}", value_to_display(&value)),
            Err(e) => eprint!(
                "{}",
                render_diagnostics(&buffer, "repl", &[e.to_diagnostic()], config.color_enabled)
            ),
        }
        buffer.clear();
    }
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[yahaha:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
